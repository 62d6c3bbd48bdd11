//! MPI backend over rsmpi (feature `mpi`).
//!
//! Maps the [`Communicator`](crate::Communicator) contract 1:1 onto the
//! world communicator: `all_reduce_sum_in_place` → `MPI_Allreduce(SUM)`,
//! `all_gather_count` → `MPI_Allgather`, `exchange` → `MPI_Sendrecv` with a
//! single peer. Requires a system MPI installation at build time.

use mpi::collective::SystemOperation;
use mpi::point_to_point as p2p;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use crate::{CommError, Communicator, ReduceOp};

/// The world communicator of an initialised MPI environment.
pub struct MpiComm {
    world: SimpleCommunicator,
}

impl MpiComm {
    /// Initialise MPI and return the universe guard together with the world
    /// communicator. The guard must outlive every `MpiComm` use; dropping it
    /// finalises MPI.
    pub fn initialize() -> Option<(mpi::environment::Universe, Self)> {
        let universe = mpi::initialize()?;
        let world = universe.world();
        Some((universe, Self { world }))
    }
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn all_reduce_sum_in_place(&self, buf: &mut [f64]) -> Result<(), CommError> {
        let send = buf.to_vec();
        self.world
            .all_reduce_into(&send[..], buf, SystemOperation::sum());
        Ok(())
    }

    fn all_reduce_scalar(&self, value: f64, op: ReduceOp) -> Result<f64, CommError> {
        let mut out = 0.0f64;
        match op {
            ReduceOp::Sum => self
                .world
                .all_reduce_into(&value, &mut out, SystemOperation::sum()),
            ReduceOp::Max => self
                .world
                .all_reduce_into(&value, &mut out, SystemOperation::max()),
        }
        Ok(out)
    }

    fn all_gather_count(&self, count: u64, out: &mut [u64]) -> Result<(), CommError> {
        if out.len() != self.size() {
            return Err(CommError::LengthMismatch {
                expected: self.size(),
                got: out.len(),
            });
        }
        self.world.all_gather_into(&count, out);
        Ok(())
    }

    fn exchange(&self, peer: usize, send: &[f64]) -> Result<Vec<f64>, CommError> {
        let mut recv = vec![0.0f64; send.len()];
        let process = self.world.process_at_rank(peer as i32);
        p2p::send_receive_into(send, &process, &mut recv[..], &process);
        Ok(recv)
    }
}
