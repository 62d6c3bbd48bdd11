//! # Sheath Comm
//!
//! Rank-level communication for the sheath simulation core.
//!
//! All distributed operations in the core — surface-node gathers,
//! capacitance-matrix reductions, halo exchanges — go through the
//! [`Communicator`] trait, so the physics code never talks to a message
//! layer directly. Three implementations are provided:
//!
//! - [`SerialComm`] — a single-rank world; every collective is a no-op.
//! - [`local::LocalCluster`] — an in-process multi-rank world over threads,
//!   used by the test suite to exercise the genuinely parallel code paths
//!   without an MPI launcher.
//! - `MpiComm` (behind the `mpi` feature) — the production backend over
//!   rsmpi for HPC clusters.
//!
//! Every collective is a blocking global synchronisation: all ranks must
//! enter the same call in the same order. A failed collective is fatal to
//! the simulation; callers propagate [`CommError`] upward and abort.

pub mod local;
#[cfg(feature = "mpi")]
pub mod mpi_backend;
mod serial;

pub use serial::SerialComm;

use thiserror::Error;

/// Errors from the communication layer.
///
/// None of these are recoverable: participants that disagree on buffer
/// lengths or drop out of a collective leave the global state undefined.
#[derive(Debug, Error)]
pub enum CommError {
    #[error("collective operation failed: {0}")]
    Collective(String),

    #[error("exchange with rank {peer} failed: {reason}")]
    Exchange { peer: usize, reason: String },

    #[error("buffer length mismatch in collective: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },
}

/// Reduction operator for scalar all-reduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    Sum,
    Max,
}

/// A fixed-size world of ranks supporting the collectives the core needs.
///
/// The contract mirrors the blocking MPI calls the algorithms are built
/// around: `all_reduce_sum_in_place` is `MPI_Allreduce(MPI_IN_PLACE, .., SUM)`,
/// `all_gather_count` is `MPI_Allgather` of one count per rank, and
/// `exchange` is a paired send/receive with a single peer (both sides must
/// call it with each other as peer).
pub trait Communicator: Send + Sync {
    /// This process's rank in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of ranks in the world.
    fn size(&self) -> usize;

    /// Element-wise sum of `buf` across all ranks; every rank receives the
    /// summed vector in place.
    fn all_reduce_sum_in_place(&self, buf: &mut [f64]) -> Result<(), CommError>;

    /// Reduce a single value across all ranks.
    fn all_reduce_scalar(&self, value: f64, op: ReduceOp) -> Result<f64, CommError>;

    /// Gather one count from every rank; `out` must have length `size()`
    /// and receives rank r's count at `out[r]` on every rank.
    fn all_gather_count(&self, count: u64, out: &mut [u64]) -> Result<(), CommError>;

    /// Paired exchange with `peer`: send `send`, receive the peer's buffer
    /// of the same length. Both ranks must call this with matching peers.
    fn exchange(&self, peer: usize, send: &[f64]) -> Result<Vec<f64>, CommError>;
}
