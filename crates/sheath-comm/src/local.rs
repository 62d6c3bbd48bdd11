//! In-process multi-rank world over OS threads.
//!
//! [`LocalCluster::run`] spawns one thread per rank, hands each a
//! [`LocalComm`], and joins them, returning each rank's result. Collectives
//! are implemented with a shared two-phase barrier; point-to-point exchange
//! uses one unbounded channel per ordered rank pair, so paired sends cannot
//! deadlock regardless of call order within the pair.
//!
//! This backend exists so the genuinely parallel code paths (surface
//! gathers, distributed capacitance assembly, halo exchange) can run under
//! `cargo test` without an MPI launcher. It is not a performance vehicle.

use std::sync::{Arc, Condvar, Mutex};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::{CommError, Communicator, ReduceOp};

enum Phase {
    Arriving,
    Leaving,
}

struct Slot {
    phase: Phase,
    arrived: usize,
    departed: usize,
    acc: Vec<f64>,
}

struct Shared {
    size: usize,
    slot: Mutex<Slot>,
    cv: Condvar,
}

/// One rank's endpoint in a [`LocalCluster`].
pub struct LocalComm {
    rank: usize,
    size: usize,
    shared: Arc<Shared>,
    /// `tx[j]` sends to rank j's inbox for messages from this rank.
    tx: Vec<Sender<Vec<f64>>>,
    /// `rx[i]` receives messages sent by rank i to this rank.
    rx: Vec<Receiver<Vec<f64>>>,
}

/// Factory for in-process rank worlds.
pub struct LocalCluster;

impl LocalCluster {
    /// Build the per-rank endpoints of a `size`-rank world.
    pub fn endpoints(size: usize) -> Vec<LocalComm> {
        assert!(size >= 1, "a world needs at least one rank");
        let shared = Arc::new(Shared {
            size,
            slot: Mutex::new(Slot {
                phase: Phase::Arriving,
                arrived: 0,
                departed: 0,
                acc: Vec::new(),
            }),
            cv: Condvar::new(),
        });

        // One channel per ordered (from, to) pair.
        let mut senders: Vec<Vec<Sender<Vec<f64>>>> = Vec::with_capacity(size);
        let mut receivers: Vec<Vec<Option<Receiver<Vec<f64>>>>> = (0..size)
            .map(|_| (0..size).map(|_| None).collect())
            .collect();
        for from in 0..size {
            let mut row = Vec::with_capacity(size);
            for to in 0..size {
                let (tx, rx) = unbounded();
                row.push(tx);
                receivers[to][from] = Some(rx);
            }
            senders.push(row);
        }

        let mut endpoints = Vec::with_capacity(size);
        for (rank, rx_row) in receivers.into_iter().enumerate() {
            endpoints.push(LocalComm {
                rank,
                size,
                shared: Arc::clone(&shared),
                tx: senders[rank].clone(),
                rx: rx_row.into_iter().map(Option::unwrap).collect(),
            });
        }
        endpoints
    }

    /// Run `f` once per rank on its own thread and collect the results in
    /// rank order. Panics in any rank propagate to the caller.
    pub fn run<R, F>(size: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(LocalComm) -> R + Send + Sync,
    {
        let endpoints = Self::endpoints(size);
        let f = &f;
        std::thread::scope(|scope| {
            let handles: Vec<_> = endpoints
                .into_iter()
                .map(|comm| scope.spawn(move || f(comm)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("rank thread panicked"))
                .collect()
        })
    }
}

impl LocalComm {
    /// Two-phase barrier collective: each rank contributes via `deposit`
    /// (first arrival sees an empty accumulator), all ranks then read the
    /// accumulated buffer.
    fn collective<D>(&self, deposit: D) -> Vec<f64>
    where
        D: FnOnce(&mut Vec<f64>),
    {
        let mut slot = self.shared.slot.lock().unwrap();
        // Wait out the draining phase of a previous collective.
        while matches!(slot.phase, Phase::Leaving) {
            slot = self.shared.cv.wait(slot).unwrap();
        }

        deposit(&mut slot.acc);
        slot.arrived += 1;
        if slot.arrived == self.shared.size {
            slot.phase = Phase::Leaving;
            slot.departed = 0;
            self.shared.cv.notify_all();
        } else {
            while matches!(slot.phase, Phase::Arriving) {
                slot = self.shared.cv.wait(slot).unwrap();
            }
        }

        let result = slot.acc.clone();
        slot.departed += 1;
        if slot.departed == self.shared.size {
            slot.arrived = 0;
            slot.acc = Vec::new();
            slot.phase = Phase::Arriving;
            self.shared.cv.notify_all();
        }
        result
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_reduce_sum_in_place(&self, buf: &mut [f64]) -> Result<(), CommError> {
        let contribution = buf.to_vec();
        let reduced = self.collective(move |acc| {
            if acc.is_empty() {
                *acc = contribution;
            } else {
                assert_eq!(acc.len(), contribution.len(), "collective length mismatch");
                for (a, c) in acc.iter_mut().zip(&contribution) {
                    *a += c;
                }
            }
        });
        if reduced.len() != buf.len() {
            return Err(CommError::LengthMismatch {
                expected: buf.len(),
                got: reduced.len(),
            });
        }
        buf.copy_from_slice(&reduced);
        Ok(())
    }

    fn all_reduce_scalar(&self, value: f64, op: ReduceOp) -> Result<f64, CommError> {
        let reduced = self.collective(move |acc| {
            if acc.is_empty() {
                acc.push(value);
            } else {
                match op {
                    ReduceOp::Sum => acc[0] += value,
                    ReduceOp::Max => acc[0] = acc[0].max(value),
                }
            }
        });
        Ok(reduced[0])
    }

    fn all_gather_count(&self, count: u64, out: &mut [u64]) -> Result<(), CommError> {
        if out.len() != self.size {
            return Err(CommError::LengthMismatch {
                expected: self.size,
                got: out.len(),
            });
        }
        let rank = self.rank;
        let size = self.size;
        let gathered = self.collective(move |acc| {
            if acc.is_empty() {
                acc.resize(size, 0.0);
            }
            acc[rank] = count as f64;
        });
        for (o, g) in out.iter_mut().zip(&gathered) {
            *o = *g as u64;
        }
        Ok(())
    }

    fn exchange(&self, peer: usize, send: &[f64]) -> Result<Vec<f64>, CommError> {
        if peer >= self.size {
            return Err(CommError::Exchange {
                peer,
                reason: "no such rank".into(),
            });
        }
        if peer == self.rank {
            return Ok(send.to_vec());
        }
        self.tx[peer]
            .send(send.to_vec())
            .map_err(|e| CommError::Exchange {
                peer,
                reason: e.to_string(),
            })?;
        let recv = self.rx[peer].recv().map_err(|e| CommError::Exchange {
            peer,
            reason: e.to_string(),
        })?;
        if recv.len() != send.len() {
            return Err(CommError::LengthMismatch {
                expected: send.len(),
                got: recv.len(),
            });
        }
        Ok(recv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_reduce_sums_across_ranks() {
        let results = LocalCluster::run(4, |comm| {
            let mut buf = vec![comm.rank() as f64, 1.0];
            comm.all_reduce_sum_in_place(&mut buf).unwrap();
            buf
        });
        for buf in results {
            assert_eq!(buf, vec![6.0, 4.0]);
        }
    }

    #[test]
    fn scalar_max_finds_global_max() {
        let results = LocalCluster::run(3, |comm| {
            comm.all_reduce_scalar(comm.rank() as f64 * 2.0, ReduceOp::Max)
                .unwrap()
        });
        assert!(results.iter().all(|&v| v == 4.0));
    }

    #[test]
    fn all_gather_orders_by_rank() {
        let results = LocalCluster::run(3, |comm| {
            let mut out = vec![0u64; 3];
            comm.all_gather_count(10 + comm.rank() as u64, &mut out)
                .unwrap();
            out
        });
        for out in results {
            assert_eq!(out, vec![10, 11, 12]);
        }
    }

    #[test]
    fn consecutive_collectives_do_not_interleave() {
        let results = LocalCluster::run(2, |comm| {
            let a = comm.all_reduce_scalar(1.0, ReduceOp::Sum).unwrap();
            let b = comm.all_reduce_scalar(10.0, ReduceOp::Sum).unwrap();
            (a, b)
        });
        for (a, b) in results {
            assert_eq!(a, 2.0);
            assert_eq!(b, 20.0);
        }
    }

    #[test]
    fn paired_exchange_swaps_buffers() {
        let results = LocalCluster::run(2, |comm| {
            let peer = 1 - comm.rank();
            comm.exchange(peer, &[comm.rank() as f64; 3]).unwrap()
        });
        assert_eq!(results[0], vec![1.0; 3]);
        assert_eq!(results[1], vec![0.0; 3]);
    }
}
