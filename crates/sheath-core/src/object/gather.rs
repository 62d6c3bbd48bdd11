//! Global surface-node bookkeeping across ranks.
//!
//! Every rank learns, per object, how many surface nodes each rank owns.
//! The prefix sums define the canonical global surface ordering used by the
//! capacitance matrices: rank-major, then local scan order within a rank.

use sheath_comm::Communicator;

use crate::error::CoreError;
use crate::object::classify::Lookup;

/// Per-object cumulative surface counts over ranks.
///
/// Rank `r`'s surface nodes occupy global indices `cum[r]..cum[r+1]` within
/// the object's surface list; `cum[P]` is the object's total surface count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSurfaceMap {
    cum: Vec<u64>,
}

impl GlobalSurfaceMap {
    /// Total surface nodes of the object across all ranks.
    pub fn total(&self) -> usize {
        *self.cum.last().unwrap() as usize
    }

    /// Global index range owned by `rank`.
    pub fn range_of(&self, rank: usize) -> std::ops::Range<usize> {
        self.cum[rank] as usize..self.cum[rank + 1] as usize
    }

    /// Rank owning global surface index `i`.
    pub fn owner_of(&self, i: usize) -> usize {
        debug_assert!(i < self.total());
        self.cum.partition_point(|&c| c as usize <= i) - 1
    }
}

/// All-gather each rank's local surface count per object and prefix-sum
/// into the global index maps.
pub fn gather_surface_maps(
    surface: &Lookup,
    comm: &dyn Communicator,
) -> Result<Vec<GlobalSurfaceMap>, CoreError> {
    let size = comm.size();
    let mut maps = Vec::with_capacity(surface.n_objects());
    let mut counts = vec![0u64; size];
    for a in 0..surface.n_objects() {
        comm.all_gather_count(surface.count(a) as u64, &mut counts)?;
        let mut cum = Vec::with_capacity(size + 1);
        cum.push(0);
        for &c in &counts {
            cum.push(cum.last().unwrap() + c);
        }
        maps.push(GlobalSurfaceMap { cum });
    }
    Ok(maps)
}
