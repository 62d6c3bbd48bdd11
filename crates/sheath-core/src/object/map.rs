//! The object map: a grid-shaped tag field identifying conductors.
//!
//! Tags are stored as reals and recovered by rounding: 0 is plasma, a
//! positive integer `a` marks a node of object `a`. The map is loaded once
//! at initialisation, halo-exchanged in set mode so ghost nodes mirror the
//! neighbouring rank's truth, and immutable thereafter.

use std::path::Path;

use sheath_comm::{Communicator, ReduceOp};
use sheath_grid::{halo, loader, Domain, Grid3};

use crate::error::CoreError;

/// Integer tag of a stored real value.
#[inline]
pub fn tag_of(value: f64) -> usize {
    (value + 0.5) as usize
}

/// Whether `value` rounds to the tag `a`.
#[inline]
pub fn has_tag(value: f64, a: usize) -> bool {
    let a = a as f64;
    value > a - 0.5 && value < a + 0.5
}

/// Load this rank's subdomain of the tag field and fill its ghost band
/// from the neighbouring ranks.
pub fn load_object_map(
    path: &Path,
    global_size: [usize; 3],
    domain: &Domain,
    comm: &dyn Communicator,
) -> Result<Grid3, CoreError> {
    let field = loader::read_scalar_field(path)?;
    let mut map = loader::extract_subdomain(&field, global_size, domain, 1)?;
    halo::exchange_set(&mut map, domain, comm)?;
    Ok(map)
}

/// Highest object tag across all ranks.
///
/// This is the number of objects when tags are contiguous from 1, which the
/// input contract assumes. Zero objects with the subsystem enabled is a
/// configuration error.
pub fn count_objects(map: &Grid3, comm: &dyn Communicator) -> Result<usize, CoreError> {
    let mut highest = 0usize;
    for &v in map.values() {
        let tag = tag_of(v);
        if tag > highest {
            highest = tag;
        }
    }
    let global = comm.all_reduce_scalar(highest as f64, ReduceOp::Max)?;
    let n = global as usize;
    if n == 0 {
        return Err(CoreError::Config(
            "object subsystem enabled but the object map contains no tags".into(),
        ));
    }
    Ok(n)
}
