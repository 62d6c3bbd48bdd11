//! Particle impact collection.
//!
//! Each step, particles whose cell lands inside an object are absorbed:
//! removed from the population with their charge attributed to the object.
//! The collected charge is then spread uniformly over the object's surface
//! nodes of `rho_obj`, a grid that persists across steps so a floating
//! conductor retains its accumulated charge.
//!
//! A particle sitting in a ghost cell of an interior node is not attributed
//! here; migration runs first and delivers particles to their owning rank.

use sheath_comm::{Communicator, ReduceOp};
use sheath_grid::Grid3;

use crate::error::CoreError;
use crate::object::classify::Lookup;
use crate::object::gather::GlobalSurfaceMap;
use crate::population::Population;

/// How particles interact with object boundaries.
///
/// Absorption is the only shipped behaviour; elastic and specular
/// reflection need a surface-normal reconstruction that is not pinned
/// down yet, so the variant space is left open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum InteractionPolicy {
    /// Remove the particle and credit its full charge to the object.
    #[default]
    Absorb,
}

/// Outcome of one collection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactReport {
    /// Net charge collected per object this step (globally reduced).
    pub collected: Vec<f64>,
    /// Number of particles absorbed across all ranks.
    pub absorbed: u64,
}

/// Absorb particles that entered object interiors and deposit their charge
/// uniformly on the surface nodes of `rho_obj`.
pub(crate) fn collect_impacts(
    pop: &mut Population,
    rho_obj: &mut Grid3,
    interior: &Lookup,
    surface: &Lookup,
    maps: &[GlobalSurfaceMap],
    policy: InteractionPolicy,
    comm: &dyn Communicator,
) -> Result<ImpactReport, CoreError> {
    let InteractionPolicy::Absorb = policy;
    let n_objects = interior.n_objects();
    let mut collected = vec![0.0f64; n_objects];
    let mut absorbed = 0u64;

    let (sy, sz) = (rho_obj.stride(1), rho_obj.stride(2));
    let size = rho_obj.size();

    for s in 0..pop.n_species() {
        let charge = pop.charge(s);
        let mut i = pop.range(s).start;
        let mut stop = pop.range(s).end;
        while i < stop {
            let p = pop.position(i);
            let (x, y, z) = (p[0] as usize, p[1] as usize, p[2] as usize);
            // Ghost cells are not attributed: the owning rank sees the same
            // particle in its true region after migration, and counting it
            // here as well would double the charge under the reduction.
            if x < size[0] && y < size[1] && z < size[2] && !rho_obj.is_ghost(x + y * sy + z * sz)
            {
                let cell = x + y * sy + z * sz;
                for a in 0..n_objects {
                    if interior.contains(a, cell) {
                        collected[a] += charge;
                        pop.cut(s, i);
                        stop -= 1;
                        absorbed += 1;
                        break;
                    }
                }
            }
            // The particle swapped into a cut slot is examined next step,
            // after migration has run again.
            i += 1;
        }
    }

    let absorbed = comm.all_reduce_scalar(absorbed as f64, ReduceOp::Sum)? as u64;
    comm.all_reduce_sum_in_place(&mut collected)?;
    log::debug!("absorbed {absorbed} particles on object impact");

    for (a, map) in maps.iter().enumerate() {
        let share = collected[a] / map.total() as f64;
        for &node in surface.object(a) {
            rho_obj[node] += share;
        }
    }

    Ok(ImpactReport {
        collected,
        absorbed,
    })
}
