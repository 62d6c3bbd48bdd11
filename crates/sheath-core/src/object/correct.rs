//! Per-step charge correction: the Hockney–Miyake equipotential enforcement
//! (Miyake & Usui, *Phys. Plasmas* **16**, 062904 (2009), eqs. 5 and 7).
//!
//! After the base Poisson solve the potential on a conductor's surface is
//! generally not constant. For each object the corrector computes the
//! floating potential `φc` consistent with the conductor's accumulated
//! charge, then the surface charge correction that lifts every surface node
//! to `φc`. The caller re-solves afterwards; the corrected density sums to
//! zero over the surface, so no net charge is created.

use sheath_comm::Communicator;
use sheath_grid::Grid3;

use crate::error::CoreError;
use crate::object::classify::Lookup;
use crate::object::capacitance::ObjectCapacitance;
use crate::object::gather::GlobalSurfaceMap;

/// Scratch vectors reused every step, sized for the largest object.
#[derive(Debug, Default)]
pub(crate) struct CorrectionScratch {
    delta_phi: Vec<f64>,
    rho_corr: Vec<f64>,
}

impl CorrectionScratch {
    pub(crate) fn sized_for(maps: &[GlobalSurfaceMap]) -> Self {
        let largest = maps.iter().map(GlobalSurfaceMap::total).max().unwrap_or(0);
        Self {
            delta_phi: vec![0.0; largest],
            rho_corr: vec![0.0; largest],
        }
    }
}

/// Apply the capacitance correction for every object, adding the surface
/// charge corrections onto `rho`. Returns each object's floating potential.
pub(crate) fn apply_corrections(
    rho: &mut Grid3,
    phi: &Grid3,
    surface: &Lookup,
    maps: &[GlobalSurfaceMap],
    capacitance: &[ObjectCapacitance],
    scratch: &mut CorrectionScratch,
    comm: &dyn Communicator,
) -> Result<Vec<f64>, CoreError> {
    let rank = comm.rank();
    let mut potentials = Vec::with_capacity(maps.len());

    for (a, map) in maps.iter().enumerate() {
        let total = map.total();
        let rows = map.range_of(rank);
        let local = surface.object(a);
        let cap = &capacitance[a];

        // Eq. 7: the floating potential. Each rank contributes the rows it
        // owns; the column sum runs over the full matrix.
        let mut phi_c = 0.0;
        for (j_local, &node) in local.iter().enumerate() {
            let j = rows.start + j_local;
            let row_sum: f64 = (0..total).map(|i| cap.inv[[j, i]]).sum();
            phi_c += row_sum * phi[node];
        }
        phi_c *= cap.inv_sum_recip;
        let phi_c = comm.all_reduce_scalar(phi_c, sheath_comm::ReduceOp::Sum)?;
        log::debug!("floating potential of object {}: {phi_c:.6e}", a + 1);

        // Residual to the equipotential on this rank's surface nodes.
        let delta_phi = &mut scratch.delta_phi[..total];
        delta_phi.fill(0.0);
        for (j_local, &node) in local.iter().enumerate() {
            delta_phi[rows.start + j_local] = phi_c - phi[node];
        }
        comm.all_reduce_sum_in_place(delta_phi)?;

        // Eq. 5: charge correction, again accumulated over local rows only.
        let rho_corr = &mut scratch.rho_corr[..total];
        rho_corr.fill(0.0);
        for j_local in 0..local.len() {
            let j = rows.start + j_local;
            let dp = delta_phi[j];
            for (i, rc) in rho_corr.iter_mut().enumerate() {
                *rc += cap.inv[[j, i]] * dp;
            }
        }
        comm.all_reduce_sum_in_place(rho_corr)?;

        for (j_local, &node) in local.iter().enumerate() {
            rho[node] += rho_corr[rows.start + j_local];
        }

        potentials.push(phi_c);
    }
    Ok(potentials)
}
