//! Capacitance-matrix assembly and inversion.
//!
//! For a conductor with `T` surface nodes, column `i` of the capacitance
//! matrix `C` is the vector of surface potentials produced by a unit charge
//! at surface node `i` under the simulation's actual boundary conditions
//! and zero charge elsewhere. The charge corrector needs `K = C⁻¹`, so the
//! builder runs `T` Poisson solves per object, completes the matrix with an
//! all-reduce, and inverts it by LU decomposition with partial pivoting.
//!
//! This is the dominant setup cost (`Σₐ Tₐ` solves) and runs once; the
//! inverse matrices are immutable afterwards.

use faer::linalg::solvers::SpSolver;
use ndarray::Array2;

use sheath_comm::Communicator;
use sheath_grid::Grid3;

use crate::error::CoreError;
use crate::object::classify::Lookup;
use crate::object::gather::GlobalSurfaceMap;
use crate::poisson::PoissonSolver;

/// The inverted capacitance matrix of one object.
#[derive(Debug, Clone)]
pub struct ObjectCapacitance {
    /// `K = C⁻¹`, indexed `[response row j, unit-charge column i]` in the
    /// global surface ordering.
    pub inv: Array2<f64>,
    /// `S = 1 / Σᵢⱼ K[i,j]`, the conversion from a capacitance-weighted
    /// potential sum to the object's floating potential.
    pub inv_sum_recip: f64,
}

/// Assemble and invert the capacitance matrix of every object.
///
/// `rho` and `phi` are the solver's grids, borrowed for the duration of the
/// assembly; both are zeroed on entry and left in an unspecified state.
pub fn build_capacitance(
    surface: &Lookup,
    maps: &[GlobalSurfaceMap],
    solver: &mut dyn PoissonSolver,
    rho: &mut Grid3,
    phi: &mut Grid3,
    comm: &dyn Communicator,
) -> Result<Vec<ObjectCapacitance>, CoreError> {
    let rank = comm.rank();
    rho.zero();
    phi.zero();

    let mut store = Vec::with_capacity(maps.len());
    for (a, map) in maps.iter().enumerate() {
        let total = map.total();
        if total < 1 {
            return Err(CoreError::Config(format!(
                "object {} has no surface nodes on any rank",
                a + 1
            )));
        }
        log::info!(
            "assembling capacitance matrix for object {} ({} surface nodes, {} solves)",
            a + 1,
            total,
            total
        );

        let local = surface.object(a);
        let rows = map.range_of(rank);
        debug_assert_eq!(rows.len(), local.len());

        let mut cap = Array2::<f64>::zeros((total, total));
        for i in 0..total {
            let owner = map.owner_of(i);
            let owner_local = i - map.range_of(owner).start;

            // Unit test charge lives on exactly one rank; everyone else
            // solves with a zero right-hand side contribution.
            if owner == rank {
                rho[local[owner_local]] = 1.0;
            }
            solver.solve(rho, phi, comm)?;
            if owner == rank {
                rho[local[owner_local]] = 0.0;
            }

            // Each rank fills its own rows of column i.
            for (j_local, &node) in local.iter().enumerate() {
                cap[[rows.start + j_local, i]] = phi[node];
            }
        }

        // Complete the matrix on every rank before the dense inversion.
        comm.all_reduce_sum_in_place(cap.as_slice_mut().expect("row-major matrix"))?;

        store.push(invert(a, cap)?);
    }
    Ok(store)
}

/// Invert `C` by LU with partial pivoting and derive the floating-potential
/// normalisation.
fn invert(a: usize, cap: Array2<f64>) -> Result<ObjectCapacitance, CoreError> {
    let t = cap.nrows();

    let faer_cap = faer::Mat::<f64>::from_fn(t, t, |r, c| cap[[r, c]]);
    let lu = faer_cap.partial_piv_lu();
    let eye = faer::Mat::<f64>::from_fn(t, t, |r, c| if r == c { 1.0 } else { 0.0 });
    let faer_inv = lu.solve(&eye);

    let mut inv = Array2::<f64>::zeros((t, t));
    let mut sum = 0.0;
    for r in 0..t {
        for c in 0..t {
            let v = faer_inv.read(r, c);
            if !v.is_finite() {
                return Err(CoreError::Numerical(format!(
                    "capacitance matrix of object {} is singular to working precision \
                     (zero pivot in LU)",
                    a + 1
                )));
            }
            inv[[r, c]] = v;
            sum += v;
        }
    }

    if !(sum.is_finite() && sum > 0.0) {
        return Err(CoreError::Numerical(format!(
            "capacitance matrix of object {} is ill-posed: ΣK = {sum:.3e}",
            a + 1
        )));
    }

    log::debug!(
        "object {}: T = {}, cond₁ ≈ {:.3e}",
        a + 1,
        t,
        one_norm(&cap) * one_norm(&inv)
    );

    Ok(ObjectCapacitance {
        inv,
        inv_sum_recip: 1.0 / sum,
    })
}

fn one_norm(m: &Array2<f64>) -> f64 {
    let mut max = 0.0f64;
    for c in m.columns() {
        let s: f64 = c.iter().map(|v| v.abs()).sum();
        max = max.max(s);
    }
    max
}
