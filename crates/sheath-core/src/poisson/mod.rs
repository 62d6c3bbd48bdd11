//! Electrostatic field solver interface.
//!
//! The conductor core does not own a Poisson discretisation; it consumes a
//! [`PoissonSolver`] and assumes only that two calls with the same charge
//! density produce the same potential. Boundary conditions belong to the
//! solver. Backend selection follows the configuration key
//! `methods.poisson`.

pub mod sor;

use sheath_comm::Communicator;
use sheath_grid::{Domain, Grid3};

use crate::error::CoreError;

/// A re-entrant solver for `∇²φ = −ρ` on the distributed grid.
///
/// `rho` is read, `phi` is overwritten. The call is collective: every rank
/// must enter with its own subdomain of the same global system.
pub trait PoissonSolver {
    fn solve(
        &mut self,
        rho: &Grid3,
        phi: &mut Grid3,
        comm: &dyn Communicator,
    ) -> Result<(), CoreError>;

    /// The residual tolerance the solver converges to, used by callers to
    /// scale acceptance thresholds.
    fn residual_tolerance(&self) -> f64;
}

/// Tuning knobs shared by the shipped backends.
#[derive(Debug, Clone, Copy)]
pub struct SolverOptions {
    pub tolerance: f64,
    pub max_sweeps: usize,
    /// Over-relaxation factor in `(0, 2)`.
    pub omega: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_sweeps: 50_000,
            omega: 1.8,
        }
    }
}

/// Instantiate the configured backend.
pub fn select_solver(
    method: &str,
    options: SolverOptions,
    domain: Domain,
) -> Result<Box<dyn PoissonSolver>, CoreError> {
    match method {
        "sor" => Ok(Box::new(sor::SorSolver::new(options, domain))),
        other => Err(CoreError::Config(format!(
            "unknown Poisson backend {other:?} (available: \"sor\")"
        ))),
    }
}
