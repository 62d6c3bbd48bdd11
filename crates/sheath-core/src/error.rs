//! Error taxonomy of the conductor core.
//!
//! Four kinds, all fatal: the simulation has no physical meaning without a
//! correctly assembled capacitance structure, so nothing is recovered
//! locally. The driver prints one rank-prefixed line and aborts.

use sheath_comm::CommError;
use sheath_grid::GridError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The object map or configuration is inconsistent (missing dataset,
    /// zero objects with the subsystem enabled, an object without surface
    /// nodes, a shape mismatch).
    #[error("configuration error: {0}")]
    Config(String),

    /// LU decomposition failed or a capacitance matrix is singular to
    /// working precision.
    #[error("numerical error: {0}")]
    Numerical(String),

    /// A collective failed or participants disagree on object or size
    /// counts.
    #[error("communication error: {0}")]
    Comm(String),

    /// An internal invariant was violated (e.g. a ghost index leaked into
    /// a surface table).
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl From<CommError> for CoreError {
    fn from(err: CommError) -> Self {
        CoreError::Comm(err.to_string())
    }
}

impl From<GridError> for CoreError {
    fn from(err: GridError) -> Self {
        CoreError::Config(err.to_string())
    }
}
