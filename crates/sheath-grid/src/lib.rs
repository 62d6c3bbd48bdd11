//! # Sheath Grid
//!
//! Regular Cartesian 3D scalar fields on a per-rank subdomain.
//!
//! A [`Grid3`] stores a flat `Vec<f64>` with x-fastest strides and a band of
//! ghost layers on every face. Linear indices advance by `stride(d)` when
//! coordinate `d` increments; ghost nodes mirror a neighbouring rank's truth
//! and are excluded from ownership-sensitive operations.
//!
//! ## Modules
//!
//! - [`domain`] — Cartesian decomposition of the global grid over ranks.
//! - [`halo`] — ghost exchange in *set* (to-halo) and *add* (from-halo) modes.
//! - [`loader`] — plain-text scalar field files and subdomain extraction.

pub mod domain;
pub mod halo;
pub mod loader;

pub use domain::Domain;

use thiserror::Error;

/// Errors from grid construction, decomposition, and field loading.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{path}:{line}: {msg}")]
    Parse {
        path: String,
        line: usize,
        msg: String,
    },

    #[error("field shape {found:?} does not match the configured grid {expected:?}")]
    ShapeMismatch {
        expected: [usize; 3],
        found: [usize; 3],
    },

    #[error("invalid domain decomposition: {0}")]
    Decomposition(String),
}

/// A scalar field on this rank's subdomain, ghost layers included.
///
/// The value array is flat with `stride(0) = 1` (x is fastest), so the
/// linear index of node `(x, y, z)` is `x + y·stride(1) + z·stride(2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid3 {
    size: [usize; 3],
    true_size: [usize; 3],
    n_ghost: usize,
    strides: [usize; 3],
    val: Vec<f64>,
}

impl Grid3 {
    /// Allocate a zeroed grid with `true_size` owned nodes per axis and
    /// `n_ghost` ghost layers on each face. The stencil code in the core
    /// requires at least one ghost layer.
    pub fn new(true_size: [usize; 3], n_ghost: usize) -> Self {
        assert!(n_ghost >= 1, "grids carry at least one ghost layer");
        let size = [
            true_size[0] + 2 * n_ghost,
            true_size[1] + 2 * n_ghost,
            true_size[2] + 2 * n_ghost,
        ];
        let strides = [1, size[0], size[0] * size[1]];
        let len = size[0] * size[1] * size[2];
        Self {
            size,
            true_size,
            n_ghost,
            strides,
            val: vec![0.0; len],
        }
    }

    /// Total node count, ghosts included.
    #[inline]
    pub fn len(&self) -> usize {
        self.val.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.val.is_empty()
    }

    /// Per-axis extent including ghost layers.
    #[inline]
    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    /// Per-axis extent of the owned region.
    #[inline]
    pub fn true_size(&self) -> [usize; 3] {
        self.true_size
    }

    /// Ghost layers per face.
    #[inline]
    pub fn n_ghost(&self) -> usize {
        self.n_ghost
    }

    /// Linear-index stride of axis `d`.
    #[inline]
    pub fn stride(&self, d: usize) -> usize {
        self.strides[d]
    }

    /// Linear index of node `(x, y, z)` (ghost-inclusive coordinates).
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.strides[1] + z * self.strides[2]
    }

    /// Ghost-inclusive coordinates of a linear index.
    #[inline]
    pub fn coords(&self, idx: usize) -> [usize; 3] {
        let z = idx / self.strides[2];
        let rem = idx % self.strides[2];
        [rem % self.size[0], rem / self.size[0], z]
    }

    /// Whether any coordinate of `idx` lies inside the ghost band.
    #[inline]
    pub fn is_ghost(&self, idx: usize) -> bool {
        let c = self.coords(idx);
        (0..3).any(|d| c[d] < self.n_ghost || c[d] >= self.size[d] - self.n_ghost)
    }

    /// The raw value array.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.val
    }

    #[inline]
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.val
    }

    /// Set every value (ghosts included) to zero.
    pub fn zero(&mut self) {
        self.val.fill(0.0);
    }

    /// Element-wise add another grid of identical geometry.
    pub fn add_from(&mut self, other: &Grid3) {
        assert_eq!(self.size, other.size, "grid geometries differ");
        for (a, b) in self.val.iter_mut().zip(&other.val) {
            *a += b;
        }
    }

    /// Sum of all owned (non-ghost) values.
    pub fn true_sum(&self) -> f64 {
        let mut sum = 0.0;
        for idx in 0..self.len() {
            if !self.is_ghost(idx) {
                sum += self.val[idx];
            }
        }
        sum
    }
}

impl std::ops::Index<usize> for Grid3 {
    type Output = f64;

    #[inline]
    fn index(&self, idx: usize) -> &f64 {
        &self.val[idx]
    }
}

impl std::ops::IndexMut<usize> for Grid3 {
    #[inline]
    fn index_mut(&mut self, idx: usize) -> &mut f64 {
        &mut self.val[idx]
    }
}
