//! # Sheath Core
//!
//! The capacitance-matrix treatment of perfect conductors embedded in the
//! grid of a distributed electrostatic particle-in-cell simulation.
//!
//! A conductor is a connected region of grid nodes sharing a positive
//! integer tag in the object map. Because the Poisson solve knows nothing
//! about conductors, the potential it produces is generally not constant
//! over an object's surface; the core restores the physics by solving a
//! small dense linear system per object (Miyake & Usui, *Phys. Plasmas*
//! **16**, 062904 (2009)): each step, the inverted capacitance matrix turns
//! the surface-potential residual into a surface charge correction that
//! makes the conductor an equipotential at its floating potential.
//!
//! ## Architecture
//!
//! Everything expensive happens once, at [`object::ObjectSet::initialise`]:
//! node classification, the global surface gather, and one unit-charge
//! Poisson solve per surface node to assemble the capacitance matrices.
//! The per-step work — impact collection and charge correction — reuses
//! that immutable store and costs a handful of collectives per object.
//!
//! ## Modules
//!
//! - [`object`] — object map, lookup tables, capacitance store, per-step
//!   correction and impact collection.
//! - [`poisson`] — field solver contract and the SOR reference backend.
//! - [`population`] — flat particle arrays with O(1) removal.
//! - [`photo`] — photoemission from sunlit surfaces (future extension).
//! - [`error`] — the four-kind fatal error taxonomy.

pub mod error;
pub mod object;
pub mod photo;
pub mod poisson;
pub mod population;

pub use error::CoreError;
