//! Photoemission from sunlit conductor surfaces.
//!
//! A future-extension module, weakly coupled to the correction core: it
//! shares the object map (through the exposed-node lookup) but carries its
//! own error taxonomy. The black-body photon and energy fluxes above a
//! per-object work function follow the series expansion of Widger &
//! Woodall, *Bull. Am. Meteorol. Soc.* **57**, 1217 (1976).

use sheath_comm::Communicator;
use sheath_grid::Grid3;
use thiserror::Error;

use crate::object::ObjectSet;

const PLANCK: f64 = 6.626_069_3e-34;
const BOLTZMANN: f64 = 1.380_658e-23;
const SPEED_OF_LIGHT: f64 = 299_792_458.0;
/// Photosphere area entering the solid-angle dilution factor (m²).
const SUN_SURFACE_AREA: f64 = 6.1e18;
/// Series length heuristic: `2 + 20/x`, capped.
const MAX_SERIES_TERMS: usize = 512;

/// Errors of the photoemission subcomponent.
#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("photoemission configuration: {0}")]
    Config(String),

    #[error("spectrum evaluation: {0}")]
    Spectrum(String),

    #[error("communication error: {0}")]
    Comm(String),
}

impl From<sheath_comm::CommError> for PhotoError {
    fn from(err: sheath_comm::CommError) -> Self {
        PhotoError::Comm(err.to_string())
    }
}

/// Per-object solar and material inputs.
#[derive(Debug, Clone)]
pub struct PhotoConfig {
    /// Work function per object, as a photon cutoff wavenumber in cm⁻¹.
    pub work_function: Vec<f64>,
    /// Conducting surface area per object (m²).
    pub conducting_surface: Vec<f64>,
    /// Distance from the sun (m).
    pub distance_from_sun: f64,
    /// Black-body temperature of the solar spectrum (K).
    pub black_body_temp: f64,
    /// Seconds per simulation time step.
    pub time_step: f64,
    /// Physical particles represented by one macro-particle.
    pub macro_weight: f64,
}

impl PhotoConfig {
    fn validate(&self, n_objects: usize) -> Result<(), PhotoError> {
        if self.work_function.len() != n_objects || self.conducting_surface.len() != n_objects {
            return Err(PhotoError::Config(format!(
                "need work_function and conducting_surface for all {n_objects} objects"
            )));
        }
        if self.black_body_temp <= 0.0 || self.distance_from_sun <= 0.0 {
            return Err(PhotoError::Config(
                "black_body_temp and distance_from_sun must be positive".into(),
            ));
        }
        if self.work_function.iter().any(|&s| s <= 0.0) {
            return Err(PhotoError::Spectrum(
                "work function cutoff must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Precomputed per-object fluxes.
#[derive(Debug, Clone)]
pub struct Photoemission {
    /// Photons per time step reaching each object.
    pub radiance: Vec<f64>,
    /// Band energy per time step reaching each object (J).
    pub band_energy: Vec<f64>,
    config: PhotoConfig,
}

impl Photoemission {
    /// Evaluate both Planck integrals for every object.
    pub fn new(config: PhotoConfig, n_objects: usize) -> Result<Self, PhotoError> {
        config.validate(n_objects)?;
        let radiance = (0..n_objects)
            .map(|a| photon_flux(&config, a))
            .collect::<Vec<_>>();
        let band_energy = (0..n_objects)
            .map(|a| band_energy(&config, a))
            .collect::<Vec<_>>();
        log::info!("photoemission fluxes per step: {radiance:?}");
        Ok(Self {
            radiance,
            band_energy,
            config,
        })
    }

    /// Deposit this step's photoelectron charge onto the surface nodes of
    /// `rho_obj`, weighted by this rank's share of sun-exposed nodes and
    /// floored to whole macro-particles.
    pub fn collect(
        &self,
        objects: &ObjectSet,
        rho_obj: &mut Grid3,
        comm: &dyn Communicator,
    ) -> Result<(), PhotoError> {
        let exposed = objects.exposed().ok_or_else(|| {
            PhotoError::Config("object set was initialised without exposed-node discovery".into())
        })?;

        for a in 0..objects.n_objects() {
            let local_exposed = exposed.count(a) as f64;
            let total_exposed =
                comm.all_reduce_scalar(local_exposed, sheath_comm::ReduceOp::Sum)?;
            if total_exposed == 0.0 {
                continue;
            }

            let mut flux = self.radiance[a] / self.config.macro_weight;
            flux *= local_exposed / total_exposed;
            flux = flux.floor();

            let share = flux / objects.surface_total(a) as f64;
            for &node in objects.surface().object(a) {
                rho_obj[node] += share;
            }
            log::debug!("object {}: emitted {flux} macro-photocharges", a + 1);
        }
        Ok(())
    }
}

/// Photons per time step above the cutoff wavenumber: the Widger–Woodall
/// photon-radiance series scaled by the solid angle of the object's surface
/// as seen from the sun.
fn photon_flux(cfg: &PhotoConfig, a: usize) -> f64 {
    let c1 = PLANCK * SPEED_OF_LIGHT / BOLTZMANN;
    let x = c1 * 100.0 * cfg.work_function[a] / cfg.black_body_temp;
    let x2 = x * x;

    let sum: f64 = (1..series_terms(x))
        .map(|n| {
            let dn = 1.0 / n as f64;
            (-(n as f64) * x).exp() * (x2 + 2.0 * (x + dn) * dn) * dn
        })
        .sum();

    let kt_over_hc = BOLTZMANN * cfg.black_body_temp / (PLANCK * SPEED_OF_LIGHT);
    let solid_angle = cfg.conducting_surface[a] / cfg.distance_from_sun.powi(2);
    2.0 * kt_over_hc.powi(3) * SPEED_OF_LIGHT * sum * solid_angle * SUN_SURFACE_AREA
        * cfg.time_step
}

/// Band energy per time step above the cutoff wavenumber (J).
fn band_energy(cfg: &PhotoConfig, a: usize) -> f64 {
    let c1 = PLANCK * SPEED_OF_LIGHT / BOLTZMANN;
    let x = c1 * 100.0 * cfg.work_function[a] / cfg.black_body_temp;
    let x2 = x * x;
    let x3 = x * x2;

    let sum: f64 = (1..series_terms(x))
        .map(|n| {
            let dn = 1.0 / n as f64;
            (-(n as f64) * x).exp() * (x3 + (3.0 * x2 + 6.0 * (x + dn) * dn) * dn) * dn
        })
        .sum();

    let solid_angle = cfg.conducting_surface[a] / cfg.distance_from_sun.powi(2);
    2.0 * PLANCK * SPEED_OF_LIGHT * SPEED_OF_LIGHT * (cfg.black_body_temp / c1).powi(4) * sum
        * solid_angle
        * SUN_SURFACE_AREA
        * cfg.time_step
}

fn series_terms(x: f64) -> usize {
    ((2.0 + 20.0 / x) as usize).min(MAX_SERIES_TERMS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(temp: f64, cutoff: f64) -> PhotoConfig {
        PhotoConfig {
            work_function: vec![cutoff],
            conducting_surface: vec![1.0],
            distance_from_sun: 1.496e11,
            black_body_temp: temp,
            time_step: 1e-6,
            macro_weight: 1.0,
        }
    }

    #[test]
    fn fluxes_are_positive_and_grow_with_temperature() {
        let cold = photon_flux(&config(3000.0, 3.5e4), 0);
        let hot = photon_flux(&config(6000.0, 3.5e4), 0);
        assert!(cold > 0.0);
        assert!(hot > cold);

        let e_cold = band_energy(&config(3000.0, 3.5e4), 0);
        let e_hot = band_energy(&config(6000.0, 3.5e4), 0);
        assert!(e_cold > 0.0);
        assert!(e_hot > e_cold);
    }

    #[test]
    fn higher_cutoff_means_fewer_photons() {
        let low = photon_flux(&config(5778.0, 2.0e4), 0);
        let high = photon_flux(&config(5778.0, 6.0e4), 0);
        assert!(low > high);
    }

    #[test]
    fn validation_rejects_mismatched_lengths() {
        let cfg = config(5778.0, 3.5e4);
        assert!(cfg.validate(1).is_ok());
        assert!(matches!(cfg.validate(2), Err(PhotoError::Config(_))));
    }
}
