//! TOML configuration deserialisation for simulation jobs.

use serde::Deserialize;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub grid: GridConfig,
    #[serde(default)]
    pub methods: MethodsConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    pub objects: ObjectsConfig,
    #[serde(default)]
    pub time: TimeConfig,
    #[serde(default)]
    pub species: Vec<SpeciesConfig>,
    #[serde(default)]
    pub particles: Vec<ParticleConfig>,
    #[serde(default)]
    pub photoemission: Option<PhotoemissionConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Global grid extents and rank decomposition.
#[derive(Debug, Deserialize)]
pub struct GridConfig {
    /// Global true size per axis, without ghost layers.
    pub size: [usize; 3],
    #[serde(default = "default_subdomains")]
    pub subdomains: [usize; 3],
}

fn default_subdomains() -> [usize; 3] {
    [1, 1, 1]
}

/// Numerical method selectors.
#[derive(Debug, Deserialize)]
pub struct MethodsConfig {
    /// Poisson backend; only "sor" is shipped.
    #[serde(default = "default_poisson")]
    pub poisson: String,
}

impl Default for MethodsConfig {
    fn default() -> Self {
        Self {
            poisson: default_poisson(),
        }
    }
}

fn default_poisson() -> String {
    "sor".into()
}

/// Field solver tuning.
#[derive(Debug, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_sweeps")]
    pub max_sweeps: usize,
    #[serde(default = "default_omega")]
    pub omega: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_sweeps: default_max_sweeps(),
            omega: default_omega(),
        }
    }
}

fn default_tolerance() -> f64 {
    1e-10
}
fn default_max_sweeps() -> usize {
    50_000
}
fn default_omega() -> f64 {
    1.8
}

/// Conductor objects.
#[derive(Debug, Deserialize)]
pub struct ObjectsConfig {
    /// Path to the tag-field file (header `nx ny nz`, then values).
    pub map_file: String,
}

/// Time stepping.
#[derive(Debug, Deserialize)]
pub struct TimeConfig {
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Seconds per step; only the photoemission fluxes consume it.
    #[serde(default = "default_dt")]
    pub dt: f64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            dt: default_dt(),
        }
    }
}

fn default_steps() -> usize {
    1
}
fn default_dt() -> f64 {
    1e-6
}

/// One particle species.
#[derive(Debug, Deserialize)]
pub struct SpeciesConfig {
    /// Normalised macro-particle charge.
    pub charge: f64,
    /// Maximum live particles per rank.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    4096
}

/// An initial particle, in node units of the local grid.
#[derive(Debug, Deserialize)]
pub struct ParticleConfig {
    pub species: usize,
    pub position: [f64; 3],
    #[serde(default)]
    pub velocity: [f64; 3],
}

/// Photoemission inputs (enables exposed-node discovery when present).
#[derive(Debug, Deserialize)]
pub struct PhotoemissionConfig {
    /// Photon cutoff wavenumber per object (cm⁻¹).
    pub work_function: Vec<f64>,
    /// Conducting surface area per object (m²).
    pub conducting_surface: Vec<f64>,
    /// Distance from the sun (m).
    pub distance_from_sun: f64,
    /// Black-body temperature of the solar spectrum (K).
    pub black_body_temp: f64,
    #[serde(default = "default_macro_weight")]
    pub macro_weight: f64,
}

fn default_macro_weight() -> f64 {
    1.0
}

/// Output locations.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: JobConfig = toml::from_str(&content)?;
    Ok(config)
}
