//! Conductor objects embedded in the computational grid.
//!
//! An [`ObjectSet`] owns everything derived from the object map at
//! initialisation: the tag field itself, the interior/surface/exposed
//! lookup tables, the global surface index maps, and one inverted
//! capacitance matrix per object. Building the set is collective and
//! expensive (`Σₐ Tₐ` Poisson solves); afterwards the per-step operations —
//! [`ObjectSet::apply_corrections`] and [`ObjectSet::collect_impacts`] —
//! reuse the immutable store.
//!
//! The solver's `rho`/`phi` grids are always borrowed through call
//! arguments; the set caches only its own read-only tables.

pub mod capacitance;
pub mod classify;
pub mod collect;
pub mod gather;
pub mod map;

mod correct;

use std::path::Path;

use sheath_comm::Communicator;
use sheath_grid::{Domain, Grid3};

use crate::error::CoreError;
use crate::poisson::PoissonSolver;
use crate::population::Population;

pub use capacitance::ObjectCapacitance;
pub use classify::Lookup;
pub use collect::{ImpactReport, InteractionPolicy};
pub use gather::GlobalSurfaceMap;

/// All conductor objects of a run, with their capacitance structure.
pub struct ObjectSet {
    map: Grid3,
    n_objects: usize,
    interior: Lookup,
    surface: Lookup,
    exposed: Option<Lookup>,
    surface_maps: Vec<GlobalSurfaceMap>,
    capacitance: Vec<ObjectCapacitance>,
    policy: InteractionPolicy,
    scratch: correct::CorrectionScratch,
}

impl ObjectSet {
    /// Load the object map and build every derived structure.
    ///
    /// `rho` and `phi` are the solver's grids, borrowed for the capacitance
    /// assembly. `with_exposed` additionally discovers sun-facing surface
    /// nodes for the photoemission subcomponent.
    #[allow(clippy::too_many_arguments)]
    pub fn initialise(
        path: &Path,
        global_size: [usize; 3],
        domain: &Domain,
        solver: &mut dyn PoissonSolver,
        rho: &mut Grid3,
        phi: &mut Grid3,
        with_exposed: bool,
        comm: &dyn Communicator,
    ) -> Result<Self, CoreError> {
        let tag_map = map::load_object_map(path, global_size, domain, comm)?;
        Self::from_map(tag_map, solver, rho, phi, with_exposed, comm)
    }

    /// Build the set from an already-loaded (and halo-exchanged) tag field.
    pub fn from_map(
        tag_map: Grid3,
        solver: &mut dyn PoissonSolver,
        rho: &mut Grid3,
        phi: &mut Grid3,
        with_exposed: bool,
        comm: &dyn Communicator,
    ) -> Result<Self, CoreError> {
        if tag_map.size() != rho.size() || tag_map.size() != phi.size() {
            return Err(CoreError::Config(format!(
                "object map geometry {:?} disagrees with the simulation grid {:?}",
                tag_map.size(),
                rho.size()
            )));
        }

        let n_objects = map::count_objects(&tag_map, comm)?;
        log::info!("object map holds {n_objects} object(s)");

        let interior = classify::interior_lookup(&tag_map, n_objects);
        let surface = classify::surface_lookup(&tag_map, n_objects)?;
        let exposed = with_exposed.then(|| classify::exposed_lookup(&tag_map, &surface));

        let surface_maps = gather::gather_surface_maps(&surface, comm)?;
        let capacitance =
            capacitance::build_capacitance(&surface, &surface_maps, solver, rho, phi, comm)?;
        let scratch = correct::CorrectionScratch::sized_for(&surface_maps);

        Ok(Self {
            map: tag_map,
            n_objects,
            interior,
            surface,
            exposed,
            surface_maps,
            capacitance,
            policy: InteractionPolicy::default(),
            scratch,
        })
    }

    pub fn n_objects(&self) -> usize {
        self.n_objects
    }

    /// The immutable tag field (ghosts mirrored from neighbouring ranks).
    pub fn map(&self) -> &Grid3 {
        &self.map
    }

    pub fn interior(&self) -> &Lookup {
        &self.interior
    }

    pub fn surface(&self) -> &Lookup {
        &self.surface
    }

    /// Sun-facing surface nodes, present when photoemission is configured.
    pub fn exposed(&self) -> Option<&Lookup> {
        self.exposed.as_ref()
    }

    pub fn surface_maps(&self) -> &[GlobalSurfaceMap] {
        &self.surface_maps
    }

    pub fn capacitance(&self, a: usize) -> &ObjectCapacitance {
        &self.capacitance[a]
    }

    /// Global surface-node count of object `a`.
    pub fn surface_total(&self, a: usize) -> usize {
        self.surface_maps[a].total()
    }

    /// Force every conductor to its floating potential by correcting `rho`
    /// at the surface nodes. `phi` is the potential of the base solve; the
    /// caller re-solves afterwards. Returns the floating potential of each
    /// object.
    pub fn apply_corrections(
        &mut self,
        rho: &mut Grid3,
        phi: &Grid3,
        comm: &dyn Communicator,
    ) -> Result<Vec<f64>, CoreError> {
        correct::apply_corrections(
            rho,
            phi,
            &self.surface,
            &self.surface_maps,
            &self.capacitance,
            &mut self.scratch,
            comm,
        )
    }

    /// Absorb particles that entered object interiors and account their
    /// charge on `rho_obj`.
    pub fn collect_impacts(
        &self,
        pop: &mut Population,
        rho_obj: &mut Grid3,
        comm: &dyn Communicator,
    ) -> Result<ImpactReport, CoreError> {
        collect::collect_impacts(
            pop,
            rho_obj,
            &self.interior,
            &self.surface,
            &self.surface_maps,
            self.policy,
            comm,
        )
    }
}
