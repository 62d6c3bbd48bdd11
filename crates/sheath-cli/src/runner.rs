//! Simulation runner: ties together grid, objects, solver, and stepping.

use std::path::Path;

use anyhow::{bail, Context, Result};

use sheath_comm::Communicator;
use sheath_core::object::ObjectSet;
use sheath_core::photo::{PhotoConfig, Photoemission};
use sheath_core::poisson::{select_solver, SolverOptions};
use sheath_core::population::Population;
use sheath_grid::{Domain, Grid3};

use crate::config::JobConfig;

/// One time step's observables.
pub struct StepRecord {
    pub step: usize,
    /// Floating potential per object.
    pub potentials: Vec<f64>,
    /// Cumulative charge collected per object.
    pub collected: Vec<f64>,
    /// Particles absorbed this step across all ranks.
    pub absorbed: u64,
}

/// Run a full simulation from a parsed job configuration.
pub fn run_simulation(job: &JobConfig, comm: &dyn Communicator) -> Result<Vec<StepRecord>> {
    let n_ranks: usize = job.grid.subdomains.iter().product();
    if n_ranks != comm.size() {
        bail!(
            "decomposition {:?} needs {n_ranks} rank(s) but the world has {}",
            job.grid.subdomains,
            comm.size()
        );
    }

    let domain = Domain::from_rank(comm.rank(), job.grid.subdomains)?;
    let local = domain.local_true_size(job.grid.size)?;

    let mut rho = Grid3::new(local, 1);
    let mut phi = Grid3::new(local, 1);
    let mut rho_obj = Grid3::new(local, 1);

    let options = SolverOptions {
        tolerance: job.solver.tolerance,
        max_sweeps: job.solver.max_sweeps,
        omega: job.solver.omega,
    };
    let mut solver = select_solver(&job.methods.poisson, options, domain)?;

    let mut objects = ObjectSet::initialise(
        Path::new(&job.objects.map_file),
        job.grid.size,
        &domain,
        solver.as_mut(),
        &mut rho,
        &mut phi,
        job.photoemission.is_some(),
        comm,
    )
    .context("initialising the object set")?;

    let photoemission = job
        .photoemission
        .as_ref()
        .map(|p| {
            Photoemission::new(
                PhotoConfig {
                    work_function: p.work_function.clone(),
                    conducting_surface: p.conducting_surface.clone(),
                    distance_from_sun: p.distance_from_sun,
                    black_body_temp: p.black_body_temp,
                    time_step: job.time.dt,
                    macro_weight: p.macro_weight,
                },
                objects.n_objects(),
            )
        })
        .transpose()
        .context("evaluating photoemission fluxes")?;

    let capacities: Vec<usize> = job.species.iter().map(|s| s.capacity).collect();
    let charges: Vec<f64> = job.species.iter().map(|s| s.charge).collect();
    let mut pop = Population::new(&capacities, &charges);
    for p in &job.particles {
        if p.species >= pop.n_species() {
            bail!("particle references unknown species {}", p.species);
        }
        pop.push(p.species, p.position, p.velocity)?;
    }

    let mut records = Vec::with_capacity(job.time.steps);
    let mut cumulative = vec![0.0; objects.n_objects()];

    for step in 0..job.time.steps {
        let report = objects.collect_impacts(&mut pop, &mut rho_obj, comm)?;
        for (c, dc) in cumulative.iter_mut().zip(&report.collected) {
            *c += dc;
        }

        if let Some(photo) = &photoemission {
            photo.collect(&objects, &mut rho_obj, comm)?;
        }

        // The object charge persists across steps; fold it into this
        // step's density before the base solve.
        rho.zero();
        rho.add_from(&rho_obj);

        solver.solve(&rho, &mut phi, comm)?;
        let potentials = objects.apply_corrections(&mut rho, &phi, comm)?;
        solver.solve(&rho, &mut phi, comm)?;

        log::info!(
            "step {step}: potentials {potentials:?}, absorbed {}",
            report.absorbed
        );
        records.push(StepRecord {
            step,
            potentials,
            collected: cumulative.clone(),
            absorbed: report.absorbed,
        });
    }

    Ok(records)
}

/// Write per-step floating potentials and collected charges as CSV.
pub fn write_records_csv(records: &[StepRecord], path: &Path) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut f = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;

    let n_objects = records.first().map_or(0, |r| r.potentials.len());
    write!(f, "step")?;
    for a in 1..=n_objects {
        write!(f, ",phi_c_{a},charge_{a}")?;
    }
    writeln!(f, ",absorbed")?;

    for r in records {
        write!(f, "{}", r.step)?;
        for a in 0..n_objects {
            write!(f, ",{:.9e},{:.9e}", r.potentials[a], r.collected[a])?;
        }
        writeln!(f, ",{}", r.absorbed)?;
    }
    Ok(())
}
