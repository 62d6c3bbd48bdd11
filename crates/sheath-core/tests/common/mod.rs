#![allow(dead_code)]

use sheath_comm::{Communicator, SerialComm};
use sheath_core::object::ObjectSet;
use sheath_core::poisson::sor::SorSolver;
use sheath_core::poisson::SolverOptions;
use sheath_grid::{halo, Domain, Grid3};

/// A single-rank simulation scaffold around an object set.
pub struct SerialSetup {
    pub objects: ObjectSet,
    pub solver: SorSolver,
    pub rho: Grid3,
    pub phi: Grid3,
    pub comm: SerialComm,
}

/// Tag the given local (ghost-inclusive) coordinates in a fresh map.
pub fn grid_with_tags(true_size: [usize; 3], tags: &[([usize; 3], f64)]) -> Grid3 {
    let mut map = Grid3::new(true_size, 1);
    for &([x, y, z], tag) in tags {
        let idx = map.index(x, y, z);
        map[idx] = tag;
    }
    map
}

/// Build a one-rank object set with the SOR reference solver.
pub fn build_serial(true_size: [usize; 3], tags: &[([usize; 3], f64)]) -> SerialSetup {
    let comm = SerialComm::new();
    let domain = Domain::from_rank(0, [1, 1, 1]).unwrap();
    let map = grid_with_tags(true_size, tags);
    let mut rho = Grid3::new(true_size, 1);
    let mut phi = Grid3::new(true_size, 1);
    let mut solver = SorSolver::new(SolverOptions::default(), domain);
    let objects =
        ObjectSet::from_map(map, &mut solver, &mut rho, &mut phi, false, &comm).unwrap();
    SerialSetup {
        objects,
        solver,
        rho,
        phi,
        comm,
    }
}

/// Build one rank's share of a multi-rank object set from globally
/// specified tags, mirroring the loader + halo path.
pub fn build_distributed(
    comm: &dyn Communicator,
    global_size: [usize; 3],
    subdomains: [usize; 3],
    tags: &[([usize; 3], f64)],
) -> (ObjectSet, SorSolver, Grid3, Grid3, Domain) {
    let domain = Domain::from_rank(comm.rank(), subdomains).unwrap();
    let local = domain.local_true_size(global_size).unwrap();
    let offset = domain.global_offset(local);

    let mut map = Grid3::new(local, 1);
    for &([gx, gy, gz], tag) in tags {
        let owned = (0..3).all(|d| {
            let c = [gx, gy, gz][d];
            c >= offset[d] && c < offset[d] + local[d]
        });
        if owned {
            let idx = map.index(gx - offset[0] + 1, gy - offset[1] + 1, gz - offset[2] + 1);
            map[idx] = tag;
        }
    }
    halo::exchange_set(&mut map, &domain, comm).unwrap();

    let mut rho = Grid3::new(local, 1);
    let mut phi = Grid3::new(local, 1);
    let mut solver = SorSolver::new(SolverOptions::default(), domain);
    let objects = ObjectSet::from_map(map, &mut solver, &mut rho, &mut phi, false, comm).unwrap();
    (objects, solver, rho, phi, domain)
}

/// Global true coordinates of every surface node this rank owns, in local
/// scan order.
pub fn surface_global_coords(
    objects: &ObjectSet,
    domain: &Domain,
    a: usize,
) -> Vec<[usize; 3]> {
    let map = objects.map();
    let local = map.true_size();
    let offset = domain.global_offset(local);
    objects
        .surface()
        .object(a)
        .iter()
        .map(|&idx| {
            let c = map.coords(idx);
            [
                c[0] - 1 + offset[0],
                c[1] - 1 + offset[1],
                c[2] - 1 + offset[2],
            ]
        })
        .collect()
}
