//! Ghost-layer exchange between neighbouring subdomains.
//!
//! Two modes, matching the two directions the simulation needs:
//!
//! - [`exchange_set`] (*set* mode, truth → halo): every ghost plane becomes
//!   a copy of the neighbouring rank's adjacent owned plane. Used for the
//!   object map after loading and for the potential between solver sweeps.
//! - [`exchange_add`] (*add* mode, halo → truth): ghost planes are folded
//!   into the neighbour's adjacent owned plane and then cleared. Used for
//!   grid quantities accumulated past the subdomain edge.
//!
//! Axes are processed in order, so edge and corner ghosts propagate through
//! the sequence of face exchanges. Faces on the global boundary have no
//! neighbour and are left untouched; their boundary condition belongs to
//! the field solver.

use sheath_comm::{CommError, Communicator};

use crate::domain::{Domain, Side};
use crate::Grid3;

/// Copy the plane `coord` (along `axis`) out of the grid, ghost rows of the
/// perpendicular axes included.
pub fn extract_plane(grid: &Grid3, axis: usize, coord: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(plane_len(grid, axis));
    for_plane(grid, axis, coord, |idx| out.push(grid[idx]));
    out
}

/// Overwrite the plane `coord` (along `axis`) with `data`.
pub fn set_plane(grid: &mut Grid3, axis: usize, coord: usize, data: &[f64]) {
    debug_assert_eq!(data.len(), plane_len(grid, axis));
    let mut k = 0;
    for_plane_mut(grid, axis, coord, |v| {
        *v = data[k];
        k += 1;
    });
}

/// Add `data` into the plane `coord` (along `axis`).
pub fn add_plane(grid: &mut Grid3, axis: usize, coord: usize, data: &[f64]) {
    debug_assert_eq!(data.len(), plane_len(grid, axis));
    let mut k = 0;
    for_plane_mut(grid, axis, coord, |v| {
        *v += data[k];
        k += 1;
    });
}

fn plane_len(grid: &Grid3, axis: usize) -> usize {
    let s = grid.size();
    s.iter().product::<usize>() / s[axis]
}

fn perpendicular(axis: usize) -> (usize, usize) {
    match axis {
        0 => (1, 2),
        1 => (0, 2),
        2 => (0, 1),
        _ => unreachable!("3D grid"),
    }
}

fn for_plane(grid: &Grid3, axis: usize, coord: usize, mut f: impl FnMut(usize)) {
    let (a, b) = perpendicular(axis);
    let size = grid.size();
    let mut c = [0usize; 3];
    c[axis] = coord;
    for cb in 0..size[b] {
        for ca in 0..size[a] {
            c[a] = ca;
            c[b] = cb;
            f(grid.index(c[0], c[1], c[2]));
        }
    }
}

fn for_plane_mut(grid: &mut Grid3, axis: usize, coord: usize, mut f: impl FnMut(&mut f64)) {
    let (a, b) = perpendicular(axis);
    let size = grid.size();
    let mut c = [0usize; 3];
    c[axis] = coord;
    for cb in 0..size[b] {
        for ca in 0..size[a] {
            c[a] = ca;
            c[b] = cb;
            let idx = grid.index(c[0], c[1], c[2]);
            f(&mut grid[idx]);
        }
    }
}

/// Truth → halo: ghost planes become copies of the neighbour's owned planes.
pub fn exchange_set(
    grid: &mut Grid3,
    domain: &Domain,
    comm: &dyn Communicator,
) -> Result<(), CommError> {
    let g = grid.n_ghost();
    for axis in 0..3 {
        let size = grid.size();
        for side in [Side::Lower, Side::Upper] {
            let Some(peer) = domain.neighbor(axis, side) else {
                continue;
            };
            // Owned planes adjacent to this face, innermost-global-first.
            let send: Vec<f64> = (0..g)
                .flat_map(|l| {
                    let coord = match side {
                        Side::Lower => g + l,
                        Side::Upper => size[axis] - 2 * g + l,
                    };
                    extract_plane(grid, axis, coord)
                })
                .collect();
            let recv = comm.exchange(peer, &send)?;
            let chunk = plane_len(grid, axis);
            for l in 0..g {
                let coord = match side {
                    Side::Lower => l,
                    Side::Upper => size[axis] - g + l,
                };
                set_plane(grid, axis, coord, &recv[l * chunk..(l + 1) * chunk]);
            }
        }
    }
    Ok(())
}

/// Halo → truth: ghost planes are added into the neighbour's owned planes
/// and cleared afterwards so a later exchange cannot double-count them.
pub fn exchange_add(
    grid: &mut Grid3,
    domain: &Domain,
    comm: &dyn Communicator,
) -> Result<(), CommError> {
    let g = grid.n_ghost();
    for axis in 0..3 {
        let size = grid.size();
        for side in [Side::Lower, Side::Upper] {
            let Some(peer) = domain.neighbor(axis, side) else {
                continue;
            };
            let ghost_coord = |l: usize| match side {
                Side::Lower => l,
                Side::Upper => size[axis] - g + l,
            };
            let send: Vec<f64> = (0..g)
                .flat_map(|l| extract_plane(grid, axis, ghost_coord(l)))
                .collect();
            let recv = comm.exchange(peer, &send)?;
            let chunk = plane_len(grid, axis);
            for l in 0..g {
                let coord = match side {
                    Side::Lower => g + l,
                    Side::Upper => size[axis] - 2 * g + l,
                };
                add_plane(grid, axis, coord, &recv[l * chunk..(l + 1) * chunk]);
                let zeros = vec![0.0; chunk];
                set_plane(grid, axis, ghost_coord(l), &zeros);
            }
        }
    }
    Ok(())
}
