//! Distributed assembly against the single-rank reference.
//!
//! A conductor straddling a 2×1×1 rank partition must produce the same
//! physics as the serial run: consistent global surface bookkeeping and a
//! capacitance store that matches the reference entry by entry once the
//! (rank-major vs. serial) surface orderings are aligned by node identity.

mod common;

use std::collections::HashMap;

use sheath_comm::local::LocalCluster;
use sheath_comm::Communicator;
use sheath_core::object::GlobalSurfaceMap;

use common::{build_distributed, build_serial, surface_global_coords};

const GLOBAL: [usize; 3] = [8, 4, 4];

/// A 2³ cube straddling the x = 4 rank boundary.
fn straddling_cube() -> Vec<([usize; 3], f64)> {
    let mut tags = Vec::new();
    for z in 0..2 {
        for y in 0..2 {
            for x in 0..2 {
                tags.push(([3 + x, 1 + y, 1 + z], 1.0));
            }
        }
    }
    tags
}

struct RankResult {
    rank: usize,
    local_count: usize,
    map: GlobalSurfaceMap,
    coords: Vec<[usize; 3]>,
    inv: ndarray::Array2<f64>,
}

fn run_partitioned() -> Vec<RankResult> {
    let tags = straddling_cube();
    LocalCluster::run(2, move |comm| {
        let (objects, _solver, _rho, _phi, domain) =
            build_distributed(&comm, GLOBAL, [2, 1, 1], &tags);
        RankResult {
            rank: comm.rank(),
            local_count: objects.surface().count(0),
            map: objects.surface_maps()[0].clone(),
            coords: surface_global_coords(&objects, &domain, 0),
            inv: objects.capacitance(0).inv.clone(),
        }
    })
}

#[test]
fn surface_split_is_consistent_across_ranks() {
    let results = run_partitioned();
    let total: usize = results.iter().map(|r| r.local_count).sum();

    for r in &results {
        // Every rank agrees on the split and on the total.
        assert_eq!(r.map.total(), total);
        assert_eq!(r.map.range_of(r.rank).len(), r.local_count);
        assert_eq!(r.coords.len(), r.local_count);
    }
    assert_eq!(results[0].map, results[1].map);

    // The straddling cube leaves surface nodes on both sides.
    assert!(results[0].local_count > 0);
    assert!(results[1].local_count > 0);
}

#[test]
fn partitioned_matrix_matches_the_serial_reference() {
    let results = run_partitioned();

    // Serial reference on the same global grid.
    let serial_tags: Vec<([usize; 3], f64)> = straddling_cube()
        .iter()
        .map(|&([x, y, z], t)| ([x + 1, y + 1, z + 1], t))
        .collect();
    let serial = build_serial(GLOBAL, &serial_tags);
    let serial_coords = {
        let domain = sheath_grid::Domain::from_rank(0, [1, 1, 1]).unwrap();
        surface_global_coords(&serial.objects, &domain, 0)
    };
    let serial_inv = &serial.objects.capacitance(0).inv;

    let total = serial.objects.surface_total(0);
    assert_eq!(results[0].map.total(), total);

    // Global surface index (parallel ordering) → node coordinates.
    let mut parallel_coords = vec![[0usize; 3]; total];
    for r in &results {
        let range = r.map.range_of(r.rank);
        parallel_coords[range].copy_from_slice(&r.coords);
    }

    // Node coordinates → serial surface index.
    let serial_index: HashMap<[usize; 3], usize> = serial_coords
        .iter()
        .enumerate()
        .map(|(i, &c)| (c, i))
        .collect();

    // Both ranks hold the same completed inverse.
    for (i, j) in [(0usize, 0usize), (1, 2), (total - 1, 1)] {
        approx::assert_abs_diff_eq!(
            results[0].inv[[i, j]],
            results[1].inv[[i, j]],
            epsilon = 1e-12
        );
    }

    let scale = serial_inv.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    for m in 0..total {
        for n in 0..total {
            let sm = serial_index[&parallel_coords[m]];
            let sn = serial_index[&parallel_coords[n]];
            approx::assert_abs_diff_eq!(
                results[0].inv[[m, n]],
                serial_inv[[sm, sn]],
                epsilon = 1e-6 * scale
            );
        }
    }
}
