//! Lookup-table invariants and the tag-field round trip.
//!
//! The interior table must list exactly the tagged nodes, so rebuilding a
//! tag field from the table reproduces the input; the surface table must
//! contain only owned nodes, in ascending scan order, independent of how
//! the object was specified.

mod common;

use sheath_core::object::classify::{interior_lookup, surface_lookup};
use sheath_core::object::map::tag_of;
use sheath_grid::Grid3;

use common::grid_with_tags;

fn cube(origin: [usize; 3], extent: usize, tag: f64) -> Vec<([usize; 3], f64)> {
    let mut tags = Vec::new();
    for z in 0..extent {
        for y in 0..extent {
            for x in 0..extent {
                tags.push(([origin[0] + x, origin[1] + y, origin[2] + z], tag));
            }
        }
    }
    tags
}

#[test]
fn tag_field_round_trips_through_the_interior_table() {
    let mut tags = cube([2, 2, 2], 2, 1.0);
    tags.extend(cube([5, 5, 5], 2, 2.0));
    let map = grid_with_tags([6, 6, 6], &tags);

    let interior = interior_lookup(&map, 2);

    let mut rebuilt = Grid3::new([6, 6, 6], 1);
    for a in 0..2 {
        for &idx in interior.object(a) {
            rebuilt[idx] = (a + 1) as f64;
        }
    }

    for idx in 0..map.len() {
        assert_eq!(
            tag_of(rebuilt[idx]),
            tag_of(map[idx]),
            "node {idx} changed tag in the round trip"
        );
    }
}

#[test]
fn surface_entries_are_owned_tagged_neighbourhood_nodes_in_order() {
    let map = grid_with_tags([6, 6, 6], &cube([2, 2, 2], 2, 1.0));
    let surface = surface_lookup(&map, 1).unwrap();

    let nodes = surface.object(0);
    assert!(!nodes.is_empty());
    assert!(
        nodes.windows(2).all(|w| w[0] < w[1]),
        "surface indices must be in ascending scan order"
    );
    for &idx in nodes {
        assert!(!map.is_ghost(idx), "ghost node {idx} in surface table");
    }
}

#[test]
fn surface_count_is_independent_of_tag_listing_order() {
    let mut forward = cube([2, 2, 2], 2, 1.0);
    let mut reversed = forward.clone();
    reversed.reverse();
    forward.sort_by_key(|&([x, y, z], _)| (z, y, x));

    let surf_a = surface_lookup(&grid_with_tags([6, 6, 6], &forward), 1).unwrap();
    let surf_b = surface_lookup(&grid_with_tags([6, 6, 6], &reversed), 1).unwrap();
    assert_eq!(surf_a.object(0), surf_b.object(0));
}

#[test]
fn a_central_cube_has_the_asymmetric_stencil_surface_count() {
    // A 2³ tagged block: every node whose eight lower samples meet the
    // block qualifies except the single node that sees all eight tagged,
    // giving 3³ − 1 surface nodes.
    let map = grid_with_tags([6, 6, 6], &cube([2, 2, 2], 2, 1.0));
    let surface = surface_lookup(&map, 1).unwrap();
    assert_eq!(surface.count(0), 26);
    assert!(!surface.contains(0, map.index(3, 3, 3)));
}

#[test]
fn disjoint_objects_get_disjoint_tables() {
    let mut tags = cube([2, 2, 2], 2, 1.0);
    tags.extend(cube([5, 5, 5], 2, 2.0));
    let map = grid_with_tags([6, 6, 6], &tags);

    let interior = interior_lookup(&map, 2);
    let surface = surface_lookup(&map, 2).unwrap();

    assert_eq!(interior.count(0), 8);
    assert_eq!(interior.count(1), 8);
    for &idx in surface.object(0) {
        assert!(!surface.contains(1, idx));
    }
}
