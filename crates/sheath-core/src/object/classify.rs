//! Node classification: interior, surface, and sun-exposed lookup tables.
//!
//! All three tables share one layout: a concatenated index array plus an
//! offset table, so object `a`'s block is `indices[offsets[a]..offsets[a+1]]`.
//! Each table is built in two passes — count to size the blocks, prefix-sum
//! the offsets, then fill — and the fill traversal repeats the counting
//! traversal, so indices within a block are in ascending scan order. That
//! ordering is load-bearing: the capacitance matrices are indexed by it.

use sheath_grid::Grid3;

use crate::error::CoreError;
use crate::object::map::{has_tag, tag_of};

/// Concatenated per-object node-index lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    offsets: Vec<usize>,
    indices: Vec<usize>,
}

impl Lookup {
    fn from_counts(mut offsets: Vec<usize>) -> (Self, Vec<usize>) {
        // offsets[a+1] currently holds object a's count; prefix-sum in place.
        for a in 1..offsets.len() {
            offsets[a] += offsets[a - 1];
        }
        let cursors = offsets[..offsets.len() - 1].to_vec();
        let total = *offsets.last().unwrap();
        (
            Self {
                offsets,
                indices: vec![0; total],
            },
            cursors,
        )
    }

    /// Number of objects the table covers.
    pub fn n_objects(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Node indices of object `a` (0-based object numbering).
    pub fn object(&self, a: usize) -> &[usize] {
        &self.indices[self.offsets[a]..self.offsets[a + 1]]
    }

    /// Nodes of object `a` owned by this table.
    pub fn count(&self, a: usize) -> usize {
        self.offsets[a + 1] - self.offsets[a]
    }

    /// Total entries across all objects.
    pub fn total(&self) -> usize {
        *self.offsets.last().unwrap()
    }

    /// Whether `idx` is listed for object `a`. Blocks are in ascending scan
    /// order, so membership is a binary search.
    pub fn contains(&self, a: usize, idx: usize) -> bool {
        self.object(a).binary_search(&idx).is_ok()
    }
}

/// Enumerate every node whose tag matches each object, ghosts included.
///
/// Interior entries are purely local; nodes mirrored into a neighbour's
/// ghost band are listed on both ranks, which is what the impact collector
/// wants (a particle is attributed wherever its cell is resolved).
pub fn interior_lookup(map: &Grid3, n_objects: usize) -> Lookup {
    let mut counts = vec![0usize; n_objects + 1];
    for &v in map.values() {
        let tag = tag_of(v);
        if tag >= 1 {
            counts[tag] += 1;
        }
    }
    let (mut lookup, mut cursors) = Lookup::from_counts(counts);
    for (idx, &v) in map.values().iter().enumerate() {
        let tag = tag_of(v);
        if tag >= 1 {
            lookup.indices[cursors[tag - 1]] = idx;
            cursors[tag - 1] += 1;
        }
    }
    lookup
}

/// Linear offsets of the eight cell corners *below-and-including* a node:
/// `idx − {0,sx}⊕{0,sy}⊕{0,sz}`.
#[inline]
fn lower_corner_offsets(map: &Grid3) -> [usize; 8] {
    let (sx, sy, sz) = (map.stride(0), map.stride(1), map.stride(2));
    [
        0,
        sz,
        sx,
        sx + sz,
        sy,
        sy + sz,
        sy + sx,
        sy + sx + sz,
    ]
}

/// Whether non-ghost node `idx` lies on the surface of object `a`:
/// of the eight samples below-and-including, at least one and at most
/// seven carry the object's tag.
///
/// The stencil is asymmetric on purpose and is part of the numerical
/// contract — the capacitance matrices are conditioned on exactly this
/// node set, and a symmetric 27-point variant yields a different matrix.
#[inline]
fn is_surface_node(map: &Grid3, offsets: &[usize; 8], idx: usize, a: usize) -> bool {
    let mut d = 0;
    for &off in offsets {
        if has_tag(map[idx - off], a) {
            d += 1;
        }
    }
    d > 0 && d < 8
}

/// Enumerate the surface nodes of each object.
///
/// Candidates are all non-ghost nodes; with at least one ghost layer the
/// eight samples of the criterion never leave the local array.
pub fn surface_lookup(map: &Grid3, n_objects: usize) -> Result<Lookup, CoreError> {
    let offsets = lower_corner_offsets(map);

    let mut counts = vec![0usize; n_objects + 1];
    for a in 1..=n_objects {
        for idx in 0..map.len() {
            if !map.is_ghost(idx) && is_surface_node(map, &offsets, idx, a) {
                counts[a] += 1;
            }
        }
    }

    let (mut lookup, mut cursors) = Lookup::from_counts(counts);
    for a in 1..=n_objects {
        for idx in 0..map.len() {
            if !map.is_ghost(idx) && is_surface_node(map, &offsets, idx, a) {
                lookup.indices[cursors[a - 1]] = idx;
                cursors[a - 1] += 1;
            }
        }
    }

    for a in 0..n_objects {
        for &idx in lookup.object(a) {
            if map.is_ghost(idx) {
                return Err(CoreError::Internal(format!(
                    "ghost node {idx} leaked into the surface table of object {}",
                    a + 1
                )));
            }
        }
    }
    Ok(lookup)
}

/// Enumerate, for each object, the sun-facing exposed surface nodes: the
/// first surface node met when scanning each `(y, z)` column in `+x`, the
/// direction of unobstructed sunlight.
pub fn exposed_lookup(map: &Grid3, surface: &Lookup) -> Lookup {
    let n_objects = surface.n_objects();
    let size = map.size();

    let scan = |a: usize, hit: &mut dyn FnMut(usize)| {
        for z in 0..size[2] {
            for y in 0..size[1] {
                for x in 0..size[0] {
                    let idx = map.index(x, y, z);
                    if !map.is_ghost(idx) && surface.contains(a, idx) {
                        hit(idx);
                        break;
                    }
                }
            }
        }
    };

    let mut counts = vec![0usize; n_objects + 1];
    for a in 0..n_objects {
        scan(a, &mut |_| counts[a + 1] += 1);
    }
    let (mut lookup, mut cursors) = Lookup::from_counts(counts);
    for a in 0..n_objects {
        scan(a, &mut |idx| {
            lookup.indices[cursors[a]] = idx;
            cursors[a] += 1;
        });
    }
    lookup
}
