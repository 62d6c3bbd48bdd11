//! Cartesian decomposition of the global grid over ranks.

use crate::GridError;

/// Which side of an axis a face or neighbour lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Lower,
    Upper,
}

/// This rank's position in a dense `nx × ny × nz` grid of subdomains.
///
/// Ranks are laid out x-fastest: `rank = cx + cy·nx + cz·nx·ny`. The
/// topology is a grounded box, not a torus: a face with no neighbour is a
/// global boundary and takes the solver's boundary condition instead of a
/// halo exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domain {
    n_subdomains: [usize; 3],
    coords: [usize; 3],
}

impl Domain {
    /// Decompose for `rank` of a world with `n_subdomains` per axis.
    pub fn from_rank(rank: usize, n_subdomains: [usize; 3]) -> Result<Self, GridError> {
        let total: usize = n_subdomains.iter().product();
        if total == 0 {
            return Err(GridError::Decomposition(
                "subdomain counts must be positive".into(),
            ));
        }
        if rank >= total {
            return Err(GridError::Decomposition(format!(
                "rank {rank} outside a {n_subdomains:?} decomposition"
            )));
        }
        let coords = [
            rank % n_subdomains[0],
            (rank / n_subdomains[0]) % n_subdomains[1],
            rank / (n_subdomains[0] * n_subdomains[1]),
        ];
        Ok(Self {
            n_subdomains,
            coords,
        })
    }

    /// Number of ranks in the decomposition.
    pub fn n_ranks(&self) -> usize {
        self.n_subdomains.iter().product()
    }

    pub fn n_subdomains(&self) -> [usize; 3] {
        self.n_subdomains
    }

    /// This rank's subdomain coordinates.
    pub fn coords(&self) -> [usize; 3] {
        self.coords
    }

    /// Rank of the subdomain at `coords`.
    pub fn rank_of(&self, coords: [usize; 3]) -> usize {
        coords[0]
            + coords[1] * self.n_subdomains[0]
            + coords[2] * self.n_subdomains[0] * self.n_subdomains[1]
    }

    /// The neighbouring rank across face (`axis`, `side`), or `None` at a
    /// global boundary.
    pub fn neighbor(&self, axis: usize, side: Side) -> Option<usize> {
        let mut c = self.coords;
        match side {
            Side::Lower => {
                if c[axis] == 0 {
                    return None;
                }
                c[axis] -= 1;
            }
            Side::Upper => {
                if c[axis] + 1 == self.n_subdomains[axis] {
                    return None;
                }
                c[axis] += 1;
            }
        }
        Some(self.rank_of(c))
    }

    /// Split a global true size evenly across the decomposition.
    ///
    /// Fails unless every axis divides exactly; uneven splits would break
    /// the rank-symmetric surface ordering the capacitance store relies on.
    pub fn local_true_size(&self, global: [usize; 3]) -> Result<[usize; 3], GridError> {
        let mut local = [0usize; 3];
        for d in 0..3 {
            if global[d] == 0 || global[d] % self.n_subdomains[d] != 0 {
                return Err(GridError::Decomposition(format!(
                    "global size {:?} not divisible by subdomains {:?}",
                    global, self.n_subdomains
                )));
            }
            local[d] = global[d] / self.n_subdomains[d];
        }
        Ok(local)
    }

    /// Offset of this rank's first owned node in global true coordinates.
    pub fn global_offset(&self, local_true_size: [usize; 3]) -> [usize; 3] {
        [
            self.coords[0] * local_true_size[0],
            self.coords[1] * local_true_size[1],
            self.coords[2] * local_true_size[2],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_coordinates_round_trip() {
        let n = [2, 3, 2];
        for rank in 0..12 {
            let d = Domain::from_rank(rank, n).unwrap();
            assert_eq!(d.rank_of(d.coords()), rank);
        }
        assert!(Domain::from_rank(12, n).is_err());
    }

    #[test]
    fn neighbors_stop_at_global_boundaries() {
        let d = Domain::from_rank(0, [2, 1, 1]).unwrap();
        assert_eq!(d.neighbor(0, Side::Lower), None);
        assert_eq!(d.neighbor(0, Side::Upper), Some(1));
        assert_eq!(d.neighbor(1, Side::Lower), None);
        assert_eq!(d.neighbor(1, Side::Upper), None);

        let d1 = Domain::from_rank(1, [2, 1, 1]).unwrap();
        assert_eq!(d1.neighbor(0, Side::Lower), Some(0));
        assert_eq!(d1.neighbor(0, Side::Upper), None);
    }

    #[test]
    fn local_sizes_must_divide() {
        let d = Domain::from_rank(0, [2, 1, 1]).unwrap();
        assert_eq!(d.local_true_size([8, 4, 4]).unwrap(), [4, 4, 4]);
        assert!(d.local_true_size([9, 4, 4]).is_err());
        let d1 = Domain::from_rank(1, [2, 1, 1]).unwrap();
        assert_eq!(d1.global_offset([4, 4, 4]), [4, 0, 0]);
    }
}
