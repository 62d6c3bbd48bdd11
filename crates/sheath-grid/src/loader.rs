//! Plain-text scalar field files.
//!
//! The on-disk format is deliberately minimal: an optional run of `#`
//! comment lines, a header `nx ny nz` with the *global* true extents, then
//! `nx·ny·nz` whitespace-separated reals in x-fastest order. Every rank
//! reads the whole file and copies out its own subdomain; ghost layers are
//! left untouched for the caller's halo exchange to fill.

use std::fs;
use std::path::Path;

use crate::{Domain, Grid3, GridError};

/// A scalar field over the global true grid, as read from disk.
#[derive(Debug, Clone)]
pub struct GlobalField {
    pub size: [usize; 3],
    pub values: Vec<f64>,
}

impl GlobalField {
    #[inline]
    pub fn at(&self, x: usize, y: usize, z: usize) -> f64 {
        self.values[x + y * self.size[0] + z * self.size[0] * self.size[1]]
    }
}

/// Parse a scalar field file.
pub fn read_scalar_field(path: &Path) -> Result<GlobalField, GridError> {
    let text = fs::read_to_string(path)?;
    let display = path.display().to_string();

    let mut tokens = Vec::new();
    let mut token_lines = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        for tok in line.split_whitespace() {
            tokens.push(tok);
            token_lines.push(lineno + 1);
        }
    }

    if tokens.len() < 3 {
        return Err(GridError::Parse {
            path: display,
            line: 1,
            msg: "missing `nx ny nz` header".into(),
        });
    }

    let mut size = [0usize; 3];
    for d in 0..3 {
        size[d] = tokens[d].parse().map_err(|_| GridError::Parse {
            path: display.clone(),
            line: token_lines[d],
            msg: format!("bad extent {:?}", tokens[d]),
        })?;
    }

    let expected = size[0] * size[1] * size[2];
    let body = &tokens[3..];
    if body.len() != expected {
        return Err(GridError::Parse {
            path: display,
            line: *token_lines.last().unwrap_or(&1),
            msg: format!("expected {expected} values, found {}", body.len()),
        });
    }

    let mut values = Vec::with_capacity(expected);
    for (tok, &line) in body.iter().zip(&token_lines[3..]) {
        values.push(tok.parse::<f64>().map_err(|_| GridError::Parse {
            path: display.clone(),
            line,
            msg: format!("bad value {tok:?}"),
        })?);
    }

    Ok(GlobalField { size, values })
}

/// Extract this rank's subdomain of `field` into a fresh grid with
/// `n_ghost` ghost layers. Fails when the field does not tile the
/// decomposition or disagrees with `global_size`.
pub fn extract_subdomain(
    field: &GlobalField,
    global_size: [usize; 3],
    domain: &Domain,
    n_ghost: usize,
) -> Result<Grid3, GridError> {
    if field.size != global_size {
        return Err(GridError::ShapeMismatch {
            expected: global_size,
            found: field.size,
        });
    }
    let local = domain.local_true_size(global_size)?;
    let offset = domain.global_offset(local);

    let mut grid = Grid3::new(local, n_ghost);
    for z in 0..local[2] {
        for y in 0..local[1] {
            for x in 0..local[0] {
                let idx = grid.index(x + n_ghost, y + n_ghost, z + n_ghost);
                grid[idx] = field.at(offset[0] + x, offset[1] + y, offset[2] + z);
            }
        }
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "sheath-field-{}-{:p}.txt",
            std::process::id(),
            contents.as_ptr()
        ));
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_header_comments_and_values() {
        let path = write_temp("# tag field\n2 1 1\n0.0 1.0\n");
        let field = read_scalar_field(&path).unwrap();
        assert_eq!(field.size, [2, 1, 1]);
        assert_eq!(field.at(1, 0, 0), 1.0);
        fs::remove_file(path).ok();
    }

    #[test]
    fn rejects_wrong_value_count() {
        let path = write_temp("2 2 1\n0.0 1.0 2.0\n");
        assert!(matches!(
            read_scalar_field(&path),
            Err(GridError::Parse { .. })
        ));
        fs::remove_file(path).ok();
    }

    #[test]
    fn subdomain_extraction_respects_offsets() {
        let field = GlobalField {
            size: [4, 2, 2],
            values: (0..16).map(|v| v as f64).collect(),
        };
        let domain = Domain::from_rank(1, [2, 1, 1]).unwrap();
        let grid = extract_subdomain(&field, [4, 2, 2], &domain, 1).unwrap();
        assert_eq!(grid.true_size(), [2, 2, 2]);
        // Global node (2, 0, 0) lands at local (1, 1, 1) with one ghost layer.
        assert_eq!(grid[grid.index(1, 1, 1)], 2.0);
        assert_eq!(grid[grid.index(2, 2, 2)], 15.0);
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let field = GlobalField {
            size: [2, 2, 2],
            values: vec![0.0; 8],
        };
        let domain = Domain::from_rank(0, [1, 1, 1]).unwrap();
        assert!(matches!(
            extract_subdomain(&field, [4, 2, 2], &domain, 1),
            Err(GridError::ShapeMismatch { .. })
        ));
    }
}
