//! JSON boundary for persisted grids (`Cell[][]`, row-major).

use crate::model::grid::Grid;
use crate::model::mask::{check_dimensions, SilhouetteMask, SilhouetteTable};
use crate::{Error, Result};
use sha2::{Digest, Sha256};

/// Compact JSON, written back verbatim by the persistence layer.
pub fn encode_grid(grid: &Grid) -> Result<String> {
    serde_json::to_string(grid).map_err(|e| Error::MalformedGrid(e.to_string()))
}

/// Hydrate a grid and check it against the mask it was created from.
pub fn decode_grid(json: &str, mask: &SilhouetteMask) -> Result<Grid> {
    let grid = parse(json)?;
    check_against_mask(&grid, mask)?;
    Ok(grid)
}

/// Hydrate a grid whose size is only known from the document itself.
pub fn decode_with_table(json: &str, table: &SilhouetteTable) -> Result<Grid> {
    let grid = parse(json)?;
    validate_layout(&grid, table)?;
    Ok(grid)
}

fn parse(json: &str) -> Result<Grid> {
    serde_json::from_str(json).map_err(|e| Error::MalformedGrid(e.to_string()))
}

/// Check an already-deserialized grid against the mask for its own size.
pub fn validate_layout(grid: &Grid, table: &SilhouetteTable) -> Result<()> {
    check_dimensions(grid.width(), grid.height())
        .map_err(|e| Error::MalformedGrid(e.to_string()))?;
    let mask = SilhouetteMask::generate(grid.width(), grid.height(), table)?;
    check_against_mask(grid, &mask)
}

fn check_against_mask(grid: &Grid, mask: &SilhouetteMask) -> Result<()> {
    if grid.width() != mask.width() || grid.height() != mask.height() {
        return Err(Error::MalformedGrid(format!(
            "expected {}x{} grid, found {}x{}",
            mask.width(),
            mask.height(),
            grid.width(),
            grid.height()
        )));
    }
    if let Some((y, x, c)) = grid
        .cells()
        .find(|(y, x, c)| c.is_forbidden() != mask.is_forbidden(*x, *y))
    {
        return Err(Error::MalformedGrid(format!(
            "cell ({}, {}) = [{}, {}] disagrees with the silhouette",
            x, y, c.pattern_id, c.color_id
        )));
    }
    Ok(())
}

/// Lowercase hex SHA-256 of the compact encoding; used as the save version.
pub fn grid_digest(grid: &Grid) -> Result<String> {
    let bytes = serde_json::to_vec(grid).map_err(|e| Error::MalformedGrid(e.to_string()))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::grid::Cell;

    fn mask() -> SilhouetteMask {
        SilhouetteMask::generate(19, 13, &SilhouetteTable::default()).unwrap()
    }

    #[test]
    fn encoding_is_nested_pairs() {
        let m = SilhouetteMask::generate(2, 1, &SilhouetteTable::empty()).unwrap();
        let g = Grid::new(&m);
        let json = encode_grid(&g).unwrap();
        assert!(json.starts_with("[["));
        assert!(json.contains("[-1,-1]") || json.contains("[0,0]"));
    }

    #[test]
    fn decode_rejects_dimension_mismatch() {
        let small = SilhouetteMask::generate(10, 10, &SilhouetteTable::default()).unwrap();
        let json = encode_grid(&Grid::new(&small)).unwrap();
        let err = decode_grid(&json, &mask()).unwrap_err();
        assert!(matches!(err, Error::MalformedGrid(_)));
    }

    #[test]
    fn decode_rejects_moved_forbidden_cell() {
        let mut rows: Vec<Vec<Cell>> = Grid::new(&mask()).rows().map(|r| r.to_vec()).collect();
        rows[0][9] = Cell::EMPTY;
        let json = serde_json::to_string(&rows).unwrap();
        assert!(matches!(
            decode_grid(&json, &mask()),
            Err(Error::MalformedGrid(_))
        ));
    }

    #[test]
    fn decode_rejects_bad_cells() {
        for json in ["[[[1]]]", "[[[1,2,3]]]", "[[\"x\"]]", "{}", "[[[1.5,2]]]"] {
            assert!(
                matches!(decode_with_table(json, &SilhouetteTable::empty()), Err(Error::MalformedGrid(_))),
                "accepted {}",
                json
            );
        }
    }

    #[test]
    fn digest_tracks_content() {
        let g = Grid::new(&mask());
        let a = grid_digest(&g).unwrap();
        assert_eq!(a.len(), 64);
        assert_eq!(a, grid_digest(&g.clone()).unwrap());
        let edited = g.with_cell(5, 5, 1, 1).unwrap();
        assert_ne!(a, grid_digest(&edited).unwrap());
    }
}
