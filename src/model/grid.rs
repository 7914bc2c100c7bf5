//! Cells and the copy-on-write design grid.

use crate::model::mask::SilhouetteMask;
use crate::{Error, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::sync::Arc;

/// A `(patternId, colorId)` selection, serialized as `[patternId, colorId]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Cell {
    pub pattern_id: i32,
    pub color_id: i32,
}

impl Cell {
    /// Designable, nothing chosen yet
    pub const EMPTY: Cell = Cell {
        pattern_id: 0,
        color_id: 0,
    };

    /// Outside the silhouette
    pub const FORBIDDEN: Cell = Cell {
        pattern_id: -1,
        color_id: -1,
    };

    pub const fn new(pattern_id: i32, color_id: i32) -> Self {
        Self {
            pattern_id,
            color_id,
        }
    }

    pub fn is_forbidden(&self) -> bool {
        *self == Cell::FORBIDDEN
    }

    pub fn is_empty(&self) -> bool {
        *self == Cell::EMPTY
    }

    /// Both a pattern and a colour have been chosen.
    pub fn is_filled(&self) -> bool {
        self.pattern_id > 0 && self.color_id > 0
    }

    /// Values a designer may write: anything non-negative.
    fn is_writable_value(&self) -> bool {
        self.pattern_id >= 0 && self.color_id >= 0
    }
}

impl From<(i32, i32)> for Cell {
    fn from((pattern_id, color_id): (i32, i32)) -> Self {
        Cell::new(pattern_id, color_id)
    }
}

impl From<Cell> for (i32, i32) {
    fn from(c: Cell) -> Self {
        (c.pattern_id, c.color_id)
    }
}

/// A garment's design surface.
///
/// Rows are shared behind `Arc`s: cloning a grid is cheap, and a write
/// copies only the row it touches, so older snapshots never observe it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<Vec<Cell>>")]
pub struct Grid {
    width: usize,
    height: usize,
    rows: Vec<Arc<Vec<Cell>>>,
}

impl Grid {
    /// Fresh grid: `(0,0)` inside the silhouette, `(-1,-1)` outside.
    pub fn new(mask: &SilhouetteMask) -> Self {
        let rows = (0..mask.height())
            .map(|y| {
                let row = (0..mask.width())
                    .map(|x| {
                        if mask.is_forbidden(x, y) {
                            Cell::FORBIDDEN
                        } else {
                            Cell::EMPTY
                        }
                    })
                    .collect::<Vec<_>>();
                Arc::new(row)
            })
            .collect();
        Self {
            width: mask.width(),
            height: mask.height(),
            rows,
        }
    }

    /// Build from raw rows, checking shape and cell values only.
    ///
    /// Use [`crate::codec::decode_grid`] to also check the silhouette.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self> {
        let height = rows.len();
        if height == 0 {
            return Err(Error::MalformedGrid("grid has no rows".into()));
        }
        let width = rows[0].len();
        if width == 0 {
            return Err(Error::MalformedGrid("grid has empty rows".into()));
        }
        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(Error::MalformedGrid(format!(
                    "row {} has {} cells, expected {}",
                    y,
                    row.len(),
                    width
                )));
            }
            if let Some((x, c)) = row
                .iter()
                .enumerate()
                .find(|(_, c)| !c.is_forbidden() && !c.is_writable_value())
            {
                return Err(Error::MalformedGrid(format!(
                    "cell ({}, {}) holds invalid value [{}, {}]",
                    x, y, c.pattern_id, c.color_id
                )));
            }
        }
        Ok(Self {
            width,
            height,
            rows: rows.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, y: usize, x: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// Every cell as `(y, x, cell)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(y, row)| row.iter().enumerate().map(move |(x, c)| (y, x, *c)))
    }

    /// Replace the pair at `(y, x)`. The grid is untouched on error.
    pub fn set_cell(&mut self, y: usize, x: usize, pattern_id: i32, color_id: i32) -> Result<()> {
        let cell = Cell::new(pattern_id, color_id);
        self.check_writable(y, x, cell)?;
        let row = Arc::make_mut(&mut self.rows[y]);
        row[x] = cell;
        debug!("cell ({}, {}) <- [{}, {}]", x, y, pattern_id, color_id);
        Ok(())
    }

    /// Like [`Grid::set_cell`] but leaves `self` alone and returns the edited copy.
    pub fn with_cell(&self, y: usize, x: usize, pattern_id: i32, color_id: i32) -> Result<Grid> {
        let mut next = self.clone();
        next.set_cell(y, x, pattern_id, color_id)?;
        Ok(next)
    }

    fn check_writable(&self, y: usize, x: usize, cell: Cell) -> Result<()> {
        if y >= self.height || x >= self.width {
            warn!(
                "rejected write at ({}, {}) outside {}x{} grid",
                x, y, self.width, self.height
            );
            return Err(Error::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        if self.rows[y][x].is_forbidden() {
            warn!("rejected write to forbidden cell ({}, {})", x, y);
            return Err(Error::ForbiddenCellWrite { x, y });
        }
        if !cell.is_writable_value() {
            return Err(Error::InvalidCell {
                pattern_id: cell.pattern_id,
                color_id: cell.color_id,
            });
        }
        Ok(())
    }

    /// Forbidden layout agrees with `mask`, dimensions included.
    pub fn matches_mask(&self, mask: &SilhouetteMask) -> bool {
        self.width == mask.width()
            && self.height == mask.height()
            && self
                .cells()
                .all(|(y, x, c)| c.is_forbidden() == mask.is_forbidden(x, y))
    }

    /// Same dimensions and same forbidden cells as `other`.
    pub fn same_layout(&self, other: &Grid) -> bool {
        self.width == other.width
            && self.height == other.height
            && self
                .cells()
                .zip(other.cells())
                .all(|((_, _, a), (_, _, b))| a.is_forbidden() == b.is_forbidden())
    }

    /// Most used filled pair; ties go to the pair seen first in row-major order.
    pub fn dominant_fill(&self) -> Option<Cell> {
        let mut counts: HashMap<Cell, usize> = HashMap::new();
        let mut order = Vec::new();
        for (_, _, c) in self.cells().filter(|(_, _, c)| c.is_filled()) {
            let n = counts.entry(c).or_insert(0);
            if *n == 0 {
                order.push(c);
            }
            *n += 1;
        }
        let mut best: Option<(Cell, usize)> = None;
        for c in order {
            let n = counts[&c];
            if best.map_or(true, |(_, b)| n > b) {
                best = Some((c, n));
            }
        }
        best.map(|(c, _)| c)
    }
}

impl TryFrom<Vec<Vec<Cell>>> for Grid {
    type Error = Error;

    fn try_from(rows: Vec<Vec<Cell>>) -> Result<Self> {
        Grid::from_rows(rows)
    }
}

impl Serialize for Grid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows.iter().map(|r| r.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mask::SilhouetteTable;

    fn shirt() -> Grid {
        Grid::new(&SilhouetteMask::generate(19, 13, &SilhouetteTable::default()).unwrap())
    }

    #[test]
    fn fresh_grid_uses_sentinels() {
        let g = shirt();
        assert_eq!(g.get(0, 0), Some(Cell::EMPTY));
        assert_eq!(g.get(0, 9), Some(Cell::FORBIDDEN));
        assert_eq!(g.get(13, 0), None);
        assert_eq!(g.cells().count(), 19 * 13);
    }

    #[test]
    fn set_cell_copies_only_touched_row() {
        let before = shirt();
        let mut after = before.clone();
        after.set_cell(5, 6, 2, 3).unwrap();
        assert_eq!(after.get(5, 6), Some(Cell::new(2, 3)));
        assert_eq!(before.get(5, 6), Some(Cell::EMPTY));
        assert!(Arc::ptr_eq(&before.rows[4], &after.rows[4]));
        assert!(!Arc::ptr_eq(&before.rows[5], &after.rows[5]));
    }

    #[test]
    fn rejected_writes_leave_grid_alone() {
        let mut g = shirt();
        let snapshot = g.clone();
        assert!(matches!(
            g.set_cell(0, 8, 1, 1),
            Err(Error::ForbiddenCellWrite { x: 8, y: 0 })
        ));
        assert!(matches!(
            g.set_cell(13, 0, 1, 1),
            Err(Error::OutOfBounds { .. })
        ));
        assert!(matches!(
            g.set_cell(0, 0, -1, -1),
            Err(Error::InvalidCell { .. })
        ));
        assert_eq!(g, snapshot);
    }

    #[test]
    fn partial_selection_is_not_filled() {
        assert!(!Cell::new(3, 0).is_filled());
        assert!(Cell::new(3, 1).is_filled());
        assert!(!Cell::FORBIDDEN.is_filled());
    }

    #[test]
    fn dominant_fill_prefers_count_then_first_seen() {
        let mut g = shirt();
        assert_eq!(g.dominant_fill(), None);
        g.set_cell(0, 0, 2, 2).unwrap();
        g.set_cell(0, 1, 1, 3).unwrap();
        assert_eq!(g.dominant_fill(), Some(Cell::new(2, 2)));
        g.set_cell(1, 0, 1, 3).unwrap();
        assert_eq!(g.dominant_fill(), Some(Cell::new(1, 3)));
    }

    #[test]
    fn ragged_rows_are_malformed() {
        let rows = vec![vec![Cell::EMPTY; 3], vec![Cell::EMPTY; 2]];
        assert!(matches!(Grid::from_rows(rows), Err(Error::MalformedGrid(_))));
    }
}
