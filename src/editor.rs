//! Designer session over one grid: brush selection, painting and undo/redo.
//!
//! Every edit goes through [`Grid::with_cell`], so each history entry is an
//! independent snapshot that shares untouched rows with its neighbours.

use crate::assets::AssetLookup;
use crate::model::{Cell, Grid};
use crate::{Error, GridConfig, Result};
use log::debug;
use std::collections::VecDeque;
use std::sync::Arc;

/// Per-user placement allowance when quotas are enabled.
pub const DEFAULT_PLACEMENT_QUOTA: u32 = 3;

/// Undo steps kept per session; older steps are dropped.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Current pattern/colour selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Brush {
    pub pattern_id: Option<i32>,
    pub color_id: Option<i32>,
}

impl Brush {
    fn cell(&self) -> Result<Cell> {
        match (self.pattern_id, self.color_id) {
            (Some(p), Some(c)) => Ok(Cell::new(p, c)),
            (p, c) => Err(Error::InvalidCell {
                pattern_id: p.unwrap_or(0),
                color_id: c.unwrap_or(0),
            }),
        }
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    grid: Grid,
    placements: u32,
}

pub struct EditorSession {
    grid: Grid,
    saved: Grid,
    brush: Brush,
    assets: Arc<dyn AssetLookup>,
    quota: Option<u32>,
    placements: u32,
    history_limit: usize,
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
}

impl EditorSession {
    pub fn new(grid: Grid, assets: Arc<dyn AssetLookup>) -> Self {
        Self {
            saved: grid.clone(),
            grid,
            brush: Brush::default(),
            assets,
            quota: None,
            placements: 0,
            history_limit: DEFAULT_HISTORY_LIMIT,
            undo: VecDeque::new(),
            redo: Vec::new(),
        }
    }

    /// Session using the placement quota and history limit from `config`.
    pub fn for_config(grid: Grid, assets: Arc<dyn AssetLookup>, config: &GridConfig) -> Self {
        let session = Self::new(grid, assets).with_history_limit(config.history_limit);
        match config.placement_quota {
            Some(q) => session.with_quota(q),
            None => session,
        }
    }

    /// Limit how many unfilled cells this session may paint.
    pub fn with_quota(mut self, quota: u32) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Keep at most `limit` undo steps.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self.undo.truncate(limit);
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn brush(&self) -> Brush {
        self.brush
    }

    /// Placements left, or `None` when unlimited.
    pub fn remaining_placements(&self) -> Option<u32> {
        self.quota.map(|q| q.saturating_sub(self.placements))
    }

    pub fn select_pattern(&mut self, id: i32) -> Result<()> {
        if self.assets.pattern(id).is_none() {
            return Err(Error::UnknownPattern(id));
        }
        self.brush.pattern_id = Some(id);
        Ok(())
    }

    pub fn select_color(&mut self, id: i32) -> Result<()> {
        if self.assets.color(id).is_none() {
            return Err(Error::UnknownColor(id));
        }
        self.brush.color_id = Some(id);
        Ok(())
    }

    /// Apply the brush at `(y, x)`.
    pub fn paint(&mut self, y: usize, x: usize) -> Result<()> {
        let cell = self.brush.cell()?;
        let consumes = self
            .grid
            .get(y, x)
            .map_or(false, |c| !c.is_forbidden() && !c.is_filled());
        if consumes {
            if let Some(q) = self.quota {
                if self.placements >= q {
                    return Err(Error::QuotaExhausted(q));
                }
            }
        }
        let next = self.grid.with_cell(y, x, cell.pattern_id, cell.color_id)?;
        let placements = if consumes {
            self.placements + 1
        } else {
            self.placements
        };
        self.commit(next, placements);
        Ok(())
    }

    /// Reset `(y, x)` to the empty sentinel.
    pub fn erase(&mut self, y: usize, x: usize) -> Result<()> {
        let next = self.grid.with_cell(y, x, 0, 0)?;
        self.commit(next, self.placements);
        Ok(())
    }

    fn commit(&mut self, next: Grid, placements: u32) {
        if next == self.grid {
            return;
        }
        let prev = std::mem::replace(&mut self.grid, next);
        self.push_undo(Snapshot {
            grid: prev,
            placements: self.placements,
        });
        self.placements = placements;
        self.redo.clear();
    }

    fn push_undo(&mut self, s: Snapshot) {
        if self.history_limit == 0 {
            return;
        }
        if self.undo.len() == self.history_limit {
            self.undo.pop_front();
        }
        self.undo.push_back(s);
    }

    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.undo.pop_back() {
            Some(s) => {
                let current = self.swap_in(s);
                self.redo.push(current);
                debug!("undo, {} steps left", self.undo.len());
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.redo.pop() {
            Some(s) => {
                let current = self.swap_in(s);
                self.push_undo(current);
                true
            }
            None => false,
        }
    }

    fn swap_in(&mut self, s: Snapshot) -> Snapshot {
        let grid = std::mem::replace(&mut self.grid, s.grid);
        let placements = std::mem::replace(&mut self.placements, s.placements);
        Snapshot { grid, placements }
    }

    /// Edited since the last [`EditorSession::mark_saved`].
    pub fn is_dirty(&self) -> bool {
        self.grid != self.saved
    }

    pub fn mark_saved(&mut self) {
        self.saved = self.grid.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::StaticAssets;
    use crate::model::{SilhouetteMask, SilhouetteTable};

    fn session() -> EditorSession {
        let mask = SilhouetteMask::generate(19, 13, &SilhouetteTable::default()).unwrap();
        let mut s = EditorSession::new(Grid::new(&mask), Arc::new(StaticAssets::with_defaults()));
        s.select_pattern(1).unwrap();
        s.select_color(2).unwrap();
        s
    }

    #[test]
    fn paint_requires_complete_brush() {
        let mask = SilhouetteMask::generate(19, 13, &SilhouetteTable::default()).unwrap();
        let mut s = EditorSession::new(Grid::new(&mask), Arc::new(StaticAssets::with_defaults()));
        s.select_pattern(1).unwrap();
        assert!(matches!(s.paint(0, 0), Err(Error::InvalidCell { .. })));
        assert!(!s.is_dirty());
    }

    #[test]
    fn unknown_assets_are_rejected() {
        let mut s = session();
        assert!(matches!(s.select_pattern(42), Err(Error::UnknownPattern(42))));
        assert!(matches!(s.select_color(0), Err(Error::UnknownColor(0))));
        assert_eq!(s.brush().pattern_id, Some(1));
    }

    #[test]
    fn undo_redo_walk_history() {
        let mut s = session();
        s.paint(0, 0).unwrap();
        s.paint(0, 1).unwrap();
        assert!(s.is_dirty());
        assert!(s.undo());
        assert_eq!(s.grid().get(0, 1), Some(Cell::EMPTY));
        assert_eq!(s.grid().get(0, 0), Some(Cell::new(1, 2)));
        assert!(s.redo());
        assert_eq!(s.grid().get(0, 1), Some(Cell::new(1, 2)));
        assert!(!s.redo());
        s.mark_saved();
        assert!(!s.is_dirty());
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut s = session();
        s.paint(0, 0).unwrap();
        s.undo();
        s.paint(1, 1).unwrap();
        assert!(!s.redo());
    }

    #[test]
    fn forbidden_paint_is_not_recorded() {
        let mut s = session();
        assert!(matches!(s.paint(0, 9), Err(Error::ForbiddenCellWrite { .. })));
        assert!(!s.undo());
    }

    #[test]
    fn quota_counts_new_cells_and_refunds_on_undo() {
        let mut s = session().with_quota(DEFAULT_PLACEMENT_QUOTA);
        s.paint(0, 0).unwrap();
        s.paint(0, 1).unwrap();
        s.paint(0, 2).unwrap();
        assert_eq!(s.remaining_placements(), Some(0));
        assert!(matches!(s.paint(0, 3), Err(Error::QuotaExhausted(3))));
        // repainting a filled cell is free
        s.select_color(3).unwrap();
        s.paint(0, 0).unwrap();
        assert_eq!(s.grid().get(0, 0), Some(Cell::new(1, 3)));
        s.undo();
        s.undo();
        assert_eq!(s.remaining_placements(), Some(1));
        s.paint(0, 3).unwrap();
    }

    #[test]
    fn config_quota_is_applied() {
        let config = GridConfig {
            placement_quota: Some(DEFAULT_PLACEMENT_QUOTA),
            ..Default::default()
        };
        let s = EditorSession::for_config(
            config.new_grid().unwrap(),
            Arc::new(StaticAssets::with_defaults()),
            &config,
        );
        assert_eq!(s.remaining_placements(), Some(3));
        let unlimited = EditorSession::for_config(
            config.new_grid().unwrap(),
            Arc::new(StaticAssets::with_defaults()),
            &GridConfig::default(),
        );
        assert_eq!(unlimited.remaining_placements(), None);
    }

    #[test]
    fn erase_restores_empty_sentinel() {
        let mut s = session();
        s.paint(2, 2).unwrap();
        s.erase(2, 2).unwrap();
        assert_eq!(s.grid().get(2, 2), Some(Cell::EMPTY));
        assert!(!s.is_dirty());
    }

    #[test]
    fn history_is_capped() {
        let mut s = session().with_history_limit(2);
        s.paint(0, 0).unwrap();
        s.paint(0, 1).unwrap();
        s.paint(0, 2).unwrap();
        assert!(s.undo());
        assert!(s.undo());
        assert!(!s.undo());
        // the oldest step was dropped, so (0, 0) stays painted
        assert_eq!(s.grid().get(0, 0), Some(Cell::new(1, 2)));
        assert_eq!(s.grid().get(0, 1), Some(Cell::EMPTY));
        assert!(s.redo());
        assert!(s.redo());
        assert_eq!(s.grid().get(0, 2), Some(Cell::new(1, 2)));
    }

    #[test]
    fn config_history_limit_is_applied() {
        let config = GridConfig {
            history_limit: 0,
            ..Default::default()
        };
        let mut s = EditorSession::for_config(
            config.new_grid().unwrap(),
            Arc::new(StaticAssets::with_defaults()),
            &config,
        );
        s.select_pattern(1).unwrap();
        s.select_color(1).unwrap();
        s.paint(0, 0).unwrap();
        assert!(!s.undo());
        assert!(s.is_dirty());
    }
}
