//! Completion statistics derived from grid contents

use crate::model::grid::Grid;
use serde::{Deserialize, Serialize};

/// Percentage at which a design counts as complete unless configured otherwise.
pub const DEFAULT_COMPLETION_THRESHOLD: u8 = 80;

/// When a design is considered complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionPolicy {
    /// Minimum rounded percentage, 0..=100
    pub threshold: u8,
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_COMPLETION_THRESHOLD,
        }
    }
}

/// Result of scanning a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Designable cells with both a pattern and a colour
    pub filled: usize,
    /// Designable (non-forbidden) cells
    pub total: usize,
    /// `round(100 * filled / total)`, 0 when `total == 0`
    pub percentage: u32,
    pub is_complete: bool,
}

impl Completion {
    pub fn status(&self) -> DesignStatus {
        if self.is_complete {
            DesignStatus::Complete
        } else {
            DesignStatus::InProgress
        }
    }
}

/// Listing classification of a design
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignStatus {
    Complete,
    InProgress,
}

/// Scan every cell once and derive completion under `policy`.
pub fn compute_completion(grid: &Grid, policy: &CompletionPolicy) -> Completion {
    let mut total = 0usize;
    let mut filled = 0usize;
    for (_, _, cell) in grid.cells() {
        if cell.is_forbidden() {
            continue;
        }
        total += 1;
        if cell.is_filled() {
            filled += 1;
        }
    }
    let percentage = rounded_percentage(filled, total);
    Completion {
        filled,
        total,
        percentage,
        is_complete: percentage >= u32::from(policy.threshold),
    }
}

// Integer round-half-up of 100 * filled / total.
fn rounded_percentage(filled: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * filled + total) / (2 * total)) as u32
}
