//! Silhouette masks: which grid coordinates lie outside the garment.
//!
//! A mask is a pure function of the grid dimensions and a
//! [`SilhouetteTable`]. Dimensions with a table entry use its rectangular
//! exclusion zones; anything else falls back to the proportional T-shirt
//! outline, so every `(width, height)` pair is classified.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// An axis-aligned block of forbidden cells (half-open ranges).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionZone {
    pub x: Range<usize>,
    pub y: Range<usize>,
}

impl ExclusionZone {
    pub fn new(x: Range<usize>, y: Range<usize>) -> Self {
        Self { x, y }
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.x.contains(&x) && self.y.contains(&y)
    }
}

/// Rule set classifying coordinates for one grid size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Silhouette {
    /// Forbidden iff inside any zone
    Zones { zones: Vec<ExclusionZone> },
    /// Collar, body and sleeves expressed as fractions of the grid size
    Proportional,
}

impl Silhouette {
    /// Whether `(x, y)` lies outside the garment.
    pub fn is_forbidden(&self, x: usize, y: usize, width: usize, height: usize) -> bool {
        match self {
            Silhouette::Zones { zones } => zones.iter().any(|z| z.contains(x, y)),
            Silhouette::Proportional => !inside_proportional_shirt(x, y, width, height),
        }
    }
}

fn inside_proportional_shirt(x: usize, y: usize, width: usize, height: usize) -> bool {
    if width == 0 || height == 0 {
        return false;
    }
    let nx = x as f64 / width as f64;
    let ny = y as f64 / height as f64;

    // collar
    if ny <= 0.15 && (0.42..=0.58).contains(&nx) {
        return true;
    }
    // body
    if ny > 0.15 && ny <= 0.92 && (0.25..=0.75).contains(&nx) {
        return true;
    }
    // sleeves
    ny > 0.25 && ny <= 0.82 && ((0.08..0.25).contains(&nx) || (nx > 0.75 && nx <= 0.92))
}

/// One configured grid size and its silhouette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilhouetteEntry {
    pub width: usize,
    pub height: usize,
    pub silhouette: Silhouette,
}

/// Configuration table of silhouettes keyed by grid dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SilhouetteTable {
    entries: Vec<SilhouetteEntry>,
}

impl SilhouetteTable {
    /// A table with no entries; every size uses the proportional outline.
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn entries(&self) -> &[SilhouetteEntry] {
        &self.entries
    }

    /// Add or replace the entry for `width x height`.
    pub fn insert(&mut self, width: usize, height: usize, silhouette: Silhouette) {
        self.entries.retain(|e| !(e.width == width && e.height == height));
        self.entries.push(SilhouetteEntry {
            width,
            height,
            silhouette,
        });
    }

    /// Silhouette for the given size, falling back to [`Silhouette::Proportional`].
    pub fn resolve(&self, width: usize, height: usize) -> Silhouette {
        self.entries
            .iter()
            .find(|e| e.width == width && e.height == height)
            .map(|e| e.silhouette.clone())
            .unwrap_or(Silhouette::Proportional)
    }

    /// Reject entries with zero dimensions or zones that reach past the grid.
    pub fn validate(&self) -> Result<()> {
        for e in &self.entries {
            check_dimensions(e.width, e.height)?;
            if let Silhouette::Zones { zones } = &e.silhouette {
                for z in zones {
                    if z.x.end > e.width || z.y.end > e.height || z.x.is_empty() || z.y.is_empty() {
                        return Err(Error::ConfigError(format!(
                            "exclusion zone x={:?} y={:?} does not fit the {}x{} grid",
                            z.x, z.y, e.width, e.height
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for SilhouetteTable {
    /// The storefront shirt: 19x13 with shoulder and neck cutouts.
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert(
            19,
            13,
            Silhouette::Zones {
                zones: vec![
                    ExclusionZone::new(0..4, 4..13),
                    ExclusionZone::new(8..11, 0..3),
                    ExclusionZone::new(15..19, 4..13),
                ],
            },
        );
        table
    }
}

/// Materialized forbidden-cell mask for one grid size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SilhouetteMask {
    width: usize,
    height: usize,
    forbidden: Vec<bool>,
}

/// Largest number of cells a grid may have.
pub const MAX_GRID_CELLS: usize = 1 << 20;

/// Reject zero or oversized dimensions; returns the cell count.
pub fn check_dimensions(width: usize, height: usize) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::ConfigError(format!(
            "grid dimensions must be non-zero, got {}x{}",
            width, height
        )));
    }
    match width.checked_mul(height) {
        Some(cells) if cells <= MAX_GRID_CELLS => Ok(cells),
        _ => Err(Error::ConfigError(format!(
            "grid {}x{} exceeds {} cells",
            width, height, MAX_GRID_CELLS
        ))),
    }
}

impl SilhouetteMask {
    /// Classify every coordinate of a `width x height` grid.
    pub fn generate(width: usize, height: usize, table: &SilhouetteTable) -> Result<Self> {
        let cells = check_dimensions(width, height)?;
        let silhouette = table.resolve(width, height);
        let mut forbidden = Vec::with_capacity(cells);
        for y in 0..height {
            for x in 0..width {
                forbidden.push(silhouette.is_forbidden(x, y, width, height));
            }
        }
        Ok(Self {
            width,
            height,
            forbidden,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Out-of-range coordinates are reported as forbidden.
    pub fn is_forbidden(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return true;
        }
        self.forbidden[y * self.width + x]
    }

    pub fn designable_count(&self) -> usize {
        self.forbidden.iter().filter(|f| !**f).count()
    }

    /// Forbidden coordinates as `(x, y)` in row-major order.
    pub fn forbidden_positions(&self) -> Vec<(usize, usize)> {
        self.forbidden
            .iter()
            .enumerate()
            .filter(|(_, f)| **f)
            .map(|(i, _)| (i % self.width, i / self.width))
            .collect()
    }

    /// `#` for designable cells, `.` for forbidden ones.
    pub fn render_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.forbidden.chunks(self.width) {
            for f in row {
                out.push(if *f { '.' } else { '#' });
            }
            out.push('\n');
        }
        out
    }
}
