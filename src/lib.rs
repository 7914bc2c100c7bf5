//! Batik Grid
//!
//! The garment grid model behind the batik-design storefront: a shirt's
//! design surface as a fixed-shape grid of `(patternId, colorId)` cells,
//! with cells outside the garment silhouette permanently forbidden.
//!
//! # Features
//!
//! - **Silhouette masks**: pure, table-driven classification of every cell
//! - **Copy-on-write grids**: cheap snapshots for undo history
//! - **Completion statistics**: derived on demand, threshold configurable
//! - **Persistence**: versioned saves through a swappable `DesignStore`
//! - **Service** (default feature): async facade over a store worker thread
//!
//! # Example
//!
//! ```
//! use batikgrid::{compute_completion, GridConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GridConfig::default();
//! let mut grid = config.new_grid()?;
//! grid.set_cell(5, 6, 1, 2)?;
//!
//! let stats = compute_completion(&grid, &config.policy());
//! assert_eq!(stats.total, 166);
//! assert_eq!(stats.filled, 1);
//! assert!(!stats.is_complete);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod error;
pub use error::{Error, Result};

// Grid model: masks, cells, completion, JSON boundary
pub mod model;
pub use model::codec;
pub use model::{
    compute_completion, Cell, Completion, CompletionPolicy, DesignStatus, Grid, Silhouette,
    SilhouetteMask, SilhouetteTable,
};

// Pattern/colour lookup service
pub mod assets;

pub mod catalog;
pub mod editor;

// Persistence collaborators
pub mod store;
pub use store::{new_store, DesignRecord, DesignStore, StoreBackend, StoredDesign};

// Async-friendly service (worker-backed abstraction)
#[cfg(feature = "service")]
pub mod async_api;

#[cfg(feature = "service")]
pub use async_api::DesignService;

/// Configuration for grids and the stores that hold them
///
/// The defaults describe the storefront shirt: a 19x13 grid with the
/// shoulder and neck cutouts from [`SilhouetteTable::default`], complete
/// at 80%, kept in memory.
///
/// # Examples
///
/// ```
/// let cfg = batikgrid::GridConfig::default();
/// assert_eq!((cfg.width, cfg.height), (19, 13));
/// assert_eq!(cfg.completion_threshold, 80);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Percentage at which a design counts as complete
    pub completion_threshold: u8,
    /// Exclusion zones per grid size
    pub silhouettes: SilhouetteTable,
    /// Placements allowed per editor session (`None` => unlimited)
    pub placement_quota: Option<u32>,
    /// Undo steps an editor session keeps
    pub history_limit: usize,
    /// Where designs are persisted
    pub store: StoreBackend,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 19,
            height: 13,
            completion_threshold: model::completion::DEFAULT_COMPLETION_THRESHOLD,
            silhouettes: SilhouetteTable::default(),
            placement_quota: None,
            history_limit: editor::DEFAULT_HISTORY_LIMIT,
            store: StoreBackend::Memory,
        }
    }
}

impl GridConfig {
    /// Read a JSON config file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let config: GridConfig = serde_json::from_str(&data).map_err(|e| {
            Error::ConfigError(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        model::check_dimensions(self.width, self.height)?;
        if self.completion_threshold > 100 {
            return Err(Error::ConfigError(format!(
                "completion threshold {} exceeds 100",
                self.completion_threshold
            )));
        }
        self.silhouettes.validate()
    }

    /// Mask for the configured dimensions
    pub fn mask(&self) -> Result<SilhouetteMask> {
        SilhouetteMask::generate(self.width, self.height, &self.silhouettes)
    }

    /// A fresh grid for the configured dimensions
    pub fn new_grid(&self) -> Result<Grid> {
        Ok(Grid::new(&self.mask()?))
    }

    pub fn policy(&self) -> CompletionPolicy {
        CompletionPolicy {
            threshold: self.completion_threshold,
        }
    }
}
