//! Persistence for design records.
//!
//! A design owns exactly one grid. Saves are guarded by the grid digest:
//! callers pass the version they loaded and a stale version is rejected
//! instead of overwriting someone else's edits.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::catalog::{build_catalog, CatalogEntry, CatalogFilter};
use crate::codec::grid_digest;
use crate::model::{compute_completion, Completion, CompletionPolicy, Grid};
use crate::{Error, GridConfig, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// A design and the grid it owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "data")]
    pub grid: Grid,
    /// Identities that have saved edits, in first-save order
    #[serde(default)]
    pub contributors: Vec<String>,
    /// Unix seconds after which the design is read-only
    #[serde(default)]
    pub closed_at: Option<u64>,
}

impl DesignRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, grid: Grid) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            grid,
            contributors: Vec::new(),
            closed_at: None,
        }
    }

    pub fn is_closed_at(&self, now: u64) -> bool {
        self.closed_at.map_or(false, |t| t <= now)
    }
}

/// A loaded record plus the version to hand back on save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDesign {
    pub record: DesignRecord,
    pub version: String,
}

impl StoredDesign {
    pub fn from_record(record: DesignRecord) -> Result<Self> {
        let version = grid_digest(&record.grid)?;
        Ok(Self { record, version })
    }
}

/// Which backend [`new_store`] builds
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    File { dir: PathBuf },
}

/// Storage for design records keyed by design id
pub trait DesignStore: Send {
    /// Register a new design with its initial grid
    fn create(&mut self, id: &str, name: &str, grid: Grid) -> Result<StoredDesign>;

    fn load(&self, id: &str) -> Result<StoredDesign>;

    /// Replace the design's grid and return the new version.
    ///
    /// `expected_version` of `None` skips the concurrency check.
    fn save(
        &mut self,
        id: &str,
        grid: Grid,
        editor: &str,
        expected_version: Option<&str>,
    ) -> Result<String>;

    /// All records, sorted by id
    fn list(&self) -> Result<Vec<DesignRecord>>;

    /// Make the design read-only from `at` (unix seconds) onwards
    fn close(&mut self, id: &str, at: u64) -> Result<()>;

    // --- Convenience helpers (default implementations) ---

    fn completion_of(&self, id: &str, policy: &CompletionPolicy) -> Result<Completion> {
        let stored = self.load(id)?;
        Ok(compute_completion(&stored.record.grid, policy))
    }

    fn catalog(&self, policy: &CompletionPolicy, filter: &CatalogFilter) -> Result<Vec<CatalogEntry>> {
        let records = self.list()?;
        Ok(build_catalog(&records, policy, filter))
    }
}

/// Build the store selected by `config.store`.
pub fn new_store(config: &GridConfig) -> Result<Box<dyn DesignStore>> {
    match &config.store {
        StoreBackend::Memory => Ok(Box::new(MemoryStore::new(config.silhouettes.clone()))),
        StoreBackend::File { dir } => Ok(Box::new(FileStore::open(dir, config.silhouettes.clone())?)),
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Ids become file names, so keep them to a conservative character set.
pub(crate) fn check_id(id: &str) -> Result<()> {
    let ok = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidDesignId(id.to_string()))
    }
}

/// Save rules shared by every backend. Mutates `record` only on success.
pub(crate) fn apply_save(
    record: &mut DesignRecord,
    grid: Grid,
    editor: &str,
    expected_version: Option<&str>,
    now: u64,
) -> Result<String> {
    if record.is_closed_at(now) {
        warn!("save to closed design {} rejected", record.id);
        return Err(Error::DesignClosed(record.id.clone()));
    }
    if let Some(expected) = expected_version {
        let found = grid_digest(&record.grid)?;
        if found != expected {
            warn!("version conflict on design {}", record.id);
            return Err(Error::VersionConflict {
                expected: expected.to_string(),
                found,
            });
        }
    }
    if !grid.same_layout(&record.grid) {
        return Err(Error::MalformedGrid(format!(
            "grid layout does not match design {} ({}x{})",
            record.id,
            record.grid.width(),
            record.grid.height()
        )));
    }
    let version = grid_digest(&grid)?;
    record.grid = grid;
    if !editor.is_empty() && !record.contributors.iter().any(|c| c == editor) {
        record.contributors.push(editor.to_string());
    }
    debug!("design {} saved by {:?} at version {}", record.id, editor, version);
    Ok(version)
}
