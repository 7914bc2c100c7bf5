//! Catalog listing: classify stored designs as complete or in progress.

use crate::model::{compute_completion, Cell, Completion, CompletionPolicy, DesignStatus};
use crate::store::DesignRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogFilter {
    #[default]
    All,
    Completed,
    InProgress,
    /// Designs the given identity has saved edits to
    ContributedBy(String),
}

impl CatalogFilter {
    fn accepts(&self, record: &DesignRecord, status: DesignStatus) -> bool {
        match self {
            CatalogFilter::All => true,
            CatalogFilter::Completed => status == DesignStatus::Complete,
            CatalogFilter::InProgress => status == DesignStatus::InProgress,
            CatalogFilter::ContributedBy(who) => record.contributors.iter().any(|c| c == who),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub completion: Completion,
    pub status: DesignStatus,
    pub contributors: Vec<String>,
    /// Most used pattern/colour, for the listing thumbnail
    pub thumbnail: Option<Cell>,
}

/// Entries for `records` that pass `filter`, sorted by id.
pub fn build_catalog(
    records: &[DesignRecord],
    policy: &CompletionPolicy,
    filter: &CatalogFilter,
) -> Vec<CatalogEntry> {
    let mut entries: Vec<CatalogEntry> = records
        .iter()
        .filter_map(|r| {
            let completion = compute_completion(&r.grid, policy);
            let status = completion.status();
            if !filter.accepts(r, status) {
                return None;
            }
            Some(CatalogEntry {
                id: r.id.clone(),
                name: r.name.clone(),
                completion,
                status,
                contributors: r.contributors.clone(),
                thumbnail: r.grid.dominant_fill(),
            })
        })
        .collect();
    entries.sort_by(|a, b| a.id.cmp(&b.id));
    entries
}
