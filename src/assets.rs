//! Pattern and colour lookup by id.
//!
//! The grid only stores ids; anything that needs an image or a hex value
//! asks an `AssetLookup`.

use crate::model::Cell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternAsset {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSwatch {
    pub id: i32,
    /// Six hex digits, no leading `#`
    pub hex: String,
}

pub trait AssetLookup: Send + Sync {
    fn pattern(&self, id: i32) -> Option<PatternAsset>;
    fn color(&self, id: i32) -> Option<ColorSwatch>;
    fn patterns(&self) -> Vec<PatternAsset>;
    fn colors(&self) -> Vec<ColorSwatch>;

    /// Assets for a filled cell; `None` for empty, forbidden or unknown ids.
    fn resolve(&self, cell: Cell) -> Option<(PatternAsset, ColorSwatch)> {
        if !cell.is_filled() {
            return None;
        }
        Some((self.pattern(cell.pattern_id)?, self.color(cell.color_id)?))
    }
}

/// In-memory tables
#[derive(Debug, Clone, Default)]
pub struct StaticAssets {
    patterns: BTreeMap<i32, PatternAsset>,
    colors: BTreeMap<i32, ColorSwatch>,
}

impl StaticAssets {
    pub fn new(patterns: Vec<PatternAsset>, colors: Vec<ColorSwatch>) -> Self {
        Self {
            patterns: patterns.into_iter().map(|p| (p.id, p)).collect(),
            colors: colors.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    /// The storefront's built-in batik patterns and palette.
    pub fn with_defaults() -> Self {
        let patterns = [(1, "Tangerang"), (2, "Jawa"), (3, "STI")]
            .into_iter()
            .map(|(id, name)| PatternAsset {
                id,
                name: name.to_string(),
                description: format!("{} batik motif", name),
                image_url: format!("/patterns/Batik{}.png", id),
            })
            .collect();
        let colors = [(1, "0c0c0d"), (2, "0386cc"), (3, "345a1e")]
            .into_iter()
            .map(|(id, hex)| ColorSwatch {
                id,
                hex: hex.to_string(),
            })
            .collect();
        Self::new(patterns, colors)
    }
}

impl AssetLookup for StaticAssets {
    fn pattern(&self, id: i32) -> Option<PatternAsset> {
        self.patterns.get(&id).cloned()
    }

    fn color(&self, id: i32) -> Option<ColorSwatch> {
        self.colors.get(&id).cloned()
    }

    fn patterns(&self) -> Vec<PatternAsset> {
        self.patterns.values().cloned().collect()
    }

    fn colors(&self) -> Vec<ColorSwatch> {
        self.colors.values().cloned().collect()
    }
}
