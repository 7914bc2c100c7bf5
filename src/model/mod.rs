//! Garment grid model: silhouette masks, cells, completion and the JSON boundary.

pub mod codec;
pub mod completion;
pub mod grid;
pub mod mask;

pub use completion::{compute_completion, Completion, CompletionPolicy, DesignStatus};
pub use grid::{Cell, Grid};
pub use mask::{
    check_dimensions, ExclusionZone, MAX_GRID_CELLS, Silhouette, SilhouetteEntry, SilhouetteMask,
    SilhouetteTable,
};
