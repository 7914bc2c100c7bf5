//! Error types for the grid model and its persistence collaborators

use thiserror::Error;

/// Result type alias for grid operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, editing or storing a design grid
#[derive(Error, Debug)]
pub enum Error {
    /// Coordinates outside `[0, width) x [0, height)`
    #[error("Cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    /// Attempted write to a cell outside the garment silhouette
    #[error("Cell ({x}, {y}) is outside the garment silhouette")]
    ForbiddenCellWrite { x: usize, y: usize },

    /// A pattern/colour pair that is neither empty nor a valid selection
    #[error("Invalid cell value [{pattern_id}, {color_id}]")]
    InvalidCell { pattern_id: i32, color_id: i32 },

    /// A persisted grid that cannot be hydrated
    #[error("Malformed grid: {0}")]
    MalformedGrid(String),

    /// A stored design document that is unreadable or filed under the wrong id
    #[error("Malformed design record: {0}")]
    MalformedRecord(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Unknown design id
    #[error("Design not found: {0}")]
    NotFound(String),

    /// Design id that cannot be used as a storage key
    #[error("Invalid design id: {0:?}")]
    InvalidDesignId(String),

    /// Design already exists
    #[error("Design already exists: {0}")]
    AlreadyExists(String),

    /// Optimistic concurrency check failed on save
    #[error("Version conflict: expected {expected}, found {found}")]
    VersionConflict { expected: String, found: String },

    /// Design is past its closing time and can no longer be edited
    #[error("Design {0} is closed for editing")]
    DesignClosed(String),

    /// Pattern id not present in the asset lookup
    #[error("Unknown pattern id {0}")]
    UnknownPattern(i32),

    /// Colour id not present in the asset lookup
    #[error("Unknown color id {0}")]
    UnknownColor(i32),

    /// The session has no placements left
    #[error("Placement quota of {0} exhausted")]
    QuotaExhausted(u32),

    /// The async service worker has shut down
    #[error("Design service is closed")]
    ServiceClosed,

    /// Filesystem error from a file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
