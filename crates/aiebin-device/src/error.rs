//! Device program errors.

use std::path::PathBuf;

/// Errors raised while building or querying a device program.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Two tiles share the same coordinates.
    #[error("duplicate tile at ({col}, {row})")]
    DuplicateTile { col: u32, row: u32 },

    /// No tile exists at the requested coordinates.
    #[error("no tile at ({col}, {row})")]
    TileNotFound { col: u32, row: u32 },

    /// The device carries no `npu_instructions` attribute.
    #[error("expected npu_instructions attribute on device '{device}'")]
    MissingNpuInstructions { device: String },

    /// Writing an output file failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;
