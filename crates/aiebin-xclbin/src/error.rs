//! Build pipeline errors.

use std::path::PathBuf;

use aiebin_device::DeviceError;
use aiebin_toolchain::ToolchainError;

/// Errors raised while producing boot images and containers.
#[derive(Debug, thiserror::Error)]
pub enum XclbinError {
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    /// A required configuration value is absent.
    #[error("missing required config field: {field}")]
    MissingConfig { field: &'static str },

    /// Reading or writing a pipeline file failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Compiling a source buffer to an object file failed.
    #[error("failed to assemble {}", output.display())]
    Assemble {
        output: PathBuf,
        #[source]
        source: Box<XclbinError>,
    },

    /// A micro-kernel was requested but no chess toolchain is usable.
    #[error("compiling ukernels currently requires chess (even if you're using peano)")]
    UkernelRequiresChess {
        #[source]
        source: ToolchainError,
    },

    /// Building the ELF for one core failed.
    #[error("failed to generate elf for core: ({col}, {row})")]
    CoreElf {
        col: u32,
        row: u32,
        #[source]
        source: Box<XclbinError>,
    },

    /// An IR translation or lowering step failed.
    #[error("{stage} failed: {detail}")]
    Translation { stage: &'static str, detail: String },

    /// Configuration data object emission failed.
    #[error("failed to emit CDO: {detail}")]
    CdoEmission { detail: String },

    /// The boot image generator reported failure.
    #[error("failed to execute bootgen: {detail}")]
    BootImage { detail: String },

    /// The packaging tool failed or a packaging file could not be produced.
    #[error("xclbin packaging failed at {step}: {detail}")]
    Packaging { step: &'static str, detail: String },

    /// The partition section dumped from a merge-base container is unusable.
    #[error("merge base {}: {detail}", path.display())]
    MergeBase { path: PathBuf, detail: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl XclbinError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        XclbinError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, XclbinError>;
