//! Error types for target model operations.

/// Errors that can occur while resolving a target model.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// The hardware generation string names no known NPU.
    #[error("unsupported NPU version: '{value}' (expected one of: npu1, npu4)")]
    UnsupportedHardwareVersion {
        /// The rejected value.
        value: String,
    },

    /// The architecture string names no known AIE core architecture.
    #[error("unsupported target architecture: '{value}' (expected one of: AIE2, AIE2P)")]
    UnsupportedArch {
        /// The rejected value.
        value: String,
    },
}

/// Result type for target operations.
pub type Result<T> = std::result::Result<T, TargetError>;
