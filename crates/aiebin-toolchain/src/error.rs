//! Toolchain error types.

use std::path::PathBuf;

/// Errors raised while locating or running native tools.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// No Vitis install could be resolved.
    #[error("couldn't find vitis directory: {detail}")]
    ToolchainNotFound { detail: String },

    /// Neither accepted license variable is set.
    #[error("either XILINXD_LICENSE_FILE or LM_LICENSE_FILE must be set")]
    LicenseMissing,

    /// A path-valued license variable points to a missing file.
    #[error("license file {} does not exist", path.display())]
    LicenseFileMissing { path: PathBuf },

    /// A binary the toolchain must ship is absent.
    #[error("couldn't find {}", path.display())]
    RequiredBinaryMissing { path: PathBuf },

    /// A helper tool was not found in any search location.
    #[error("could not find {name}; check the install directory setting")]
    ToolNotFound { name: String },

    /// The program handed to the runner does not exist.
    #[error("program {} does not exist", path.display())]
    ProgramNotFound { path: PathBuf },

    /// The program could not be launched or exited unsuccessfully.
    #[error("failed to run tool {} ({}){}", program.display(), describe_status(*status), describe_output(output))]
    ExternalToolFailure {
        program: PathBuf,
        /// Exit code, or `None` if the process failed to launch or was killed.
        status: Option<i32>,
        /// Combined stdout and stderr.
        output: String,
        /// Retained log file holding the same output.
        log: Option<PathBuf>,
    },

    /// Extra optimizer flags were not wrapped in double quotes.
    #[error("additional peano opt flags must be of the form \"-flag1 -flag2 ...\", got: {flags}")]
    MalformedExtraFlags { flags: String },

    /// The runner could not create its output capture file.
    #[error("failed to create tool log file: {source}")]
    LogFile {
        #[source]
        source: std::io::Error,
    },
}

fn describe_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "did not exit normally".to_string(),
    }
}

fn describe_output(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(":\n{trimmed}")
    }
}

/// Result type alias for toolchain operations.
pub type Result<T> = std::result::Result<T, ToolchainError>;
