//! External process runner.
//!
//! Runs one program to completion, capturing stdout and stderr into a private
//! log file rather than the terminal. Calls block until the process exits; no
//! timeout is applied.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::{Result, ToolchainError};

/// Outcome of a successful tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Combined stdout and stderr.
    pub output: String,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

/// Run `program` with `args`.
///
/// When `env` is given it replaces the child's environment entirely;
/// otherwise the child inherits ours. `program` must already be resolved to
/// an existing file. With `verbose`, the command line, timing, and captured
/// output are logged at info level.
///
/// The capture file is removed after a successful run and kept after a
/// failure; its path is reported in [`ToolchainError::ExternalToolFailure`].
pub fn run_tool(
    program: &Path,
    args: &[String],
    env: Option<&[(String, String)]>,
    verbose: bool,
) -> Result<ToolOutput> {
    let program = with_exe_suffix(program);
    if verbose {
        log::info!("Run: {}", render_command_line(&program, args, env));
    }

    if !program.is_file() {
        log::error!("Program {} does not exist", program.display());
        return Err(ToolchainError::ProgramNotFound { path: program });
    }

    let log_file = tempfile::Builder::new()
        .prefix("tmpRunTool")
        .suffix("Logging")
        .tempfile()
        .map_err(|source| ToolchainError::LogFile { source })?;
    let stdout = log_file
        .reopen()
        .map_err(|source| ToolchainError::LogFile { source })?;
    let stderr = log_file
        .reopen()
        .map_err(|source| ToolchainError::LogFile { source })?;

    let mut cmd = Command::new(&program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr));
    if let Some(vars) = env {
        cmd.env_clear();
        cmd.envs(vars.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    let start = Instant::now();
    let status = cmd.status();
    let duration = start.elapsed();
    let output = read_capture(log_file.path());

    let code = match &status {
        Ok(s) => s.code(),
        Err(_) => None,
    };
    let succeeded = matches!(&status, Ok(s) if s.success());

    if verbose {
        log::info!(
            "{} in totalTime {:.3} [s]. Exit code={}",
            if succeeded { "Succeeded" } else { "Failed" },
            duration.as_secs_f32(),
            code.map_or_else(|| "none".to_string(), |c| c.to_string()),
        );
        log::info!("{output}");
    }

    if succeeded {
        return Ok(ToolOutput { output, duration });
    }

    let output = match status {
        Err(launch) => format!("{launch}\n{output}"),
        Ok(_) => output,
    };
    let log = log_file.into_temp_path().keep().ok();
    log::error!("Failed to run tool: {}", program.display());
    log::error!("{output}");
    Err(ToolchainError::ExternalToolFailure {
        program,
        status: code,
        output,
        log,
    })
}

fn read_capture(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            log::error!("Failed to open temporary file {}: {e}", path.display());
            String::new()
        }
    }
}

fn with_exe_suffix(program: &Path) -> PathBuf {
    let suffix = std::env::consts::EXE_SUFFIX;
    if suffix.is_empty() || program.to_string_lossy().ends_with(suffix) {
        program.to_path_buf()
    } else {
        PathBuf::from(format!("{}{suffix}", program.display()))
    }
}

fn render_command_line(program: &Path, args: &[String], env: Option<&[(String, String)]>) -> String {
    let mut parts = Vec::new();
    for (k, v) in env.unwrap_or_default() {
        parts.push(format!("{k}={v}"));
    }
    parts.push(program.display().to_string());
    parts.extend(args.iter().cloned());
    parts.join(" ")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn missing_program_fails_fast() {
        let err = run_tool(Path::new("/nonexistent/tool"), &[], None, false).unwrap_err();
        assert!(matches!(err, ToolchainError::ProgramNotFound { .. }));
    }

    #[test]
    fn captures_stdout_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "echoer", "echo out-$1; echo err-$2 >&2");
        let out = run_tool(&tool, &["a".into(), "b".into()], None, true).unwrap();
        assert!(out.output.contains("out-a"));
        assert!(out.output.contains("err-b"));
    }

    #[test]
    fn nonzero_exit_carries_output_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "failer", "echo broken; exit 3");
        let err = run_tool(&tool, &[], None, false).unwrap_err();
        match err {
            ToolchainError::ExternalToolFailure {
                status, output, log, ..
            } => {
                assert_eq!(status, Some(3));
                assert!(output.contains("broken"));
                let log = log.unwrap();
                assert!(std::fs::read_to_string(&log).unwrap().contains("broken"));
                std::fs::remove_file(log).unwrap();
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn env_override_replaces_environment() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "envdump", "echo \"A=$A HOME=$HOME\"");
        let env = vec![("A".to_string(), "1".to_string())];
        let out = run_tool(&tool, &[], Some(env.as_slice()), false).unwrap();
        assert_eq!(out.output.trim(), "A=1 HOME=");
    }
}
