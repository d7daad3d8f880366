//! Toolchain discovery.
//!
//! Discovery is a pure lookup: it reads the environment through
//! [`EnvLookup`], probes the filesystem, and returns paths. Nothing is cached,
//! since the chess sub-paths depend on the hardware generation of each call.

use std::path::{Path, PathBuf};

use aiebin_targets::NpuVersion;

use crate::env::EnvLookup;
use crate::error::{Result, ToolchainError};

/// A validated Vitis install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VitisInstall {
    /// Vitis root (the directory containing `aietools`).
    pub root: PathBuf,
    /// License value taken from whichever license variable was set.
    pub license: String,
}

impl VitisInstall {
    pub fn aietools(&self) -> PathBuf {
        self.root.join("aietools")
    }

    /// Directory holding `chess-clang` and `chess-llvm-link` for `npu`.
    pub fn chess_bin_dir(&self, npu: NpuVersion) -> PathBuf {
        self.aietools()
            .join("tps")
            .join("lnx64")
            .join(npu.chess_target_dir())
            .join("bin")
            .join("LNa64bin")
    }

    /// The unwrapped `xchesscc` driver.
    pub fn xchesscc(&self) -> PathBuf {
        self.aietools()
            .join("bin")
            .join("unwrapped")
            .join("lnx64.o")
            .join("xchesscc")
    }
}

/// A peano (llvm-aie) install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeanoInstall {
    pub root: PathBuf,
}

impl PeanoInstall {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn opt(&self) -> PathBuf {
        self.root.join("bin").join("opt")
    }

    pub fn llc(&self) -> PathBuf {
        self.root.join("bin").join("llc")
    }

    /// Compiler driver, used as the linker so libc and crt paths are injected.
    pub fn clang(&self) -> PathBuf {
        self.root.join("bin").join("clang")
    }
}

/// Resolve and validate the Vitis install used for chess compilation.
///
/// Resolution order: `explicit`, then `$VITIS`, then two directories above a
/// `v++` found on `$PATH`. The license check runs first, so a missing license
/// is reported even when no install can be found.
pub fn locate_vitis(
    explicit: Option<&Path>,
    npu: NpuVersion,
    env: &dyn EnvLookup,
) -> Result<VitisInstall> {
    let license = env.license().ok_or(ToolchainError::LicenseMissing)?;
    // `port@host` names a license server rather than a file.
    if !license.contains('@') && !Path::new(&license).exists() {
        return Err(ToolchainError::LicenseFileMissing {
            path: PathBuf::from(&license),
        });
    }

    let root = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => match env.var("VITIS") {
            Some(dir) => PathBuf::from(dir),
            None => vitis_from_vpp(env).ok_or_else(|| ToolchainError::ToolchainNotFound {
                detail: "no explicit path, $VITIS unset, and v++ not on PATH".into(),
            })?,
        },
    };
    log::debug!("Found Vitis at {}", root.display());

    let install = VitisInstall { root, license };
    let aietools = install.aietools();
    if !aietools.is_dir() {
        return Err(ToolchainError::ToolchainNotFound {
            detail: format!("{} is not a directory", aietools.display()),
        });
    }

    let bin_dir = install.chess_bin_dir(npu);
    for binary in ["chess-clang", "chess-llvm-link"] {
        let path = bin_dir.join(binary);
        if !path.exists() {
            return Err(ToolchainError::RequiredBinaryMissing { path });
        }
    }

    Ok(install)
}

fn vitis_from_vpp(env: &dyn EnvLookup) -> Option<PathBuf> {
    let vpp = which::which_in("v++", env.var("PATH"), ".").ok()?;
    let real = std::fs::canonicalize(vpp).ok()?;
    real.parent()?.parent().map(Path::to_path_buf)
}

/// Find a helper tool shipped with the backend.
///
/// Searches `install_dir/<name>`, `install_dir/bin/<name>`,
/// `install_dir/tools/<name>`, then the directory of the running executable
/// and `$PATH`.
pub fn locate_helper_tool(
    name: &str,
    install_dir: Option<&Path>,
    env: &dyn EnvLookup,
) -> Result<PathBuf> {
    let file_name = format!("{name}{}", std::env::consts::EXE_SUFFIX);

    if let Some(dir) = install_dir.filter(|d| !d.as_os_str().is_empty()) {
        let candidates = [
            dir.join(&file_name),
            dir.join("bin").join(&file_name),
            dir.join("tools").join(&file_name),
        ];
        if let Some(found) = candidates.into_iter().find(|p| p.is_file()) {
            return Ok(found);
        }
    }

    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|d| d.join(&file_name)))
        .filter(|p| p.is_file());
    if let Some(found) = beside_exe {
        return Ok(found);
    }

    which::which_in(&file_name, env.var("PATH"), ".").map_err(|_| ToolchainError::ToolNotFound {
        name: name.to_string(),
    })
}
