//! Build configuration.
//!
//! A [`BuildConfig`] is resolved once per build. Enum-valued fields are
//! validated while deserializing, so a config that loads names only supported
//! hardware generations and HAL targets.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use aiebin_targets::{NpuVersion, TargetArch};
use aiebin_toolchain::PeanoInstall;
use serde::{Deserialize, Serialize};

use crate::error::{Result, XclbinError};

/// Host runtime that will load the build output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceHal {
    /// The boot image is the artifact.
    #[default]
    XrtLite,
    /// The boot image is packaged into an xclbin container.
    Xrt,
}

impl fmt::Display for DeviceHal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceHal::XrtLite => f.write_str("xrt-lite"),
            DeviceHal::Xrt => f.write_str("xrt"),
        }
    }
}

impl FromStr for DeviceHal {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "xrt-lite" => Ok(DeviceHal::XrtLite),
            "xrt" => Ok(DeviceHal::Xrt),
            other => Err(format!("unknown device HAL '{other}' (expected xrt-lite or xrt)")),
        }
    }
}

/// Which precompiled micro-kernels to link into every core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UkernelSelection {
    #[default]
    None,
    /// Matrix multiplication.
    Mm,
    All,
}

impl UkernelSelection {
    /// Whether the matmul micro-kernel object is linked.
    pub fn links_matmul(self) -> bool {
        matches!(self, UkernelSelection::Mm | UkernelSelection::All)
    }
}

impl FromStr for UkernelSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(UkernelSelection::None),
            "mm" => Ok(UkernelSelection::Mm),
            "all" => Ok(UkernelSelection::All),
            other => Err(format!("unknown ukernel selection '{other}' (expected none, mm or all)")),
        }
    }
}

/// IR printing and timing for lowering passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PassManagerOptions {
    pub print_ir_before_all: bool,
    pub print_ir_after_all: bool,
    pub print_ir_module_scope: bool,
    pub timing: bool,
}

/// Kernel metadata written into the xclbin container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct XclbinOptions {
    pub kernel_id: String,
    pub kernel_name: String,
    pub instance_name: String,
    /// Existing container whose partitions the new one is merged into.
    pub input: Option<PathBuf>,
}

impl Default for XclbinOptions {
    fn default() -> Self {
        Self {
            kernel_id: "0x101".into(),
            kernel_name: "MLIR_AIE".into(),
            instance_name: "MLIRAIE".into(),
            input: None,
        }
    }
}

/// Resolved parameters for one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BuildConfig {
    pub target_arch: TargetArch,
    pub npu_version: NpuVersion,
    /// Scratch directory that receives every intermediate file.
    pub work_dir: PathBuf,
    /// Vitis root; discovered when absent.
    pub vitis_dir: Option<PathBuf>,
    /// Peano (llvm-aie) root. Required unless `use_chess`.
    pub peano_dir: Option<PathBuf>,
    /// Directory searched first for helper tools.
    pub install_dir: Option<PathBuf>,
    pub verbose: bool,
    pub pass_manager: PassManagerOptions,
    pub device_hal: DeviceHal,
    /// Compile cores with chess instead of peano.
    pub use_chess: bool,
    pub ukernel: UkernelSelection,
    /// Extra `opt` flags, wrapped in double quotes.
    pub additional_peano_opt_flags: String,
    pub xclbin: XclbinOptions,
    /// Where to write the NPU instruction stream, if anywhere.
    pub npu_insts_output: Option<PathBuf>,
    pub emit_ctrl_pkts: bool,
    /// Directory holding prebuilt micro-kernel and intrinsics objects.
    pub prebuilt_objects: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            target_arch: TargetArch::Aie2,
            npu_version: NpuVersion::Npu1,
            work_dir: PathBuf::from("aiebin-work"),
            vitis_dir: None,
            peano_dir: None,
            install_dir: None,
            verbose: false,
            pass_manager: PassManagerOptions::default(),
            device_hal: DeviceHal::default(),
            use_chess: false,
            ukernel: UkernelSelection::default(),
            additional_peano_opt_flags: String::new(),
            xclbin: XclbinOptions::default(),
            npu_insts_output: None,
            emit_ctrl_pkts: false,
            prebuilt_objects: None,
        }
    }
}

impl BuildConfig {
    /// Default configuration for a hardware generation and its architecture.
    pub fn for_npu(npu_version: NpuVersion) -> Self {
        Self {
            target_arch: npu_version.arch(),
            npu_version,
            ..Self::default()
        }
    }

    /// The configured peano install.
    pub fn peano(&self) -> Result<PeanoInstall> {
        self.peano_dir
            .as_deref()
            .map(PeanoInstall::new)
            .ok_or(XclbinError::MissingConfig { field: "peano-dir" })
    }
}
