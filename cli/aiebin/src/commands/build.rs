//! `aiebin build`: device program in, boot image or xclbin out.

use std::path::{Path, PathBuf};

use aiebin_device::DeviceProgram;
use aiebin_targets::{NpuVersion, TargetArch};
use aiebin_toolchain::EnvLookup;
use aiebin_xclbin::{
    build, BootgenTool, BuildConfig, BuildTools, DeviceHal, ObjectCache, ToolTranslator,
    UkernelSelection,
};
use anyhow::{Context, Result};
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Flags for `aiebin build`. Each one overrides the matching `aiebin.toml`
/// setting.
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Device program (JSON)
    pub input: PathBuf,
    /// Output artifact (boot image for xrt-lite, xclbin for xrt)
    #[arg(short, long)]
    pub output: PathBuf,
    /// Configuration file (default: nearest aiebin.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Hardware generation (npu1, npu4)
    #[arg(long)]
    pub npu_version: Option<NpuVersion>,
    /// Core architecture (aie2, aie2p); follows --npu-version when omitted
    #[arg(long)]
    pub target_arch: Option<TargetArch>,
    /// Scratch directory for intermediate files
    #[arg(long)]
    pub work_dir: Option<PathBuf>,
    #[arg(long)]
    pub vitis_dir: Option<PathBuf>,
    #[arg(long)]
    pub peano_dir: Option<PathBuf>,
    /// Directory searched first for aie-opt, aie-translate, bootgen, xclbinutil
    #[arg(long)]
    pub install_dir: Option<PathBuf>,
    /// Host runtime (xrt-lite, xrt)
    #[arg(long)]
    pub device_hal: Option<DeviceHal>,
    /// Compile cores with chess
    #[arg(long)]
    pub use_chess: bool,
    /// Micro-kernels to link (none, mm, all)
    #[arg(long)]
    pub ukernel: Option<UkernelSelection>,
    /// Extra peano opt flags, wrapped in double quotes
    #[arg(long, allow_hyphen_values = true)]
    pub additional_peano_opt_flags: Option<String>,
    /// Write the NPU instruction stream here
    #[arg(long)]
    pub npu_insts: Option<PathBuf>,
    /// Emit control packets
    #[arg(long)]
    pub emit_ctrl_pkts: bool,
    /// Existing xclbin to merge the new partition into
    #[arg(long)]
    pub xclbin_input: Option<PathBuf>,
    #[arg(long)]
    pub xclbin_kernel_name: Option<String>,
    #[arg(long)]
    pub xclbin_kernel_id: Option<String>,
    #[arg(long)]
    pub xclbin_instance_name: Option<String>,
    /// Directory of prebuilt micro-kernel objects
    #[arg(long)]
    pub prebuilt_objects: Option<PathBuf>,
    /// Echo tool invocations and per-stage progress
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut BuildConfig) {
        if let Some(npu) = self.npu_version {
            config.npu_version = npu;
            config.target_arch = npu.arch();
        }
        if let Some(arch) = self.target_arch {
            config.target_arch = arch;
        }
        override_path(&mut config.work_dir, &self.work_dir);
        override_opt(&mut config.vitis_dir, &self.vitis_dir);
        override_opt(&mut config.peano_dir, &self.peano_dir);
        override_opt(&mut config.install_dir, &self.install_dir);
        if let Some(hal) = self.device_hal {
            config.device_hal = hal;
        }
        config.use_chess |= self.use_chess;
        if let Some(ukernel) = self.ukernel {
            config.ukernel = ukernel;
        }
        if let Some(flags) = &self.additional_peano_opt_flags {
            config.additional_peano_opt_flags = flags.clone();
        }
        override_opt(&mut config.npu_insts_output, &self.npu_insts);
        config.emit_ctrl_pkts |= self.emit_ctrl_pkts;
        override_opt(&mut config.xclbin.input, &self.xclbin_input);
        if let Some(name) = &self.xclbin_kernel_name {
            config.xclbin.kernel_name = name.clone();
        }
        if let Some(id) = &self.xclbin_kernel_id {
            config.xclbin.kernel_id = id.clone();
        }
        if let Some(name) = &self.xclbin_instance_name {
            config.xclbin.instance_name = name.clone();
        }
        override_opt(&mut config.prebuilt_objects, &self.prebuilt_objects);
        config.verbose |= self.verbose;
    }
}

fn override_path(slot: &mut PathBuf, value: &Option<PathBuf>) {
    if let Some(v) = value {
        *slot = v.clone();
    }
}

fn override_opt<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        *slot = value.clone();
    }
}

/// Read a device program, resolving its IR source relative to the file.
pub fn load_device(path: &Path) -> Result<DeviceProgram> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut device =
        DeviceProgram::from_json(&text).with_context(|| format!("parsing {}", path.display()))?;
    if let (Some(source), Some(dir)) = (device.source.as_mut(), path.parent()) {
        if source.is_relative() {
            *source = dir.join(&*source);
        }
    }
    device
        .validate()
        .with_context(|| format!("validating {}", path.display()))?;
    Ok(device)
}

/// Run the build pipeline.
pub fn run(mut config: BuildConfig, args: &BuildArgs, env: &dyn EnvLookup) -> Result<()> {
    args.apply(&mut config);
    let mut device = load_device(&args.input)?;

    let translator = ToolTranslator::locate(
        config.install_dir.as_deref(),
        env,
        &config.work_dir,
        config.verbose,
    )?;
    let boot_image = BootgenTool::locate(config.install_dir.as_deref(), env, config.verbose)?;
    let mut cache = ObjectCache::new(config.work_dir.join("objects"));
    if let Some(dir) = &config.prebuilt_objects {
        cache = cache.with_prebuilt(dir);
    }
    let tools = BuildTools {
        translator: &translator,
        boot_image: &boot_image,
        cache: &cache,
        env,
    };

    let mut rng = StdRng::from_entropy();
    let output = build(&mut device, &config, &tools, &mut rng, &args.output)
        .with_context(|| format!("building {}", args.input.display()))?;

    println!("{}", output.report);
    println!("Wrote {}", output.artifact.display());
    Ok(())
}
