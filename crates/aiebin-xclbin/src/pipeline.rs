//! Build pipeline orchestrator.

use std::path::{Path, PathBuf};
use std::time::Instant;

use aiebin_device::{emit_npu_instructions, DeviceProgram};
use aiebin_toolchain::{locate_helper_tool, EnvLookup};
use rand::RngCore;

use crate::cache::ObjectCache;
use crate::cdo::generate_cdo;
use crate::config::{BuildConfig, DeviceHal};
use crate::elf::generate_core_elf_files;
use crate::error::{Result, XclbinError};
use crate::pdi::{generate_pdi, BootImageGenerator};
use crate::report::{BuildReport, Stage};
use crate::translate::DeviceTranslator;
use crate::unified::generate_unified_object;
use crate::xclbin::generate_xclbin;

/// Collaborators a build runs against.
pub struct BuildTools<'a> {
    pub translator: &'a dyn DeviceTranslator,
    pub boot_image: &'a dyn BootImageGenerator,
    pub cache: &'a ObjectCache,
    pub env: &'a dyn EnvLookup,
}

/// Output of a successful build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// The requested artifact: a copy of the boot image, or the container.
    pub artifact: PathBuf,
    pub unified_object: PathBuf,
    pub elfs: Vec<PathBuf>,
    pub pdi: PathBuf,
    pub npu_instructions: Option<PathBuf>,
    pub report: BuildReport,
}

struct StageClock {
    stages: Vec<(Stage, std::time::Duration)>,
    verbose: bool,
}

impl StageClock {
    fn time<T>(&mut self, stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T> {
        if self.verbose {
            log::info!("Stage: {stage}");
        }
        let start = Instant::now();
        let result = f();
        self.stages.push((stage, start.elapsed()));
        result
    }
}

/// Build `device` into `artifact`.
///
/// Stages run strictly in order and the first failure ends the build:
/// instruction stream (when requested), unified object, core ELFs, control
/// packets (when requested), CDO, boot image, then either a copy of the boot
/// image (`xrt-lite`) or xclbin packaging (`xrt`). Every intermediate file is
/// written to the configured work directory, which must not be shared with a
/// concurrent build.
pub fn build(
    device: &mut DeviceProgram,
    config: &BuildConfig,
    tools: &BuildTools<'_>,
    rng: &mut dyn RngCore,
    artifact: &Path,
) -> Result<BuildOutput> {
    let start = Instant::now();
    std::fs::create_dir_all(&config.work_dir).map_err(|e| XclbinError::io(&config.work_dir, e))?;
    // Tools run from other directories, so every stage sees an absolute work dir.
    let config = &BuildConfig {
        work_dir: std::path::absolute(&config.work_dir)
            .map_err(|e| XclbinError::io(&config.work_dir, e))?,
        ..config.clone()
    };
    let work_dir = config.work_dir.as_path();

    let mut clock = StageClock {
        stages: Vec::new(),
        verbose: config.verbose,
    };
    let mut artifacts = Vec::new();

    let npu_instructions = match &config.npu_insts_output {
        Some(path) => {
            clock.time(Stage::InstructionStream, || {
                Ok(emit_npu_instructions(device, path)?)
            })?;
            artifacts.push(path.clone());
            Some(path.clone())
        }
        None => None,
    };

    let unified_object = work_dir.join("input.o");
    clock.time(Stage::UnifiedObject, || {
        generate_unified_object(device, config, tools.translator, tools.env, &unified_object)
    })
    .inspect_err(|_| log::error!("Failed to generate unified object"))?;
    artifacts.push(unified_object.clone());

    let elfs = clock
        .time(Stage::CoreElfs, || {
            generate_core_elf_files(
                device,
                &unified_object,
                config,
                tools.translator,
                tools.cache,
                tools.env,
            )
        })
        .inspect_err(|_| log::error!("Failed to generate core ELF file(s)"))?;
    artifacts.extend(elfs.iter().cloned());

    if config.emit_ctrl_pkts {
        clock
            .time(Stage::ControlPackets, || {
                tools
                    .translator
                    .emit_control_packets(device, work_dir, &config.pass_manager)
            })
            .inspect_err(|_| log::error!("Failed to generate control packets MLIR file"))?;
    }

    let cdo = clock
        .time(Stage::Cdo, || generate_cdo(device, tools.translator, work_dir))
        .inspect_err(|_| log::error!("Failed to generate CDO"))?;
    artifacts.extend(cdo.paths().iter().map(|p| p.to_path_buf()));

    let pdi = clock
        .time(Stage::BootImage, || {
            generate_pdi(&cdo, work_dir, &work_dir.join("design.pdi"), tools.boot_image)
        })
        .inspect_err(|_| log::error!("Failed to generate PDI"))?;
    artifacts.push(pdi.clone());

    clock.time(Stage::Packaging, || match config.device_hal {
        DeviceHal::XrtLite => std::fs::copy(&pdi, artifact)
            .map(|_| ())
            .map_err(|e| {
                log::error!("Failed to copy file because: {e}");
                XclbinError::io(artifact, e)
            }),
        DeviceHal::Xrt => {
            let xclbinutil =
                locate_helper_tool("xclbinutil", config.install_dir.as_deref(), tools.env)?;
            generate_xclbin(
                work_dir,
                artifact,
                &config.xclbin,
                &xclbinutil,
                rng,
                config.verbose,
            )
            .inspect_err(|_| log::error!("Failed to generate XCLBin"))
        }
    })?;
    artifacts.push(artifact.to_path_buf());

    let report = BuildReport {
        npu_version: config.npu_version,
        device_hal: config.device_hal,
        use_chess: config.use_chess,
        stages: clock.stages,
        artifacts,
        total: start.elapsed(),
    };
    Ok(BuildOutput {
        artifact: artifact.to_path_buf(),
        unified_object,
        elfs,
        pdi,
        npu_instructions,
        report,
    })
}
