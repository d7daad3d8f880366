//! IR translation boundary.
//!
//! Lowering a device program to LLVM IR, emitting linker scripts, CDO
//! binaries, and control packets all belong to the IR layer. The pipeline
//! reaches them through [`DeviceTranslator`]; [`ToolTranslator`] drives the
//! `aie-opt` and `aie-translate` helper tools over the program's textual IR.

use std::path::{Path, PathBuf};

use aiebin_device::{translate_to_bcf, DeviceProgram, TileCoord};
use aiebin_targets::CoreMemoryMap;
use aiebin_toolchain::{locate_helper_tool, EnvLookup, ToolCommand};

use crate::config::PassManagerOptions;
use crate::error::{Result, XclbinError};

/// Options for lowering core code to LLVM IR.
#[derive(Debug, Clone, Default)]
pub struct LoweringOptions {
    /// Emit intrinsics in the form chess expects.
    pub lower_to_chess: bool,
    pub passes: PassManagerOptions,
}

/// Textual pass pipeline that lowers core bodies to the LLVM dialect.
pub fn lowering_pipeline(lower_to_chess: bool) -> String {
    let passes = [
        format!("aie-core-to-standard{{lower-to-chess={lower_to_chess}}}"),
        "finalize-memref-to-llvm".into(),
        "canonicalize".into(),
        "cse".into(),
        "convert-func-to-llvm{use-bare-ptr-memref-call-conv=true}".into(),
        "convert-arith-to-llvm".into(),
        "canonicalize".into(),
        "cse".into(),
        "convert-cf-to-llvm".into(),
        "canonicalize".into(),
        "cse".into(),
    ];
    format!("builtin.module({})", passes.join(","))
}

/// IR-layer services used by the build pipeline.
pub trait DeviceTranslator {
    /// Lower every core of `device` into one LLVM IR module.
    fn lower_to_llvm_ir(&self, device: &DeviceProgram, options: &LoweringOptions)
        -> Result<String>;

    /// Chess linker descriptor for the core at `coord`.
    fn bcf(&self, device: &DeviceProgram, coord: TileCoord, map: &CoreMemoryMap) -> Result<String> {
        Ok(translate_to_bcf(device, coord, map)?)
    }

    /// Linker script for the core at `coord`.
    fn linker_script(&self, device: &DeviceProgram, coord: TileCoord) -> Result<String>;

    /// Write `aie_cdo_elfs.bin`, `aie_cdo_init.bin` and `aie_cdo_enable.bin`
    /// into `out_dir`. Core ELFs must already exist there.
    fn emit_cdo(&self, device: &DeviceProgram, out_dir: &Path) -> Result<()>;

    /// Convert the device into control packets built from the ELFs in
    /// `elf_dir`.
    fn emit_control_packets(
        &self,
        device: &DeviceProgram,
        elf_dir: &Path,
        passes: &PassManagerOptions,
    ) -> Result<()>;
}

/// Translator backed by the `aie-opt` and `aie-translate` helper tools.
#[derive(Debug, Clone)]
pub struct ToolTranslator {
    pub aie_opt: PathBuf,
    pub aie_translate: PathBuf,
    /// Directory for intermediate IR files.
    pub work_dir: PathBuf,
    pub verbose: bool,
}

impl ToolTranslator {
    /// Find both helper tools.
    pub fn locate(
        install_dir: Option<&Path>,
        env: &dyn EnvLookup,
        work_dir: &Path,
        verbose: bool,
    ) -> Result<Self> {
        Ok(Self {
            aie_opt: locate_helper_tool("aie-opt", install_dir, env)?,
            aie_translate: locate_helper_tool("aie-translate", install_dir, env)?,
            work_dir: work_dir.to_path_buf(),
            verbose,
        })
    }

    fn source<'a>(&self, device: &'a DeviceProgram, stage: &'static str) -> Result<&'a Path> {
        device.source.as_deref().ok_or_else(|| XclbinError::Translation {
            stage,
            detail: format!("device '{}' has no IR source file", device.name),
        })
    }

    fn run(&self, cmd: ToolCommand, stage: &'static str) -> Result<()> {
        cmd.run(None, self.verbose)
            .map(|_| ())
            .map_err(|e| XclbinError::Translation {
                stage,
                detail: e.to_string(),
            })
    }

    fn translate_to_string(&self, args: Vec<String>, out: PathBuf, stage: &'static str) -> Result<String> {
        let cmd = ToolCommand::new(&self.aie_translate)
            .args(args)
            .arg("-o")
            .arg(out.display().to_string());
        self.run(cmd, stage)?;
        std::fs::read_to_string(&out).map_err(|e| XclbinError::io(out, e))
    }
}

fn pass_manager_flags(passes: &PassManagerOptions) -> Vec<String> {
    let mut flags = Vec::new();
    if passes.print_ir_before_all {
        flags.push("--mlir-print-ir-before-all".to_string());
    }
    if passes.print_ir_after_all {
        flags.push("--mlir-print-ir-after-all".to_string());
    }
    if passes.print_ir_module_scope {
        // module-scope printing is rejected with a multithreaded context
        flags.push("--mlir-print-ir-module-scope".to_string());
        flags.push("--mlir-disable-threading".to_string());
    }
    if passes.timing {
        flags.push("--mlir-timing".to_string());
    }
    flags
}

impl DeviceTranslator for ToolTranslator {
    fn lower_to_llvm_ir(
        &self,
        device: &DeviceProgram,
        options: &LoweringOptions,
    ) -> Result<String> {
        let stage = "lowering to LLVM";
        let source = self.source(device, stage)?;
        let lowered = self.work_dir.join("input.lowered.mlir");
        let opt = ToolCommand::new(&self.aie_opt)
            .arg(format!(
                "--pass-pipeline={}",
                lowering_pipeline(options.lower_to_chess)
            ))
            .args(pass_manager_flags(&options.passes))
            .arg(source.display().to_string())
            .arg("-o")
            .arg(lowered.display().to_string());
        self.run(opt, stage)?;

        self.translate_to_string(
            vec!["--mlir-to-llvmir".into(), lowered.display().to_string()],
            self.work_dir.join("input.translated.ll"),
            "translating module to LLVM IR",
        )
    }

    fn linker_script(&self, device: &DeviceProgram, coord: TileCoord) -> Result<String> {
        let stage = "linker script generation";
        let source = self.source(device, stage)?;
        self.translate_to_string(
            vec![
                "--aie-generate-ldscript".into(),
                format!("--tilecol={}", coord.col),
                format!("--tilerow={}", coord.row),
                source.display().to_string(),
            ],
            self.work_dir
                .join(format!("ldscript_{}_{}.tmp", coord.col, coord.row)),
            stage,
        )
    }

    fn emit_cdo(&self, device: &DeviceProgram, out_dir: &Path) -> Result<()> {
        let stage = "CDO generation";
        let source = self.source(device, stage)?;
        let cmd = ToolCommand::new(&self.aie_translate).args([
            "--aie-generate-cdo".to_string(),
            format!("--work-dir-path={}", out_dir.display()),
            source.display().to_string(),
        ]);
        self.run(cmd, stage)
    }

    fn emit_control_packets(
        &self,
        device: &DeviceProgram,
        elf_dir: &Path,
        passes: &PassManagerOptions,
    ) -> Result<()> {
        let stage = "control packet generation";
        let source = self.source(device, stage)?;
        let cmd = ToolCommand::new(&self.aie_opt)
            .arg(format!(
                "--pass-pipeline=builtin.module(aie-convert-device-to-control-packets{{path-to-elfs={}}},aie-split-control-packet-data)",
                elf_dir.display()
            ))
            .args(pass_manager_flags(passes))
            .arg(source.display().to_string())
            .arg("-o")
            .arg(elf_dir.join("ctrlpkt.mlir").display().to_string());
        self.run(cmd, stage)
    }
}
