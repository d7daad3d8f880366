//! Lowering the whole device program to one object file.

use std::path::Path;

use aiebin_device::DeviceProgram;
use aiebin_toolchain::{llc_args, locate_vitis, peano_opt_args, run_tool, EnvLookup};

use crate::assemble::{assemble_source, ChessAssembler};
use crate::config::BuildConfig;
use crate::error::{Result, XclbinError};
use crate::translate::{lowering_pipeline, DeviceTranslator, LoweringOptions};

/// Lower `device` to LLVM IR and compile it to `output`.
///
/// With chess the IR is compiled by `xchesscc`; otherwise it goes through
/// peano `opt` (baseline flags merged with the configured extras) and `llc`.
pub fn generate_unified_object(
    device: &DeviceProgram,
    config: &BuildConfig,
    translator: &dyn DeviceTranslator,
    env: &dyn EnvLookup,
    output: &Path,
) -> Result<()> {
    let options = LoweringOptions {
        lower_to_chess: config.use_chess,
        passes: config.pass_manager.clone(),
    };
    if config.verbose {
        log::info!("Running: {}", lowering_pipeline(options.lower_to_chess));
    }
    let llvm_ir = translator
        .lower_to_llvm_ir(device, &options)
        .inspect_err(|_| log::error!("Failed to lower to LLVM"))?;

    let work_dir = config.work_dir.as_path();
    if config.use_chess {
        let install = locate_vitis(config.vitis_dir.as_deref(), config.npu_version, env)?;
        let assembler = ChessAssembler {
            install: &install,
            work_dir,
            npu: config.npu_version,
            env,
            verbose: config.verbose,
        };
        assemble_source(&assembler, &llvm_ir, "input.ll", output, work_dir, &[], work_dir)?;
        return Ok(());
    }

    let peano = config.peano()?;
    let ll_file = work_dir.join("input.ll");
    std::fs::write(&ll_file, &llvm_ir).map_err(|e| XclbinError::io(&ll_file, e))?;

    let opt_ll_file = work_dir.join("input.opt.ll");
    let opt_args = peano_opt_args(&ll_file, &opt_ll_file, &config.additional_peano_opt_flags)?;
    run_tool(&peano.opt(), &opt_args, None, config.verbose)
        .inspect_err(|_| log::error!("Failed to optimize ll with peano"))?;

    run_tool(
        &peano.llc(),
        &llc_args(&opt_ll_file, output, config.target_arch),
        None,
        config.verbose,
    )
    .inspect_err(|_| log::error!("Failed to assemble ll with peano"))?;
    Ok(())
}
