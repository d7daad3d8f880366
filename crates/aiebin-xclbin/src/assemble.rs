//! Compiling in-memory sources to object files.

use std::path::{Path, PathBuf};

use aiebin_targets::NpuVersion;
use aiebin_toolchain::{chess_command, chess_compile_args, chess_env, EnvLookup, VitisInstall};

use crate::error::{Result, XclbinError};

/// Compiles one source file to one object file.
pub trait FileAssembler {
    fn assemble_file(&self, input: &Path, output: &Path, extra_args: &[String]) -> Result<()>;
}

/// Compiles with `xchesscc` from a Vitis install.
pub struct ChessAssembler<'a> {
    pub install: &'a VitisInstall,
    pub work_dir: &'a Path,
    pub npu: NpuVersion,
    pub env: &'a dyn EnvLookup,
    pub verbose: bool,
}

impl FileAssembler for ChessAssembler<'_> {
    fn assemble_file(&self, input: &Path, output: &Path, extra_args: &[String]) -> Result<()> {
        let cmd = chess_command(self.install, self.work_dir, self.npu, self.verbose)
            .args(chess_compile_args(input, output, extra_args));
        let env = chess_env(self.install, self.npu, self.env);
        cmd.run(Some(env.as_slice()), self.verbose)?;
        Ok(())
    }
}

/// Write `content` to `work_dir/source_name` and compile it.
///
/// A relative `output_name` is resolved against `output_dir`. Returns the
/// object path.
pub fn assemble_source(
    assembler: &dyn FileAssembler,
    content: &str,
    source_name: &str,
    output_name: &Path,
    output_dir: &Path,
    extra_args: &[String],
    work_dir: &Path,
) -> Result<PathBuf> {
    let input = work_dir.join(source_name);
    std::fs::write(&input, content).map_err(|e| {
        log::error!("Failed to dump to disk {}", input.display());
        XclbinError::io(&input, e)
    })?;

    let output = if output_name.is_absolute() {
        output_name.to_path_buf()
    } else {
        output_dir.join(output_name)
    };
    assembler
        .assemble_file(&input, &output, extra_args)
        .map_err(|source| {
            log::error!("Failed to assemble {}", output.display());
            XclbinError::Assemble {
                output: output.clone(),
                source: Box::new(source),
            }
        })?;
    Ok(output)
}
