//! Per-core ELF generation.

use std::path::{Path, PathBuf};

use aiebin_device::{DeviceProgram, TileCoord};
use aiebin_targets::CoreMemoryMap;
use aiebin_toolchain::{
    chess_command, chess_env, chess_link_args, locate_vitis, peano_link_args, run_tool, EnvLookup,
    VitisInstall,
};

use crate::assemble::{assemble_source, ChessAssembler};
use crate::cache::ObjectCache;
use crate::config::BuildConfig;
use crate::error::{Result, XclbinError};
use crate::kernels::{matmul_ukernel, EmbeddedSource, CHESS_INTRINSIC_WRAPPER};
use crate::translate::DeviceTranslator;

/// Link one ELF per core from the unified object `obj_file`.
///
/// Cores without an ELF name get `core_<col>_<row>.elf`, recorded on the
/// device. ELFs land in the work directory; their paths are returned in tile
/// order. The first failing core aborts the whole step.
pub fn generate_core_elf_files(
    device: &mut DeviceProgram,
    obj_file: &Path,
    config: &BuildConfig,
    translator: &dyn DeviceTranslator,
    cache: &ObjectCache,
    env: &dyn EnvLookup,
) -> Result<Vec<PathBuf>> {
    let mut elfs = Vec::new();
    for coord in device.core_tiles() {
        let Some(core) = device.core_mut(coord) else {
            continue;
        };
        let elf_name = core.ensure_elf_file(coord).to_string();
        let elf = config.work_dir.join(&elf_name);

        let core_build = CoreBuild {
            device: &*device,
            coord,
            obj_file,
            elf_name: &elf_name,
            elf: &elf,
            config,
            translator,
            cache,
            env,
        };
        core_build.run().map_err(|source| {
            log::error!("Failed to generate elf for core {coord}");
            XclbinError::CoreElf {
                col: coord.col,
                row: coord.row,
                source: Box::new(source),
            }
        })?;
        elfs.push(elf);
    }
    Ok(elfs)
}

struct CoreBuild<'a> {
    device: &'a DeviceProgram,
    coord: TileCoord,
    obj_file: &'a Path,
    elf_name: &'a str,
    elf: &'a Path,
    config: &'a BuildConfig,
    translator: &'a dyn DeviceTranslator,
    cache: &'a ObjectCache,
    env: &'a dyn EnvLookup,
}

impl CoreBuild<'_> {
    fn run(&self) -> Result<()> {
        let config = self.config;
        let ukernel = if config.ukernel.links_matmul() {
            let install = locate_vitis(config.vitis_dir.as_deref(), config.npu_version, self.env)
                .map_err(|source| XclbinError::UkernelRequiresChess { source })?;
            Some(self.cached_object(&install, &matmul_ukernel(config.npu_version))?)
        } else {
            None
        };

        if config.use_chess {
            self.link_with_chess(ukernel)
        } else {
            self.link_with_peano(ukernel)
        }
    }

    fn cached_object(&self, install: &VitisInstall, source: &EmbeddedSource) -> Result<PathBuf> {
        let work_dir = self.config.work_dir.as_path();
        let assembler = ChessAssembler {
            install,
            work_dir,
            npu: self.config.npu_version,
            env: self.env,
            verbose: self.config.verbose,
        };
        self.cache
            .get_or_compile(source, self.config.npu_version, |output| {
                assemble_source(
                    &assembler,
                    source.text,
                    source.file_name,
                    output,
                    work_dir,
                    &[],
                    work_dir,
                )
                .map(|_| ())
            })
    }

    fn link_with_chess(&self, ukernel: Option<PathBuf>) -> Result<()> {
        let config = self.config;
        let npu = config.npu_version;
        let install = locate_vitis(config.vitis_dir.as_deref(), npu, self.env)?;
        let intrinsics = self.cached_object(&install, &CHESS_INTRINSIC_WRAPPER)?;

        let bcf_path = config.work_dir.join(format!("{}.bcf", self.elf_name));
        let bcf = self
            .translator
            .bcf(self.device, self.coord, &CoreMemoryMap::for_npu(npu))?;
        std::fs::write(&bcf_path, bcf).map_err(|e| XclbinError::io(&bcf_path, e))?;

        let mut objects = vec![self.obj_file.to_path_buf(), intrinsics];
        objects.extend(ukernel);
        let cmd = chess_command(&install, &config.work_dir, npu, config.verbose)
            .args(chess_link_args(&objects, &bcf_path, self.elf));
        let env = chess_env(&install, npu, self.env);
        cmd.run(Some(env.as_slice()), config.verbose)?;
        Ok(())
    }

    fn link_with_peano(&self, ukernel: Option<PathBuf>) -> Result<()> {
        let config = self.config;
        let peano = config.peano()?;

        let ld_path = config.work_dir.join(format!("{}.ld", self.elf_name));
        let script = self.translator.linker_script(self.device, self.coord)?;
        std::fs::write(&ld_path, script).map_err(|e| XclbinError::io(&ld_path, e))?;

        let mut objects = vec![self.obj_file.to_path_buf()];
        objects.extend(ukernel);
        // the compiler driver injects libc and crt paths into the link
        let args = peano_link_args(&objects, config.target_arch, &ld_path, self.elf, config.verbose);
        run_tool(&peano.clang(), &args, None, config.verbose)?;
        Ok(())
    }
}
