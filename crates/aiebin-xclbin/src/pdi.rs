//! Boot image (PDI) composition.

use std::path::{Path, PathBuf};

use aiebin_toolchain::{locate_helper_tool, run_tool, EnvLookup};

use crate::cdo::CdoFiles;
use crate::error::{Result, XclbinError};

/// `design.bif` descriptor listing the CDO segments of one AIE image.
#[derive(Debug, Clone)]
pub struct BootImageDescriptor {
    pub cdo: CdoFiles,
}

impl BootImageDescriptor {
    pub fn render(&self) -> String {
        format!(
            "all:\n\
             {{\n  \
             id_code = 0x14ca8093\n  \
             extended_id_code = 0x01\n  \
             image\n  \
             {{\n    \
             name=aie_image, id=0x1c000000\n    \
             {{ type=cdo\n      \
             file={}\n      \
             file={}\n      \
             file={}\n    \
             }}\n  \
             }}\n\
             }}",
            self.cdo.elfs.display(),
            self.cdo.init.display(),
            self.cdo.enable.display(),
        )
    }
}

/// One boot image generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootgenRequest {
    pub bif: PathBuf,
    pub output: PathBuf,
}

impl BootgenRequest {
    /// Argument vector in `main` convention; element 0 is the empty program name.
    pub fn argv(&self) -> Vec<String> {
        vec![
            String::new(),
            "-arch".into(),
            "versal".into(),
            "-image".into(),
            self.bif.display().to_string(),
            "-o".into(),
            self.output.display().to_string(),
            "-w".into(),
        ]
    }
}

/// Produces a boot image from a descriptor.
pub trait BootImageGenerator {
    fn generate(&self, request: &BootgenRequest) -> Result<()>;
}

/// Runs the `bootgen` helper tool.
#[derive(Debug, Clone)]
pub struct BootgenTool {
    pub program: PathBuf,
    pub verbose: bool,
}

impl BootgenTool {
    pub fn locate(install_dir: Option<&Path>, env: &dyn EnvLookup, verbose: bool) -> Result<Self> {
        Ok(Self {
            program: locate_helper_tool("bootgen", install_dir, env)?,
            verbose,
        })
    }
}

impl BootImageGenerator for BootgenTool {
    fn generate(&self, request: &BootgenRequest) -> Result<()> {
        let argv = request.argv();
        run_tool(&self.program, &argv[1..], None, self.verbose)
            .map(|_| ())
            .map_err(|e| XclbinError::BootImage {
                detail: e.to_string(),
            })
    }
}

/// Write `design.bif` into `work_dir` and generate the boot image at `output`.
pub fn generate_pdi(
    cdo: &CdoFiles,
    work_dir: &Path,
    output: &Path,
    generator: &dyn BootImageGenerator,
) -> Result<PathBuf> {
    let bif = work_dir.join("design.bif");
    // bootgen resolves `file=` entries against its own working directory.
    let descriptor = BootImageDescriptor { cdo: cdo.absolute()? };
    std::fs::write(&bif, descriptor.render()).map_err(|e| {
        log::error!("failed to open design.bif");
        XclbinError::io(&bif, e)
    })?;

    generator
        .generate(&BootgenRequest {
            bif,
            output: output.to_path_buf(),
        })
        .map_err(|e| {
            log::error!("failed to execute bootgen");
            match e {
                XclbinError::BootImage { .. } => e,
                other => XclbinError::BootImage {
                    detail: other.to_string(),
                },
            }
        })?;
    Ok(output.to_path_buf())
}
