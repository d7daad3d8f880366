//! Configuration data object (CDO) emission.

use std::path::{Path, PathBuf};

use aiebin_device::DeviceProgram;

use crate::error::{Result, XclbinError};
use crate::translate::DeviceTranslator;

/// The three CDO segment files, in the order the boot image loads them.
pub const CDO_FILE_NAMES: [&str; 3] = ["aie_cdo_elfs.bin", "aie_cdo_init.bin", "aie_cdo_enable.bin"];

/// Paths of the emitted CDO segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdoFiles {
    pub elfs: PathBuf,
    pub init: PathBuf,
    pub enable: PathBuf,
}

impl CdoFiles {
    pub fn in_dir(dir: &Path) -> Self {
        let [elfs, init, enable] = CDO_FILE_NAMES.map(|name| dir.join(name));
        Self { elfs, init, enable }
    }

    pub fn paths(&self) -> [&Path; 3] {
        [&self.elfs, &self.init, &self.enable]
    }

    /// The same segments anchored at the current directory.
    pub fn absolute(&self) -> Result<Self> {
        let anchor = |p: &Path| std::path::absolute(p).map_err(|e| XclbinError::io(p, e));
        Ok(Self {
            elfs: anchor(&self.elfs)?,
            init: anchor(&self.init)?,
            enable: anchor(&self.enable)?,
        })
    }
}

/// Emit the CDO segments for `device` into `out_dir`.
///
/// Translation runs on a copy of the program, which is dropped afterwards on
/// both the success and failure paths.
pub fn generate_cdo(
    device: &DeviceProgram,
    translator: &dyn DeviceTranslator,
    out_dir: &Path,
) -> Result<CdoFiles> {
    let copy = device.clone();
    let emitted = translator.emit_cdo(&copy, out_dir);
    drop(copy);
    emitted.map_err(|e| {
        log::error!("failed to emit CDO");
        XclbinError::CdoEmission {
            detail: e.to_string(),
        }
    })?;

    let files = CdoFiles::in_dir(out_dir);
    if let Some(missing) = files.paths().into_iter().find(|p| !p.is_file()) {
        return Err(XclbinError::CdoEmission {
            detail: format!("translation did not produce {}", missing.display()),
        });
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PassManagerOptions;
    use crate::translate::LoweringOptions;
    use aiebin_device::TileCoord;

    struct CdoOnly {
        write: usize,
        fail: bool,
    }

    impl DeviceTranslator for CdoOnly {
        fn lower_to_llvm_ir(&self, _: &DeviceProgram, _: &LoweringOptions) -> Result<String> {
            unreachable!()
        }

        fn linker_script(&self, _: &DeviceProgram, _: TileCoord) -> Result<String> {
            unreachable!()
        }

        fn emit_cdo(&self, _: &DeviceProgram, out_dir: &Path) -> Result<()> {
            if self.fail {
                return Err(XclbinError::Translation {
                    stage: "CDO generation",
                    detail: "bad stream switch".into(),
                });
            }
            for name in &CDO_FILE_NAMES[..self.write] {
                std::fs::write(out_dir.join(name), b"cdo").unwrap();
            }
            Ok(())
        }

        fn emit_control_packets(&self, _: &DeviceProgram, _: &Path, _: &PassManagerOptions) -> Result<()> {
            unreachable!()
        }
    }

    #[test]
    fn produces_three_segments() {
        let dir = tempfile::tempdir().unwrap();
        let device = DeviceProgram::new("d");
        let files = generate_cdo(&device, &CdoOnly { write: 3, fail: false }, dir.path()).unwrap();
        assert_eq!(files.init, dir.path().join("aie_cdo_init.bin"));
    }

    #[test]
    fn translation_failure_is_cdo_failure() {
        let dir = tempfile::tempdir().unwrap();
        let device = DeviceProgram::new("d");
        let err = generate_cdo(&device, &CdoOnly { write: 0, fail: true }, dir.path()).unwrap_err();
        match err {
            XclbinError::CdoEmission { detail } => assert!(detail.contains("bad stream switch")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_segment_detected() {
        let dir = tempfile::tempdir().unwrap();
        let device = DeviceProgram::new("d");
        let err = generate_cdo(&device, &CdoOnly { write: 2, fail: false }, dir.path()).unwrap_err();
        assert!(err.to_string().contains("aie_cdo_enable.bin"));
    }
}
