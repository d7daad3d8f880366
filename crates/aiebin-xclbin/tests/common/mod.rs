//! Fake toolchains and translators for pipeline tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use aiebin_device::{Core, DeviceProgram, Tile, TileCoord};
use aiebin_targets::NpuVersion;
use aiebin_xclbin::{
    BuildConfig, DeviceTranslator, LoweringOptions, PassManagerOptions, Result, CDO_FILE_NAMES,
};
use sha2::{Digest, Sha256};
use tempfile::TempDir;

/// Writes its own name and arguments to the file following `-o`.
const WRITE_OUTPUT: &str = r#"out=""
all="$*"
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then shift; out="$1"; fi
  shift
done
[ -n "$out" ] || exit 1
echo "$0 $all" > "$out""#;

/// Copies dumped or assembled partition JSON so the "container" is the
/// partition document itself.
const XCLBINUTIL: &str = r#"echo "$*" >> "$(dirname "$0")/xclbinutil.calls"
mode=assemble; part=""; input=""; output=""
while [ $# -gt 0 ]; do
  case "$1" in
    --dump-section) mode=dump; shift; part="${1#AIE_PARTITION:JSON:}" ;;
    --add-replace-section) shift
      case "$1" in AIE_PARTITION:JSON:*) part="${1#AIE_PARTITION:JSON:}" ;; esac ;;
    --input) shift; input="$1" ;;
    --output) shift; output="$1" ;;
  esac
  shift
done
if [ "$mode" = dump ]; then cp "$input" "$part"; else cp "$part" "$output"; fi"#;

/// Concatenates the descriptor into the image so its content is checkable.
const BOOTGEN: &str = r#"bif=""; out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -image) shift; bif="$1" ;;
    -o) shift; out="$1" ;;
  esac
  shift
done
{ echo "PDI"; cat "$bif"; } > "$out""#;

pub fn executable(path: &Path, body: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Temporary install trees for peano, Vitis, and the helper tools.
pub struct FakeToolchain {
    pub root: TempDir,
    pub peano: PathBuf,
    pub vitis: PathBuf,
    pub install: PathBuf,
}

impl FakeToolchain {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let peano = root.path().join("peano");
        for tool in ["opt", "llc", "clang"] {
            executable(&peano.join("bin").join(tool), WRITE_OUTPUT);
        }

        let vitis = root.path().join("vitis");
        for npu in [NpuVersion::Npu1, NpuVersion::Npu4] {
            let bin = vitis
                .join("aietools/tps/lnx64")
                .join(npu.chess_target_dir())
                .join("bin/LNa64bin");
            executable(&bin.join("chess-clang"), "exit 0");
            executable(&bin.join("chess-llvm-link"), "exit 0");
        }
        executable(
            &vitis.join("aietools/bin/unwrapped/lnx64.o/xchesscc"),
            WRITE_OUTPUT,
        );

        let install = root.path().join("install");
        executable(&install.join("bin/bootgen"), BOOTGEN);
        executable(&install.join("bin/xclbinutil"), XCLBINUTIL);

        Self {
            root,
            peano,
            vitis,
            install,
        }
    }

    /// Peano build into `work_dir` producing a raw boot image.
    pub fn config(&self, work_dir: &Path) -> BuildConfig {
        BuildConfig {
            work_dir: work_dir.to_path_buf(),
            peano_dir: Some(self.peano.clone()),
            install_dir: Some(self.install.clone()),
            ..BuildConfig::for_npu(NpuVersion::Npu1)
        }
    }

    pub fn xclbinutil_calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.install.join("bin/xclbinutil.calls"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Make a tool fail with `message` on stderr.
    pub fn break_tool(&self, path: &Path, message: &str) {
        executable(path, &format!("echo '{message}' >&2; exit 1"));
    }
}

/// Two cores side by side, without preassigned ELF names.
pub fn two_core_device() -> DeviceProgram {
    let mut device = DeviceProgram::new("npu1_4col")
        .with_tile(Tile::new(0, 0).with_core(Core::new()))
        .unwrap()
        .with_tile(Tile::new(1, 0).with_core(Core::new()))
        .unwrap();
    device.npu_instructions = Some(vec![0x0600_0100, 0x0000_0105, 0xdead_beef]);
    device
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Lower { lower_to_chess: bool },
    Bcf(TileCoord),
    LinkerScript(TileCoord),
    Cdo,
    ControlPackets,
}

/// Translator that writes placeholder outputs and records what was asked.
#[derive(Default)]
pub struct FakeTranslator {
    pub calls: RefCell<Vec<Call>>,
}

impl FakeTranslator {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl DeviceTranslator for FakeTranslator {
    fn lower_to_llvm_ir(&self, device: &DeviceProgram, options: &LoweringOptions) -> Result<String> {
        self.calls.borrow_mut().push(Call::Lower {
            lower_to_chess: options.lower_to_chess,
        });
        Ok(format!("; ModuleID = '{}'\n", device.name))
    }

    fn bcf(
        &self,
        device: &DeviceProgram,
        coord: TileCoord,
        map: &aiebin_targets::CoreMemoryMap,
    ) -> Result<String> {
        self.calls.borrow_mut().push(Call::Bcf(coord));
        Ok(aiebin_device::translate_to_bcf(device, coord, map)?)
    }

    fn linker_script(&self, _: &DeviceProgram, coord: TileCoord) -> Result<String> {
        self.calls.borrow_mut().push(Call::LinkerScript(coord));
        Ok(format!("/* core {coord} */\n"))
    }

    fn emit_cdo(&self, _: &DeviceProgram, out_dir: &Path) -> Result<()> {
        self.calls.borrow_mut().push(Call::Cdo);
        for name in CDO_FILE_NAMES {
            std::fs::write(out_dir.join(name), name).unwrap();
        }
        Ok(())
    }

    fn emit_control_packets(&self, _: &DeviceProgram, elf_dir: &Path, _: &PassManagerOptions) -> Result<()> {
        self.calls.borrow_mut().push(Call::ControlPackets);
        std::fs::write(elf_dir.join("ctrlpkt.mlir"), "module {}").unwrap();
        Ok(())
    }
}

pub fn sha256_file(path: &Path) -> String {
    let bytes = std::fs::read(path).unwrap();
    Sha256::digest(&bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
