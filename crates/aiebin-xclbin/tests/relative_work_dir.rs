//! Builds configured with a work directory relative to the current directory.
//!
//! Changing the current directory affects the whole test binary, so this
//! file holds a single test.
#![cfg(unix)]

mod common;

use std::path::{Path, PathBuf};

use aiebin_toolchain::MapEnv;
use aiebin_xclbin::{build, BootgenTool, BuildConfig, BuildTools, ObjectCache};
use rand::rngs::StdRng;
use rand::SeedableRng;

use common::{two_core_device, FakeToolchain, FakeTranslator};

#[test]
fn chess_build_in_relative_work_dir() {
    let tc = FakeToolchain::new();
    let cwd = tempfile::tempdir().unwrap();
    std::env::set_current_dir(cwd.path()).unwrap();
    let base = std::env::current_dir().unwrap();

    let config = BuildConfig {
        use_chess: true,
        vitis_dir: Some(tc.vitis.clone()),
        ..tc.config(Path::new("aiebin-work"))
    };
    let env = MapEnv::new()
        .with("LM_LICENSE_FILE", "2100@licsrv")
        .with("PATH", "/usr/bin:/bin");
    let bootgen = BootgenTool::locate(Some(tc.install.as_path()), &env, false).unwrap();
    let cache = ObjectCache::new("aiebin-work/objects");
    let translator = FakeTranslator::default();
    let tools = BuildTools {
        translator: &translator,
        boot_image: &bootgen,
        cache: &cache,
        env: &env,
    };

    let output = build(
        &mut two_core_device(),
        &config,
        &tools,
        &mut StdRng::seed_from_u64(0),
        Path::new("final.pdi"),
    )
    .unwrap();

    let work = base.join("aiebin-work");
    assert_eq!(output.unified_object, work.join("input.o"));
    assert!(work.join("input.o").is_file());
    assert!(!work.join("aiebin-work").exists());
    let expected: Vec<PathBuf> = vec![work.join("core_0_0.elf"), work.join("core_1_0.elf")];
    assert_eq!(output.elfs, expected);
    assert!(expected.iter().all(|elf| elf.is_file()));

    let bif = std::fs::read_to_string(work.join("design.bif")).unwrap();
    for line in bif.lines().filter_map(|l| l.trim().strip_prefix("file=")) {
        assert!(Path::new(line).starts_with(&work), "{line}");
    }
    assert!(base.join("final.pdi").is_file());
}
