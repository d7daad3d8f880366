//! `aiebin doctor`: toolchain discovery report.

use std::path::Path;

use aiebin_targets::NpuVersion;
use aiebin_toolchain::{locate_helper_tool, locate_vitis, EnvLookup, PeanoInstall};
use aiebin_xclbin::BuildConfig;
use anyhow::Result;

use crate::config::{ProjectConfig, CONFIG_FILE};

const HELPER_TOOLS: [&str; 4] = ["aie-opt", "aie-translate", "bootgen", "xclbinutil"];

/// Outcome of one discovery probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: String,
    pub status: std::result::Result<String, String>,
}

impl Check {
    fn new(name: impl Into<String>, status: std::result::Result<String, String>) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

/// Chess toolchain probes, one per hardware generation.
pub fn vitis_checks(config: &BuildConfig, env: &dyn EnvLookup) -> Vec<Check> {
    let mut checks = vec![Check::new(
        "license",
        env.license()
            .ok_or_else(|| "XILINXD_LICENSE_FILE and LM_LICENSE_FILE unset".to_string()),
    )];
    for npu in [NpuVersion::Npu1, NpuVersion::Npu4] {
        let status = locate_vitis(config.vitis_dir.as_deref(), npu, env)
            .map(|install| install.root.display().to_string())
            .map_err(|e| e.to_string());
        checks.push(Check::new(format!("vitis ({npu})"), status));
    }
    checks
}

/// Peano binary probes.
pub fn peano_checks(config: &BuildConfig) -> Vec<Check> {
    let Some(root) = config.peano_dir.as_deref() else {
        return vec![Check::new("peano", Err("peano-dir not configured".to_string()))];
    };
    let peano = PeanoInstall::new(root);
    [("opt", peano.opt()), ("llc", peano.llc()), ("clang", peano.clang())]
        .into_iter()
        .map(|(name, path)| {
            let status = if path.is_file() {
                Ok(path.display().to_string())
            } else {
                Err(format!("{} not found", path.display()))
            };
            Check::new(name, status)
        })
        .collect()
}

/// Helper tool probes, in the order the pipeline needs them.
pub fn helper_checks(config: &BuildConfig, env: &dyn EnvLookup) -> Vec<Check> {
    HELPER_TOOLS
        .iter()
        .map(|&name| {
            let status = locate_helper_tool(name, config.install_dir.as_deref(), env)
                .map(|p| p.display().to_string())
                .map_err(|e| e.to_string());
            Check::new(name, status)
        })
        .collect()
}

fn print_section(title: &str, checks: &[Check]) {
    println!("--- {title} ---");
    for check in checks {
        match &check.status {
            Ok(found) => println!("  {:<16} {found}", check.name),
            Err(problem) => println!("  {:<16} missing: {problem}", check.name),
        }
    }
    println!();
}

/// Print toolchain diagnostic information.
pub fn run(project_dir: &Path, env: &dyn EnvLookup) -> Result<()> {
    println!("=== aiebin Doctor ===");
    println!();
    println!("aiebin version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("--- Project Status ---");
    let config = match ProjectConfig::find_and_load(project_dir) {
        Ok(Some(project)) => {
            println!("  {CONFIG_FILE}: found");
            project.build
        }
        Ok(None) => {
            println!("  {CONFIG_FILE}: not found, using defaults");
            BuildConfig::default()
        }
        Err(e) => {
            println!("  {CONFIG_FILE}: error: {e:#}");
            BuildConfig::default()
        }
    };
    println!("  NPU:      {}", config.npu_version);
    println!("  HAL:      {}", config.device_hal);
    println!("  Work dir: {}", config.work_dir.display());
    println!();

    print_section("Chess (Vitis)", &vitis_checks(&config, env));
    print_section("Peano", &peano_checks(&config));
    print_section("Helper Tools", &helper_checks(&config, env));
    Ok(())
}
