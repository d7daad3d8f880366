//! `aiebin.toml` project configuration.

use std::path::{Path, PathBuf};

use aiebin_xclbin::BuildConfig;
use anyhow::{Context, Result};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "aiebin.toml";

/// The top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    /// Build settings; every field is optional.
    #[serde(default)]
    pub build: BuildConfig,
}

impl ProjectConfig {
    /// Parse the file at `path`. Relative paths inside it are taken relative
    /// to the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let mut config: ProjectConfig =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        if let Some(dir) = path.parent() {
            config.anchor_paths(dir);
        }
        Ok(config)
    }

    /// Search upward from `start_dir` for `aiebin.toml`.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<Self>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Self::load(&candidate).map(Some);
            }
            if !dir.pop() {
                return Ok(None);
            }
        }
    }

    fn anchor_paths(&mut self, dir: &Path) {
        let anchor = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = dir.join(&*p);
            }
        };
        let build = &mut self.build;
        anchor(&mut build.work_dir);
        for path in [
            &mut build.vitis_dir,
            &mut build.peano_dir,
            &mut build.install_dir,
            &mut build.npu_insts_output,
            &mut build.prebuilt_objects,
            &mut build.xclbin.input,
        ]
        .into_iter()
        .flatten()
        {
            anchor(path);
        }
    }
}
