//! Content-addressed cache of compiled objects.
//!
//! Objects compiled from embedded sources are keyed by a SHA-256 digest of
//! the source text, the hardware generation, and the object name, so a
//! changed kernel or generation never reuses a stale object. A single mutex
//! serializes lookups and compiles; pipelines sharing one cache never race
//! on the same object.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use aiebin_targets::NpuVersion;
use sha2::{Digest, Sha256};

use crate::error::{Result, XclbinError};
use crate::kernels::EmbeddedSource;

/// Cache of objects compiled from [`EmbeddedSource`]s.
#[derive(Debug)]
pub struct ObjectCache {
    dir: PathBuf,
    prebuilt: Option<PathBuf>,
    entries: Mutex<HashMap<String, PathBuf>>,
}

impl ObjectCache {
    /// Cache storing compiled objects under `dir`. A relative `dir` is
    /// anchored at the current directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let dir = match std::env::current_dir() {
            Ok(cwd) if dir.is_relative() => cwd.join(dir),
            _ => dir,
        };
        Self {
            dir,
            prebuilt: None,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Prefer `<dir>/<object_name>` when it exists over compiling.
    pub fn with_prebuilt(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prebuilt = Some(dir.into());
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Hex SHA-256 key for `source` compiled for `npu`.
    pub fn key(source: &EmbeddedSource, npu: NpuVersion) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.text.as_bytes());
        hasher.update([0]);
        hasher.update(npu.as_str().as_bytes());
        hasher.update([0]);
        hasher.update(source.object_name.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    /// Path of the object for `source`, compiling it with `compile` on a miss.
    ///
    /// `compile` receives the path the object must be written to. The
    /// object is moved under its key only once `compile` succeeds.
    pub fn get_or_compile<F>(&self, source: &EmbeddedSource, npu: NpuVersion, compile: F) -> Result<PathBuf>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        let key = Self::key(source, npu);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(path) = entries.get(&key).filter(|p| p.is_file()) {
            return Ok(path.clone());
        }

        if let Some(prebuilt) = self
            .prebuilt
            .as_ref()
            .map(|dir| dir.join(source.object_name))
            .filter(|p| p.is_file())
        {
            log::debug!("Using prebuilt {}", prebuilt.display());
            entries.insert(key, prebuilt.clone());
            return Ok(prebuilt);
        }

        let file_name = format!("{}-{}", &key[..16], source.object_name);
        let path = self.dir.join(&file_name);
        if !path.is_file() {
            std::fs::create_dir_all(&self.dir).map_err(|e| XclbinError::io(&self.dir, e))?;
            // Only a completed compile may appear under the key path.
            let partial = self
                .dir
                .join(format!("partial-{}-{file_name}", std::process::id()));
            if let Err(e) = compile(&partial) {
                let _ = std::fs::remove_file(&partial);
                return Err(e);
            }
            if !partial.is_file() {
                return Err(XclbinError::Assemble {
                    output: path.clone(),
                    source: Box::new(XclbinError::io(
                        &path,
                        std::io::Error::new(std::io::ErrorKind::NotFound, "compiler produced no object"),
                    )),
                });
            }
            std::fs::rename(&partial, &path).map_err(|e| XclbinError::io(&path, e))?;
        }
        entries.insert(key, path.clone());
        Ok(path)
    }
}
