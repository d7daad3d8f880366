//! Environment variable lookup.
//!
//! Discovery and tool environments read variables through [`EnvLookup`] so
//! callers can pin them in tests instead of mutating the process environment.

use std::collections::HashMap;

/// Variables consulted for the Xilinx license, in priority order.
pub const LICENSE_VARS: [&str; 2] = ["XILINXD_LICENSE_FILE", "LM_LICENSE_FILE"];

/// Name the chess toolchain reads its license from.
pub const CANONICAL_LICENSE_VAR: &str = "XILINXD_LICENSE_FILE";

/// Separator between entries of `PATH`-like variables.
pub const PATH_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// Source of environment variables.
pub trait EnvLookup {
    /// Value of `key`, or `None` if unset or not valid unicode.
    fn var(&self, key: &str) -> Option<String>;

    /// First license variable that is set.
    fn license(&self) -> Option<String> {
        LICENSE_VARS.iter().find_map(|key| self.var(key))
    }
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct MapEnv(HashMap<String, String>);

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl EnvLookup for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn license_prefers_xilinxd() {
        let env = MapEnv::new()
            .with("LM_LICENSE_FILE", "/opt/lm.lic")
            .with("XILINXD_LICENSE_FILE", "/opt/x.lic");
        assert_eq!(env.license().as_deref(), Some("/opt/x.lic"));
    }

    #[test]
    fn license_falls_back_to_lm() {
        let env = MapEnv::new().with("LM_LICENSE_FILE", "2100@licsrv");
        assert_eq!(env.license().as_deref(), Some("2100@licsrv"));
        assert_eq!(MapEnv::new().license(), None);
    }
}
