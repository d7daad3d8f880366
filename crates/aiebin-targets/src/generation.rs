//! NPU hardware generations and core architectures.
//!
//! The generation is a closed set. Strings are validated once when a
//! configuration is parsed; everything downstream matches on the enum.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TargetError;

/// NPU hardware generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NpuVersion {
    /// Phoenix / Hawk Point (AIE-ML cores).
    Npu1,
    /// Strix (AIE2P cores).
    Npu4,
}

impl NpuVersion {
    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            NpuVersion::Npu1 => "npu1",
            NpuVersion::Npu4 => "npu4",
        }
    }

    /// Core architecture implemented by this generation.
    pub fn arch(self) -> TargetArch {
        match self {
            NpuVersion::Npu1 => TargetArch::Aie2,
            NpuVersion::Npu4 => TargetArch::Aie2p,
        }
    }

    /// Sub-directory of `aietools/tps/lnx64` holding the chess frontend and linker.
    pub fn chess_target_dir(self) -> &'static str {
        match self {
            NpuVersion::Npu1 => "target_aie_ml",
            NpuVersion::Npu4 => "target_aie2p",
        }
    }

    /// Value of the `__AIE_ARCH__` / `__AIEARCH__` macros.
    pub fn arch_version(self) -> &'static str {
        match self {
            NpuVersion::Npu1 => "20",
            NpuVersion::Npu4 => "21",
        }
    }

    /// Processor model directory under `aietools/data`.
    pub fn model_dir(self) -> &'static str {
        match self {
            NpuVersion::Npu1 => "aie_ml",
            NpuVersion::Npu4 => "aie2p",
        }
    }
}

impl fmt::Display for NpuVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NpuVersion {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "npu1" => Ok(NpuVersion::Npu1),
            "npu4" => Ok(NpuVersion::Npu4),
            _ => Err(TargetError::UnsupportedHardwareVersion { value: s.to_string() }),
        }
    }
}

impl TryFrom<String> for NpuVersion {
    type Error = TargetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NpuVersion> for String {
    fn from(value: NpuVersion) -> Self {
        value.as_str().to_string()
    }
}

/// AIE core architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetArch {
    Aie2,
    Aie2p,
}

impl TargetArch {
    /// Lowercase spelling used in target triples and `--march`.
    pub fn as_lower(self) -> &'static str {
        match self {
            TargetArch::Aie2 => "aie2",
            TargetArch::Aie2p => "aie2p",
        }
    }

    /// Triple passed to the peano compiler driver when linking core ELFs.
    pub fn elf_triple(self) -> String {
        format!("{}-none-unknown-elf", self.as_lower())
    }
}

impl fmt::Display for TargetArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetArch::Aie2 => f.write_str("AIE2"),
            TargetArch::Aie2p => f.write_str("AIE2P"),
        }
    }
}

impl FromStr for TargetArch {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aie2" | "aie-ml" | "aieml" => Ok(TargetArch::Aie2),
            "aie2p" => Ok(TargetArch::Aie2p),
            _ => Err(TargetError::UnsupportedArch { value: s.to_string() }),
        }
    }
}

impl TryFrom<String> for TargetArch {
    type Error = TargetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetArch> for String {
    fn from(value: TargetArch) -> Self {
        value.to_string()
    }
}
