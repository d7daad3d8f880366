//! Build report.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use aiebin_targets::NpuVersion;

use crate::config::DeviceHal;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    InstructionStream,
    UnifiedObject,
    CoreElfs,
    ControlPackets,
    Cdo,
    BootImage,
    Packaging,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::InstructionStream => "npu instructions",
            Stage::UnifiedObject => "unified object",
            Stage::CoreElfs => "core elfs",
            Stage::ControlPackets => "control packets",
            Stage::Cdo => "cdo",
            Stage::BootImage => "boot image",
            Stage::Packaging => "packaging",
        };
        f.pad(name)
    }
}

/// Summary of one completed build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub npu_version: NpuVersion,
    pub device_hal: DeviceHal,
    pub use_chess: bool,
    /// Wall-clock duration of every stage that ran.
    pub stages: Vec<(Stage, Duration)>,
    /// Files produced, in the order they were produced.
    pub artifacts: Vec<PathBuf>,
    pub total: Duration,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Build Report ===")?;
        writeln!(f, "NPU: {}", self.npu_version)?;
        writeln!(f, "HAL: {}", self.device_hal)?;
        writeln!(
            f,
            "Core compiler: {}",
            if self.use_chess { "chess" } else { "peano" }
        )?;
        writeln!(f, "Duration: {} ms", self.total.as_millis())?;

        writeln!(f)?;
        writeln!(f, "--- Stages ---")?;
        for (stage, duration) in &self.stages {
            writeln!(f, "  {stage:<18} {:>8.3} s", duration.as_secs_f64())?;
        }

        if !self.artifacts.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Artifacts ({}) ---", self.artifacts.len())?;
            for artifact in &self.artifacts {
                writeln!(f, "  {}", artifact.display())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_display() {
        let report = BuildReport {
            npu_version: NpuVersion::Npu1,
            device_hal: DeviceHal::XrtLite,
            use_chess: false,
            stages: vec![
                (Stage::UnifiedObject, Duration::from_millis(1500)),
                (Stage::BootImage, Duration::from_millis(20)),
            ],
            artifacts: vec![PathBuf::from("/w/core_0_2.elf")],
            total: Duration::from_millis(1520),
        };
        let text = report.to_string();
        assert!(text.contains("NPU: npu1"));
        assert!(text.contains("HAL: xrt-lite"));
        assert!(text.contains("Core compiler: peano"));
        assert!(text.contains("unified object"));
        assert!(text.contains("1.500 s"));
        assert!(text.contains("--- Artifacts (1) ---"));
    }
}
