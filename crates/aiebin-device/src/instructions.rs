//! NPU instruction stream emission.
//!
//! The host runtime loads the instruction stream as text: one 32-bit word per
//! line in uppercase, zero-padded hex, with no newline after the last word.

use std::path::Path;

use crate::error::{DeviceError, Result};
use crate::program::DeviceProgram;

/// Render instruction words in the text format read by the host runtime.
pub fn format_npu_instructions(words: &[u32]) -> String {
    words
        .iter()
        .map(|w| format!("{w:08X}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the device's `npu_instructions` to `output`.
pub fn emit_npu_instructions(device: &DeviceProgram, output: &Path) -> Result<()> {
    let words = device
        .npu_instructions
        .as_deref()
        .ok_or_else(|| DeviceError::MissingNpuInstructions {
            device: device.name.clone(),
        })?;
    std::fs::write(output, format_npu_instructions(words)).map_err(|source| {
        DeviceError::Write {
            path: output.to_path_buf(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_padded_uppercase_hex() {
        assert_eq!(
            format_npu_instructions(&[0x0600_0100, 0xabc, 0]),
            "06000100\n00000ABC\n00000000"
        );
    }

    #[test]
    fn empty_stream_is_empty_text() {
        assert_eq!(format_npu_instructions(&[]), "");
    }

    #[test]
    fn missing_attribute_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let device = DeviceProgram::new("npu1_4col");
        let err = emit_npu_instructions(&device, &dir.path().join("insts.txt")).unwrap_err();
        assert!(matches!(err, DeviceError::MissingNpuInstructions { .. }));
    }

    #[test]
    fn writes_without_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("insts.txt");
        let mut device = DeviceProgram::new("npu1_4col");
        device.npu_instructions = Some(vec![1, 2]);
        emit_npu_instructions(&device, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "00000001\n00000002");
    }
}
