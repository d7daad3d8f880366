//! Device program model for AIE array backends.
//!
//! A [`DeviceProgram`] is the lowered, validated description of one device
//! partition: a set of tiles addressed by `(col, row)`, the cores placed on
//! them, the buffers each tile owns, and the pre-scheduled NPU instruction
//! stream. The backend consumes it read-only, except for recording the ELF
//! file name chosen for each core.

pub mod bcf;
pub mod error;
pub mod instructions;
pub mod program;

pub use bcf::translate_to_bcf;
pub use error::{DeviceError, Result};
pub use instructions::{emit_npu_instructions, format_npu_instructions};
pub use program::{default_elf_file_name, Buffer, Core, DeviceProgram, Tile, TileCoord};
