//! Target models for AIE array devices.
//!
//! Two layers describe a target:
//! - **Generation:** the NPU hardware generation ([`NpuVersion`]) and the core
//!   architecture it carries ([`TargetArch`]), which select toolchain
//!   sub-directories and architecture macros.
//! - **Memory map:** the data-memory windows a core sees ([`CoreMemoryMap`]),
//!   used when emitting per-core linker descriptors.

pub mod error;
pub mod generation;
pub mod memory;

pub use error::{Result, TargetError};
pub use generation::{NpuVersion, TargetArch};
pub use memory::{CoreMemoryMap, Direction};
