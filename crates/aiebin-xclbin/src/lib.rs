//! Build pipeline from AIE device programs to loadable binaries.
//!
//! [`build`] takes a validated [`DeviceProgram`](aiebin_device::DeviceProgram)
//! through every stage of the backend:
//!
//! 1. optional NPU instruction stream text
//! 2. one unified object for all cores (chess, or peano `opt` + `llc`)
//! 3. one ELF per core, linked against optional micro-kernels
//! 4. optional control packets
//! 5. CDO segments
//! 6. the boot image (`design.pdi`)
//! 7. a copy of the boot image, or an xclbin container
//!
//! IR-level work sits behind [`DeviceTranslator`]; boot image generation
//! sits behind [`BootImageGenerator`].

pub mod assemble;
pub mod cache;
pub mod cdo;
pub mod config;
pub mod elf;
pub mod error;
pub mod kernels;
pub mod pdi;
pub mod pipeline;
pub mod report;
pub mod translate;
pub mod unified;
pub mod xclbin;

pub use assemble::{assemble_source, ChessAssembler, FileAssembler};
pub use cache::ObjectCache;
pub use cdo::{generate_cdo, CdoFiles, CDO_FILE_NAMES};
pub use config::{BuildConfig, DeviceHal, PassManagerOptions, UkernelSelection, XclbinOptions};
pub use elf::generate_core_elf_files;
pub use error::{Result, XclbinError};
pub use kernels::{matmul_ukernel, EmbeddedSource, CHESS_INTRINSIC_WRAPPER};
pub use pdi::{generate_pdi, BootImageDescriptor, BootImageGenerator, BootgenRequest, BootgenTool};
pub use pipeline::{build, BuildOutput, BuildTools};
pub use report::{BuildReport, Stage};
pub use translate::{lowering_pipeline, DeviceTranslator, LoweringOptions, ToolTranslator};
pub use unified::generate_unified_object;
pub use xclbin::{
    aie_partition_json, generate_xclbin, kernels_json, mem_topology_json, merge_partition_pdis,
    partition_uuid,
};
