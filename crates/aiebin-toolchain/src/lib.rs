//! Native toolchain plumbing for the AIE backend.
//!
//! Three toolchains take part in a build:
//! - **Chess** (`xchesscc`, from a Vitis install): proprietary compiler and linker.
//! - **Peano** (`opt`, `llc`, `clang`): open LLVM-based compiler for AIE cores.
//! - **Helper tools** (`bootgen`, `xclbinutil`, `aie-opt`, `aie-translate`):
//!   found in the backend's install directory or on the search path.
//!
//! This crate finds them ([`locate`]), builds their command lines ([`args`]),
//! and runs them with captured output ([`runner`]).

pub mod args;
pub mod env;
pub mod error;
pub mod locate;
pub mod runner;

pub use args::{
    chess_command, chess_compile_args, chess_env, chess_link_args, llc_args, merge_flags,
    peano_link_args, peano_opt_args, ToolCommand,
};
pub use env::{EnvLookup, MapEnv, ProcessEnv};
pub use error::{Result, ToolchainError};
pub use locate::{locate_helper_tool, locate_vitis, PeanoInstall, VitisInstall};
pub use runner::{run_tool, ToolOutput};
