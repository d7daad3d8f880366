//! Sources compiled into every build that asks for them.

use aiebin_targets::NpuVersion;

/// A translation unit embedded in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedSource {
    /// Name the source is written under before compiling.
    pub file_name: &'static str,
    /// Name of the compiled object.
    pub object_name: &'static str,
    pub text: &'static str,
}

/// Wrappers mapping peano intrinsic symbols onto chess built-ins.
pub const CHESS_INTRINSIC_WRAPPER: EmbeddedSource = EmbeddedSource {
    file_name: "chess_intrinsic_wrapper.cpp",
    object_name: "chess_intrinsic_wrapper.o",
    text: include_str!("../kernels/chess_intrinsic_wrapper.cpp"),
};

const MM_NPU1: EmbeddedSource = EmbeddedSource {
    file_name: "mm_npu1.cc",
    object_name: "mm_npu1.o",
    text: include_str!("../kernels/mm_npu1.cc"),
};

const MM_NPU4: EmbeddedSource = EmbeddedSource {
    file_name: "mm_npu4.cc",
    object_name: "mm_npu4.o",
    text: include_str!("../kernels/mm_npu4.cc"),
};

/// Matmul micro-kernel for a hardware generation.
pub fn matmul_ukernel(npu: NpuVersion) -> EmbeddedSource {
    match npu {
        NpuVersion::Npu1 => MM_NPU1,
        NpuVersion::Npu4 => MM_NPU4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ukernel_per_generation() {
        assert_eq!(matmul_ukernel(NpuVersion::Npu1).object_name, "mm_npu1.o");
        assert_eq!(matmul_ukernel(NpuVersion::Npu4).file_name, "mm_npu4.cc");
        assert!(matmul_ukernel(NpuVersion::Npu4).text.contains("matmul_i8_i32"));
        assert!(CHESS_INTRINSIC_WRAPPER.text.contains("llvm___aie2___acquire"));
    }
}
