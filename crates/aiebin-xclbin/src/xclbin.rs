//! xclbin container packaging.
//!
//! The container is assembled by `xclbinutil` from three JSON documents:
//! memory topology, kernel signatures, and the AIE partition listing the
//! boot images (PDIs) it carries. Packaging into an existing container keeps
//! that container's PDIs and appends the new one.

use std::path::Path;

use rand::RngCore;
use serde_json::{json, Value};
use uuid::Uuid;

use aiebin_toolchain::run_tool;

use crate::config::XclbinOptions;
use crate::error::{Result, XclbinError};

/// Memory topology: host DRAM and the instruction SRAM window.
pub fn mem_topology_json() -> Value {
    json!({
        "mem_topology": {
            "m_count": "2",
            "m_mem_data": [
                {
                    "m_type": "MEM_DRAM",
                    "m_used": "1",
                    "m_sizeKB": "0x10000",
                    "m_tag": "HOST",
                    "m_base_address": "0x4000000"
                },
                {
                    "m_type": "MEM_DRAM",
                    "m_used": "1",
                    "m_sizeKB": "0xc000",
                    "m_tag": "SRAM",
                    "m_base_address": "0x4000000"
                }
            ]
        }
    })
}

/// Random (version 4) UUID identifying a partition's PDI.
pub fn partition_uuid(rng: &mut dyn RngCore) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

/// Partition descriptor with a single PDI running `kernel_id`.
pub fn aie_partition_json(uuid: &Uuid, kernel_id: &str) -> Value {
    json!({
        "aie_partition": {
            "name": "QoS",
            "operations_per_cycle": "2048",
            "inference_fingerprint": "23423",
            "pre_post_fingerprint": "12345",
            "partition": {
                "column_width": 4,
                "start_columns": [1]
            },
            "PDIs": [
                {
                    "uuid": uuid.to_string(),
                    "file_name": "./design.pdi",
                    "cdo_groups": [
                        {
                            "name": "DPU",
                            "type": "PRIMARY",
                            "pdi_id": "0x01",
                            "dpu_kernel_ids": [kernel_id],
                            "pre_cdo_groups": ["0xC1"]
                        }
                    ]
                }
            ]
        }
    })
}

fn scalar_arg(name: &str, ty: &str, offset: &str) -> Value {
    json!({
        "name": name,
        "address-qualifier": "SCALAR",
        "type": ty,
        "offset": offset
    })
}

fn global_arg(name: &str, memory: &str, ty: &str, offset: &str) -> Value {
    json!({
        "name": name,
        "memory-connection": memory,
        "address-qualifier": "GLOBAL",
        "type": ty,
        "offset": offset
    })
}

/// Kernel signature descriptor.
///
/// Every kernel is described with the same arguments: an opcode, the
/// instruction buffer and its length, and six host buffer objects.
pub fn kernels_json(options: &XclbinOptions) -> Value {
    let mut arguments = vec![
        scalar_arg("opcode", "uint64_t", "0x00"),
        global_arg("instr", "SRAM", "char *", "0x08"),
        scalar_arg("ninstr", "uint32_t", "0x10"),
    ];
    for (i, offset) in ["0x14", "0x1c", "0x24", "0x2c", "0x34", "0x3c"]
        .iter()
        .enumerate()
    {
        arguments.push(global_arg(&format!("bo{i}"), "HOST", "void*", offset));
    }

    json!({
        "ps-kernels": {
            "kernels": [
                {
                    "name": options.kernel_name,
                    "type": "dpu",
                    "extended-data": {
                        "subtype": "DPU",
                        "functional": "0",
                        "dpu_kernel_id": options.kernel_id
                    },
                    "arguments": arguments,
                    "instances": [ { "name": options.instance_name } ]
                }
            ]
        }
    })
}

fn pdis_mut(partition: &mut Value) -> Option<&mut Vec<Value>> {
    partition
        .get_mut("aie_partition")?
        .get_mut("PDIs")?
        .as_array_mut()
}

/// Append the PDIs of `new` to those of `base`, keeping `base`'s order.
pub fn merge_partition_pdis(mut base: Value, new: &Value) -> std::result::Result<Value, String> {
    let added = new
        .get("aie_partition")
        .and_then(|p| p.get("PDIs"))
        .and_then(Value::as_array)
        .ok_or("new partition has no aie_partition.PDIs array")?
        .clone();
    pdis_mut(&mut base)
        .ok_or("merge base has no aie_partition.PDIs array")?
        .extend(added);
    Ok(base)
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).map_err(|e| {
        log::error!("failed to dump to disk {}", path.display());
        XclbinError::io(path, e)
    })
}

fn xclbinutil(program: &Path, args: &[String], step: &'static str, verbose: bool) -> Result<()> {
    run_tool(program, args, None, verbose)
        .map(|_| ())
        .map_err(|e| {
            log::error!("failed to execute xclbinutil");
            XclbinError::Packaging {
                step,
                detail: e.to_string(),
            }
        })
}

fn read_merge_base(path: &Path, dump: &Path) -> Result<Value> {
    let merge_base = |detail: String| XclbinError::MergeBase {
        path: path.to_path_buf(),
        detail,
    };
    let text = std::fs::read_to_string(dump)
        .map_err(|e| merge_base(format!("failed to read {}: {e}", dump.display())))?;
    serde_json::from_str(&text).map_err(|e| merge_base(format!("invalid partition JSON: {e}")))
}

/// Package the boot image in `work_dir` into the container at `output`.
///
/// Writes `mem_topology.json`, `aie_partition.json` and `kernels.json` into
/// `work_dir`. With `options.input` set, that container's partition is
/// dumped, merged with the new one, and its memory topology is kept.
pub fn generate_xclbin(
    work_dir: &Path,
    output: &Path,
    options: &XclbinOptions,
    xclbinutil_program: &Path,
    rng: &mut dyn RngCore,
    verbose: bool,
) -> Result<()> {
    let mem_topology_file = work_dir.join("mem_topology.json");
    write_json(&mem_topology_file, &mem_topology_json())?;

    let partition_file = work_dir.join("aie_partition.json");
    let partition = aie_partition_json(&partition_uuid(rng), &options.kernel_id);
    write_json(&partition_file, &partition)?;

    let kernels_file = work_dir.join("kernels.json");
    write_json(&kernels_file, &kernels_json(options))?;

    let mut flags: Vec<String> = Vec::new();
    match &options.input {
        None => {
            flags.push("--add-replace-section".into());
            flags.push(format!("MEM_TOPOLOGY:JSON:{}", mem_topology_file.display()));
        }
        Some(input) => {
            let dump = work_dir.join("aie_input_partition.json");
            let dump_args = vec![
                "--dump-section".to_string(),
                format!("AIE_PARTITION:JSON:{}", dump.display()),
                "--force".into(),
                "--input".into(),
                input.display().to_string(),
            ];
            xclbinutil(xclbinutil_program, &dump_args, "dump-section", verbose)?;

            let base = read_merge_base(input, &dump)?;
            let merged = merge_partition_pdis(base, &partition).map_err(|detail| {
                XclbinError::MergeBase {
                    path: input.clone(),
                    detail,
                }
            })?;
            write_json(&partition_file, &merged)?;

            flags.push("--input".into());
            flags.push(input.display().to_string());
        }
    }

    flags.extend([
        "--add-kernel".to_string(),
        kernels_file.display().to_string(),
        "--add-replace-section".into(),
        format!("AIE_PARTITION:JSON:{}", partition_file.display()),
        "--force".into(),
        "--output".into(),
        output.display().to_string(),
    ]);
    xclbinutil(xclbinutil_program, &flags, "assemble", verbose)
}
