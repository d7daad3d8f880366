//! Binary configuration file (BCF) emission for the chess linker.
//!
//! A BCF tells the chess linker where a core's entry point, stack, and
//! externally visible buffers live in its data-memory address space, and
//! which address ranges it must leave alone.

use std::fmt;

use aiebin_targets::{CoreMemoryMap, Direction};

use crate::error::{DeviceError, Result};
use crate::program::{DeviceProgram, Tile, TileCoord};

fn hex(value: u32) -> String {
    format!("0x{value:X}")
}

/// Emit the BCF for the core at `coord`.
pub fn translate_to_bcf(
    device: &DeviceProgram,
    coord: TileCoord,
    map: &CoreMemoryMap,
) -> Result<String> {
    let tile = device.tile(coord).ok_or(DeviceError::TileNotFound {
        col: coord.col,
        row: coord.row,
    })?;
    let bcf = Bcf {
        device,
        coord,
        tile,
        map,
    };
    Ok(bcf.to_string())
}

struct Bcf<'a> {
    device: &'a DeviceProgram,
    coord: TileCoord,
    tile: &'a Tile,
    map: &'a CoreMemoryMap,
}

impl fmt::Display for Bcf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.map;
        let core_fn = format!("core_{}_{}", self.coord.col, self.coord.row);
        let core = self.tile.core.as_ref();
        let stack_size = core.map_or(0, |c| c.stack_size);

        writeln!(f, "_entry_point _main_init")?;
        writeln!(f, "_symbol {core_fn} _after _main_init")?;
        writeln!(f, "_symbol _main_init 0")?;
        writeln!(
            f,
            "_reserved DMb 0x00000 {} // Don't put data in code memory",
            hex(map.program_reserved)
        )?;
        writeln!(
            f,
            "_stack DM_stack {} {} // stack for core",
            hex(map.internal_base()),
            hex(stack_size)
        )?;

        writeln!(f, "\n// mapping neighbors tile memory")?;
        for dir in Direction::ALL {
            self.fmt_neighbour(f, dir)?;
        }
        writeln!(f, "// end mapping neighbors tile memory\n")?;

        writeln!(
            f,
            "_reserved DMb {} {} // And everything else the core can't see",
            hex(map.invisible.0),
            hex(map.invisible.1)
        )?;
        if let Some(obj) = core.and_then(|c| c.link_with.as_deref()) {
            writeln!(f, "_include _file {obj}")?;
        }
        writeln!(f, "_resolve _main {core_fn}")
    }
}

impl Bcf<'_> {
    fn fmt_neighbour(&self, f: &mut fmt::Formatter<'_>, dir: Direction) -> fmt::Result {
        let map = self.map;
        let offset = map.base(dir);
        let size = hex(map.local_memory_size);
        let name = dir.as_str();

        let Some((col, row)) = map.neighbour(self.coord.col, self.coord.row, dir) else {
            return writeln!(
                f,
                "_reserved DMb {} {size}  // No tile with memory exists to the {name}.",
                hex(offset)
            );
        };

        let neighbour = TileCoord::new(col, row);
        writeln!(f, "// {name} -------------------------------------------------")?;
        if neighbour != self.coord {
            writeln!(
                f,
                "_reserved DMb {} {size}  // Don't allocate variables in {name} neighbor\n",
                hex(offset)
            )?;
        }

        let Some(tile) = self.device.tile(neighbour) else {
            return Ok(());
        };
        for buf in &tile.buffers {
            let addr = hex(offset + buf.address);
            if buf.initialized && neighbour == self.coord {
                writeln!(f, "_overlay {} {addr} // {} bytes", buf.name, buf.size_bytes)?;
            } else {
                writeln!(f, "_symbol {} {addr} {}", buf.name, buf.size_bytes)?;
                writeln!(f, "_extern {}", buf.name)?;
                writeln!(f, "_reserved DMb {addr} {}", buf.size_bytes)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Buffer, Core, Tile};
    use aiebin_targets::NpuVersion;

    fn device() -> DeviceProgram {
        DeviceProgram::new("npu1_4col")
            .with_tile(
                Tile::new(0, 2)
                    .with_core(Core::new().with_stack_size(0x400))
                    .with_buffer(Buffer::new("a", 0x400, 1024))
                    .with_buffer(Buffer::new("lut", 0x800, 64).initialized()),
            )
            .unwrap()
            .with_tile(
                Tile::new(0, 3)
                    .with_core(Core::new())
                    .with_buffer(Buffer::new("b", 0x1000, 256)),
            )
            .unwrap()
    }

    #[test]
    fn header_and_footer() {
        let map = CoreMemoryMap::for_npu(NpuVersion::Npu1);
        let bcf = translate_to_bcf(&device(), TileCoord::new(0, 2), &map).unwrap();
        assert!(bcf.starts_with("_entry_point _main_init\n_symbol core_0_2 _after _main_init\n"));
        assert!(bcf.contains("_reserved DMb 0x00000 0x40000 // Don't put data in code memory\n"));
        assert!(bcf.contains("_stack DM_stack 0x70000 0x400 // stack for core\n"));
        assert!(bcf.contains("_reserved DMb 0x80000 0x80000 // And everything else"));
        assert!(bcf.ends_with("_resolve _main core_0_2\n"));
    }

    #[test]
    fn missing_neighbours_fully_reserved() {
        let map = CoreMemoryMap::for_npu(NpuVersion::Npu1);
        let bcf = translate_to_bcf(&device(), TileCoord::new(0, 2), &map).unwrap();
        assert!(bcf.contains("_reserved DMb 0x40000 0x10000  // No tile with memory exists to the south."));
        assert!(bcf.contains("_reserved DMb 0x50000 0x10000  // No tile with memory exists to the west."));
    }

    #[test]
    fn own_buffers_and_overlays() {
        let map = CoreMemoryMap::for_npu(NpuVersion::Npu1);
        let bcf = translate_to_bcf(&device(), TileCoord::new(0, 2), &map).unwrap();
        assert!(bcf.contains("_symbol a 0x70400 1024\n_extern a\n_reserved DMb 0x70400 1024\n"));
        assert!(bcf.contains("_overlay lut 0x70800 // 64 bytes\n"));
        // North neighbour buffers are mapped through the north window.
        assert!(bcf.contains("_reserved DMb 0x60000 0x10000  // Don't allocate variables in north neighbor"));
        assert!(bcf.contains("_symbol b 0x61000 256\n"));
    }

    #[test]
    fn neighbour_overlay_becomes_symbol() {
        let map = CoreMemoryMap::for_npu(NpuVersion::Npu1);
        let bcf = translate_to_bcf(&device(), TileCoord::new(0, 3), &map).unwrap();
        assert!(bcf.contains("_symbol lut 0x40800 64\n"));
        assert!(!bcf.contains("_overlay"));
    }

    #[test]
    fn link_with_is_included() {
        let map = CoreMemoryMap::for_npu(NpuVersion::Npu1);
        let mut core = Core::new();
        core.link_with = Some("mm.o".into());
        let device = DeviceProgram::new("d")
            .with_tile(Tile::new(1, 2).with_core(core))
            .unwrap();
        let bcf = translate_to_bcf(&device, TileCoord::new(1, 2), &map).unwrap();
        assert!(bcf.contains("_include _file mm.o\n_resolve _main core_1_2\n"));
    }

    #[test]
    fn unknown_tile_is_an_error() {
        let map = CoreMemoryMap::for_npu(NpuVersion::Npu1);
        let err = translate_to_bcf(&device(), TileCoord::new(3, 3), &map).unwrap_err();
        assert!(matches!(err, DeviceError::TileNotFound { col: 3, row: 3 }));
    }
}
