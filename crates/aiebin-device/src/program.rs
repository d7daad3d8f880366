//! Device program, tiles, cores, and buffers.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DeviceError, Result};

/// Column/row address of a tile in the array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub col: u32,
    pub row: u32,
}

impl TileCoord {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// ELF file name given to a core that has none: `core_<col>_<row>.elf`.
pub fn default_elf_file_name(coord: TileCoord) -> String {
    format!("core_{}_{}.elf", coord.col, coord.row)
}

/// A named allocation in a tile's local data memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buffer {
    /// Symbol name.
    pub name: String,
    /// Offset within the owning tile's local memory.
    pub address: u32,
    /// Allocation size in bytes.
    pub size_bytes: u32,
    /// Whether the buffer carries an initial value.
    #[serde(default)]
    pub initialized: bool,
}

impl Buffer {
    pub fn new(name: impl Into<String>, address: u32, size_bytes: u32) -> Self {
        Self {
            name: name.into(),
            address,
            size_bytes,
            initialized: false,
        }
    }

    /// Mark the buffer as carrying an initial value.
    pub fn initialized(mut self) -> Self {
        self.initialized = true;
        self
    }
}

/// The executable program placed on a tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Core {
    /// Output ELF file name. Assigned by the backend when absent.
    #[serde(default)]
    pub elf_file: Option<String>,
    /// Stack size in bytes.
    #[serde(default)]
    pub stack_size: u32,
    /// Extra object file the core links against.
    #[serde(default)]
    pub link_with: Option<String>,
}

impl Core {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack_size(mut self, bytes: u32) -> Self {
        self.stack_size = bytes;
        self
    }

    pub fn with_elf_file(mut self, name: impl Into<String>) -> Self {
        self.elf_file = Some(name.into());
        self
    }

    /// Return the ELF file name, assigning and recording the default name
    /// for `coord` when none is set.
    pub fn ensure_elf_file(&mut self, coord: TileCoord) -> &str {
        self.elf_file
            .get_or_insert_with(|| default_elf_file_name(coord))
            .as_str()
    }
}

/// A tile in the array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub col: u32,
    pub row: u32,
    /// Program placed on this tile, if any.
    #[serde(default)]
    pub core: Option<Core>,
    /// Buffers allocated in this tile's local memory.
    #[serde(default)]
    pub buffers: Vec<Buffer>,
}

impl Tile {
    pub fn new(col: u32, row: u32) -> Self {
        Self {
            col,
            row,
            core: None,
            buffers: Vec::new(),
        }
    }

    pub fn with_core(mut self, core: Core) -> Self {
        self.core = Some(core);
        self
    }

    pub fn with_buffer(mut self, buffer: Buffer) -> Self {
        self.buffers.push(buffer);
        self
    }

    pub fn coord(&self) -> TileCoord {
        TileCoord::new(self.col, self.row)
    }
}

/// Root of a lowered device description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProgram {
    /// Device symbol name.
    pub name: String,
    tiles: Vec<Tile>,
    /// Pre-scheduled NPU instruction words.
    #[serde(default)]
    pub npu_instructions: Option<Vec<u32>>,
    /// Textual IR the program was read from, for tool-backed translation.
    #[serde(default)]
    pub source: Option<PathBuf>,
}

impl DeviceProgram {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tiles: Vec::new(),
            npu_instructions: None,
            source: None,
        }
    }

    /// Parse a device program from JSON and check coordinate uniqueness.
    pub fn from_json(text: &str) -> Result<Self> {
        let program: DeviceProgram = serde_json::from_str(text)?;
        program.validate()?;
        Ok(program)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add a tile. Fails if a tile already occupies the same coordinates.
    pub fn add_tile(&mut self, tile: Tile) -> Result<()> {
        if self.tile(tile.coord()).is_some() {
            return Err(DeviceError::DuplicateTile {
                col: tile.col,
                row: tile.row,
            });
        }
        self.tiles.push(tile);
        Ok(())
    }

    /// Builder-style [`add_tile`](Self::add_tile).
    pub fn with_tile(mut self, tile: Tile) -> Result<Self> {
        self.add_tile(tile)?;
        Ok(self)
    }

    /// Check that every tile has distinct coordinates.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for tile in &self.tiles {
            if !seen.insert(tile.coord()) {
                return Err(DeviceError::DuplicateTile {
                    col: tile.col,
                    row: tile.row,
                });
            }
        }
        Ok(())
    }

    /// Tiles in declaration order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Mutable access to tiles. Coordinates must not be changed.
    pub fn tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.tiles.iter_mut()
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.coord() == coord)
    }

    /// Coordinates of all tiles that carry a core, in declaration order.
    pub fn core_tiles(&self) -> Vec<TileCoord> {
        self.tiles
            .iter()
            .filter(|t| t.core.is_some())
            .map(Tile::coord)
            .collect()
    }

    /// Core at `coord`, if the tile exists and has one.
    pub fn core_mut(&mut self, coord: TileCoord) -> Option<&mut Core> {
        self.tiles
            .iter_mut()
            .find(|t| t.coord() == coord)
            .and_then(|t| t.core.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_core_device() -> DeviceProgram {
        DeviceProgram::new("npu1_4col")
            .with_tile(Tile::new(0, 0).with_core(Core::new()))
            .unwrap()
            .with_tile(Tile::new(1, 0).with_core(Core::new().with_elf_file("custom.elf")))
            .unwrap()
            .with_tile(Tile::new(0, 1))
            .unwrap()
    }

    #[test]
    fn duplicate_tile_rejected() {
        let mut device = DeviceProgram::new("d");
        device.add_tile(Tile::new(2, 3)).unwrap();
        let err = device.add_tile(Tile::new(2, 3)).unwrap_err();
        assert!(matches!(err, DeviceError::DuplicateTile { col: 2, row: 3 }));
    }

    #[test]
    fn core_tiles_skip_bare_tiles() {
        let device = two_core_device();
        assert_eq!(
            device.core_tiles(),
            vec![TileCoord::new(0, 0), TileCoord::new(1, 0)]
        );
    }

    #[test]
    fn ensure_elf_file_assigns_once() {
        let mut device = two_core_device();
        let coord = TileCoord::new(0, 0);
        let name = device.core_mut(coord).unwrap().ensure_elf_file(coord).to_string();
        assert_eq!(name, "core_0_0.elf");
        assert_eq!(
            device.core_mut(coord).unwrap().elf_file.as_deref(),
            Some("core_0_0.elf")
        );

        let custom = TileCoord::new(1, 0);
        assert_eq!(
            device.core_mut(custom).unwrap().ensure_elf_file(custom),
            "custom.elf"
        );
    }

    #[test]
    fn json_rejects_duplicate_coordinates() {
        let text = r#"{
            "name": "d",
            "tiles": [ {"col": 0, "row": 2}, {"col": 0, "row": 2} ]
        }"#;
        assert!(matches!(
            DeviceProgram::from_json(text),
            Err(DeviceError::DuplicateTile { .. })
        ));
    }

    #[test]
    fn json_round_trip_keeps_cores() {
        let device = two_core_device();
        let text = device.to_json().unwrap();
        let parsed = DeviceProgram::from_json(&text).unwrap();
        assert_eq!(parsed, device);
    }

    #[test]
    fn coord_display() {
        assert_eq!(TileCoord::new(3, 4).to_string(), "(3, 4)");
    }
}
