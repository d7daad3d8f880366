//! Core data-memory map for AIE2-family tiles.
//!
//! An AIE2 core addresses four 64 KiB data-memory windows, one per compass
//! direction. The east window is the core's own memory; the others alias the
//! memory of the neighbouring core tile, when one exists.

use serde::{Deserialize, Serialize};

use crate::generation::NpuVersion;

/// A compass direction from a core tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    South,
    West,
    North,
    East,
}

impl Direction {
    /// Directions in the order neighbour windows are laid out in linker descriptors.
    pub const ALL: [Direction; 4] = [
        Direction::South,
        Direction::West,
        Direction::North,
        Direction::East,
    ];

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::South => "south",
            Direction::West => "west",
            Direction::North => "north",
            Direction::East => "east",
        }
    }
}

/// Data-memory layout seen by a single core, plus the array geometry needed
/// to resolve neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CoreMemoryMap {
    /// Size of one tile's local data memory in bytes.
    pub local_memory_size: u32,
    /// Base address of the south window.
    pub south_base: u32,
    /// Base address of the west window.
    pub west_base: u32,
    /// Base address of the north window.
    pub north_base: u32,
    /// Base address of the east window (the core's own memory).
    pub east_base: u32,
    /// Size of the low address range reserved for program memory.
    pub program_reserved: u32,
    /// Address range past the four windows that the core cannot see.
    pub invisible: (u32, u32),
    /// Number of columns in the array.
    pub columns: u32,
    /// First row that holds core tiles (rows below are shim and memory tiles).
    pub first_core_row: u32,
    /// Number of core-tile rows.
    pub core_rows: u32,
}

impl CoreMemoryMap {
    /// Memory map of an AIE2-family array with the given geometry.
    pub fn aie2(columns: u32, first_core_row: u32, core_rows: u32) -> Self {
        Self {
            local_memory_size: 0x10000,
            south_base: 0x40000,
            west_base: 0x50000,
            north_base: 0x60000,
            east_base: 0x70000,
            program_reserved: 0x40000,
            invisible: (0x80000, 0x80000),
            columns,
            first_core_row,
            core_rows,
        }
    }

    /// Default memory map for a hardware generation.
    pub fn for_npu(npu: NpuVersion) -> Self {
        match npu {
            NpuVersion::Npu1 => Self::aie2(4, 2, 4),
            NpuVersion::Npu4 => Self::aie2(8, 2, 4),
        }
    }

    /// Address where the core's own memory (and its stack) begins.
    pub fn internal_base(&self) -> u32 {
        self.east_base
    }

    /// Base address of the window for `dir`.
    pub fn base(&self, dir: Direction) -> u32 {
        match dir {
            Direction::South => self.south_base,
            Direction::West => self.west_base,
            Direction::North => self.north_base,
            Direction::East => self.east_base,
        }
    }

    /// Whether `(col, row)` is a core tile of this array.
    pub fn is_core_tile(&self, col: u32, row: u32) -> bool {
        col < self.columns && row >= self.first_core_row && row < self.first_core_row + self.core_rows
    }

    /// Tile whose memory backs the `dir` window of core `(col, row)`.
    ///
    /// Returns `None` when no core tile exists in that direction.
    pub fn neighbour(&self, col: u32, row: u32, dir: Direction) -> Option<(u32, u32)> {
        let candidate = match dir {
            Direction::East => Some((col, row)),
            Direction::West => col.checked_sub(1).map(|c| (c, row)),
            Direction::North => Some((col, row + 1)),
            Direction::South => row.checked_sub(1).map(|r| (col, r)),
        }?;
        self.is_core_tile(candidate.0, candidate.1).then_some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn east_is_own_memory() {
        let map = CoreMemoryMap::for_npu(NpuVersion::Npu1);
        assert_eq!(map.neighbour(1, 3, Direction::East), Some((1, 3)));
        assert_eq!(map.internal_base(), 0x70000);
    }

    #[test]
    fn edges_have_no_neighbour() {
        let map = CoreMemoryMap::for_npu(NpuVersion::Npu1);
        // Row 2 sits directly above the memory tiles.
        assert_eq!(map.neighbour(0, 2, Direction::South), None);
        assert_eq!(map.neighbour(0, 2, Direction::West), None);
        assert_eq!(map.neighbour(0, 5, Direction::North), None);
        assert_eq!(map.neighbour(1, 3, Direction::South), Some((1, 2)));
        assert_eq!(map.neighbour(1, 3, Direction::West), Some((0, 3)));
    }

    #[test]
    fn npu4_is_wider() {
        let map = CoreMemoryMap::for_npu(NpuVersion::Npu4);
        assert!(map.is_core_tile(7, 2));
        assert!(!CoreMemoryMap::for_npu(NpuVersion::Npu1).is_core_tile(7, 2));
    }
}
