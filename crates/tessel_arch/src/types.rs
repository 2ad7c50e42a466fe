//! Architecture templates: primitive models, logical block types and their
//! modes, and physical tile types.

use crate::ids::{LogicalTypeId, ModelId};
use serde::{Deserialize, Serialize};

/// An atomic primitive kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Model name as it appears in the netlist (e.g. `lut`).
    pub name: String,
}

/// One operating mode of a logical block type.
///
/// A mode bounds how many atoms of each model a cluster in that mode may hold.
/// Models absent from `capacities` cannot be placed in the mode at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMode {
    /// Mode name.
    pub name: String,
    /// Per-model atom capacity.
    pub capacities: Vec<(ModelId, u32)>,
}

impl BlockMode {
    /// Creates a mode with the given per-model capacities.
    pub fn new(name: impl Into<String>, capacities: Vec<(ModelId, u32)>) -> Self {
        Self {
            name: name.into(),
            capacities,
        }
    }

    /// Returns how many atoms of `model` this mode holds (zero if unsupported).
    pub fn capacity_for(&self, model: ModelId) -> u32 {
        self.capacities
            .iter()
            .filter(|(m, _)| *m == model)
            .map(|(_, count)| *count)
            .sum()
    }

    /// Returns the total atom capacity over all models.
    pub fn total_capacity(&self) -> u32 {
        self.capacities.iter().map(|(_, count)| *count).sum()
    }
}

/// A cluster template: what a cluster may contain and its wiring budgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalBlockType {
    /// Block type name (e.g. `clb`).
    pub name: String,
    /// Modes in preference order.
    pub modes: Vec<BlockMode>,
    /// Distinct external input nets the block can receive.
    pub input_pins: u32,
    /// Distinct nets the internal interconnect can carry.
    pub routing_tracks: u32,
}

/// A physical tile type: its footprint, sub-tile count, and the logical types
/// its sub-tiles accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalTileType {
    /// Tile type name.
    pub name: String,
    /// Footprint width in grid cells.
    pub width: u32,
    /// Footprint height in grid cells.
    pub height: u32,
    /// Number of sub-tiles, each able to host one cluster.
    pub capacity: u32,
    /// Logical block types that may occupy a sub-tile.
    pub compatible: Vec<LogicalTypeId>,
}

impl PhysicalTileType {
    /// Returns `true` if a cluster of `logical` may occupy this tile type.
    pub fn accepts(&self, logical: LogicalTypeId) -> bool {
        self.compatible.contains(&logical)
    }
}
