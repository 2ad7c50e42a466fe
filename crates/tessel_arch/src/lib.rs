//! Architecture model and device grid for cluster legalization.
//!
//! An [`Architecture`] declares primitive [`Model`]s, the [`LogicalBlockType`]s
//! clusters are built from, and the [`PhysicalTileType`]s stamped onto a
//! [`TileGrid`]. Floorplan [`Region`]s restrict where clusters may go.

#![warn(missing_docs)]

pub mod candidates;
pub mod error;
pub mod grid;
pub mod ids;
pub mod region;
pub mod types;

pub use candidates::CandidateTypeTable;
pub use error::ArchError;
pub use grid::{PlLoc, TileGrid, TileGridBuilder, TileLoc};
pub use ids::{LogicalTypeId, ModelId, PhysicalTypeId};
pub use region::{PartitionRegion, Region};
pub use types::{BlockMode, LogicalBlockType, Model, PhysicalTileType};

use serde::{Deserialize, Serialize};
use tessel_common::Arena;

/// A complete architecture description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Architecture {
    /// Primitive models.
    pub models: Arena<ModelId, Model>,
    /// Logical block types in preference order.
    pub logical_types: Arena<LogicalTypeId, LogicalBlockType>,
    /// Physical tile types.
    pub physical_types: Arena<PhysicalTypeId, PhysicalTileType>,
}

impl Architecture {
    /// Creates an empty architecture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a primitive model.
    pub fn add_model(&mut self, name: impl Into<String>) -> Result<ModelId, ArchError> {
        let name = name.into();
        if self.model_by_name(&name).is_some() {
            return Err(ArchError::DuplicateName { kind: "model", name });
        }
        Ok(self.models.alloc(Model { name }))
    }

    /// Declares a logical block type.
    pub fn add_logical_type(
        &mut self,
        name: impl Into<String>,
        modes: Vec<BlockMode>,
        input_pins: u32,
        routing_tracks: u32,
    ) -> Result<LogicalTypeId, ArchError> {
        let name = name.into();
        if self.logical_types.values().any(|t| t.name == name) {
            return Err(ArchError::DuplicateName {
                kind: "block type",
                name,
            });
        }
        Ok(self.logical_types.alloc(LogicalBlockType {
            name,
            modes,
            input_pins,
            routing_tracks,
        }))
    }

    /// Declares a physical tile type.
    pub fn add_physical_type(
        &mut self,
        name: impl Into<String>,
        width: u32,
        height: u32,
        capacity: u32,
        compatible: Vec<LogicalTypeId>,
    ) -> Result<PhysicalTypeId, ArchError> {
        let name = name.into();
        if width == 0 || height == 0 {
            return Err(ArchError::ZeroFootprint(name));
        }
        if self.physical_types.values().any(|t| t.name == name) {
            return Err(ArchError::DuplicateName {
                kind: "tile type",
                name,
            });
        }
        Ok(self.physical_types.alloc(PhysicalTileType {
            name,
            width,
            height,
            capacity,
            compatible,
        }))
    }

    /// Looks up a model by name.
    pub fn model_by_name(&self, name: &str) -> Option<ModelId> {
        self.models
            .iter()
            .find(|(_, m)| m.name == name)
            .map(|(id, _)| id)
    }

    /// Builds the model → candidate block type table.
    pub fn candidate_types(&self) -> CandidateTypeTable {
        CandidateTypeTable::build(self)
    }
}
