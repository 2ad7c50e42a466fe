//! Read-only inputs shared by every legalization stage.

use crate::attraction::AttractionGroups;
use crate::flat::FlatPlacement;
use crate::floorplan::FloorplanConstraints;
use crate::netlist::AtomNetlist;
use crate::prepack::Prepacked;
use tessel_arch::{Architecture, CandidateTypeTable, TileGrid};

/// Everything the legalizer reads but never mutates.
///
/// Mutable state (the oracle's clusters, the placement table) lives in the
/// stage that owns it and is passed explicitly.
pub struct LegalizeContext<'a> {
    /// The target architecture.
    pub arch: &'a Architecture,
    /// The device grid.
    pub grid: &'a TileGrid,
    /// The atom netlist.
    pub netlist: &'a AtomNetlist,
    /// Prepacked molecules.
    pub prepacked: &'a Prepacked,
    /// Upstream placement hints.
    pub flat: &'a FlatPlacement,
    /// Optional floorplan constraints.
    pub floorplan: Option<&'a FloorplanConstraints>,
    /// Optional attraction groups.
    pub attraction: Option<&'a AttractionGroups>,
    /// Model → candidate block types.
    pub candidates: CandidateTypeTable,
}

impl<'a> LegalizeContext<'a> {
    /// Creates a context without floorplan constraints or attraction groups.
    pub fn new(
        arch: &'a Architecture,
        grid: &'a TileGrid,
        netlist: &'a AtomNetlist,
        prepacked: &'a Prepacked,
        flat: &'a FlatPlacement,
    ) -> Self {
        Self {
            arch,
            grid,
            netlist,
            prepacked,
            flat,
            floorplan: None,
            attraction: None,
            candidates: arch.candidate_types(),
        }
    }

    /// Attaches floorplan constraints.
    pub fn with_floorplan(mut self, floorplan: &'a FloorplanConstraints) -> Self {
        self.floorplan = Some(floorplan);
        self
    }

    /// Attaches attraction groups.
    pub fn with_attraction(mut self, attraction: &'a AttractionGroups) -> Self {
        self.attraction = Some(attraction);
        self
    }

    /// Returns `true` if attraction groups are present and non-empty.
    pub fn has_attraction(&self) -> bool {
        self.attraction.is_some_and(|a| !a.is_empty())
    }
}
