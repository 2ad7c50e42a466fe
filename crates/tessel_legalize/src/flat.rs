//! Upstream flat placement hints and their resolution onto the device grid.

use crate::codes;
use crate::ids::MoleculeId;
use crate::prepack::Prepacked;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tessel_arch::{TileGrid, TileLoc};
use tessel_diagnostics::{Diagnostic, DiagnosticSink};

/// A fractional location from the analytical placer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatLoc {
    /// Fractional column.
    pub x: f32,
    /// Fractional row.
    pub y: f32,
    /// Fractional layer.
    pub layer: f32,
    /// Requested sub-tile, negative for none.
    pub sub_tile: i32,
}

impl FlatLoc {
    /// A hint at `(x, y)` on layer 0 with no sub-tile preference.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            layer: 0.0,
            sub_tile: -1,
        }
    }

    /// Sets the requested sub-tile.
    pub fn with_sub_tile(mut self, sub_tile: u32) -> Self {
        self.sub_tile = sub_tile as i32;
        self
    }

    /// Sets the layer.
    pub fn on_layer(mut self, layer: f32) -> Self {
        self.layer = layer;
        self
    }
}

/// Per-molecule fractional hints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlatPlacement {
    locs: HashMap<MoleculeId, FlatLoc>,
}

impl FlatPlacement {
    /// Creates an empty placement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the hint for a molecule.
    pub fn set(&mut self, molecule: MoleculeId, loc: FlatLoc) {
        self.locs.insert(molecule, loc);
    }

    /// The hint for a molecule, if any.
    pub fn get(&self, molecule: MoleculeId) -> Option<FlatLoc> {
        self.locs.get(&molecule).copied()
    }

    /// Mean hint of the given molecules, ignoring unhinted ones.
    pub fn centroid(&self, molecules: &[MoleculeId]) -> Option<FlatLoc> {
        let hinted: Vec<FlatLoc> = molecules.iter().filter_map(|m| self.get(*m)).collect();
        if hinted.is_empty() {
            return None;
        }
        let n = hinted.len() as f32;
        let (x, y, layer) = hinted.iter().fold((0.0, 0.0, 0.0), |(x, y, l), loc| {
            (x + loc.x, y + loc.y, l + loc.layer)
        });
        Some(FlatLoc {
            x: x / n,
            y: y / n,
            layer: layer / n,
            sub_tile: -1,
        })
    }

    /// Resolves every molecule's hint to the root tile containing it.
    ///
    /// Hints outside the device are clamped onto it with a warning; molecules
    /// without a hint are assigned the device center with a warning.
    pub fn resolve(
        &self,
        prepacked: &Prepacked,
        grid: &TileGrid,
        sink: &DiagnosticSink,
    ) -> HintTable {
        let mut tiles = Vec::with_capacity(prepacked.len());
        let mut sub_tiles = Vec::with_capacity(prepacked.len());
        let mut by_tile: BTreeMap<TileLoc, Vec<MoleculeId>> = BTreeMap::new();
        for mol in prepacked.molecules.ids() {
            let loc = match self.get(mol) {
                Some(loc) => loc,
                None => {
                    sink.emit(
                        Diagnostic::warning(codes::W102, "molecule has no placement hint")
                            .with_subject(format!("molecule {mol}"))
                            .with_note("using the device center"),
                    );
                    FlatLoc::new(grid.width() as f32 / 2.0, grid.height() as f32 / 2.0)
                }
            };
            let (tile, clamped) = containing_tile(grid, loc);
            if clamped {
                sink.emit(
                    Diagnostic::warning(codes::W101, "placement hint lies outside the device")
                        .with_subject(format!("molecule {mol}"))
                        .with_note(format!(
                            "hint ({}, {}, {}) clamped to {tile}",
                            loc.x, loc.y, loc.layer
                        )),
                );
            }
            tiles.push(tile);
            sub_tiles.push(u32::try_from(loc.sub_tile).ok());
            by_tile.entry(tile).or_default().push(mol);
        }
        HintTable {
            tiles,
            sub_tiles,
            by_tile,
        }
    }
}

/// The root tile containing `loc`, clamped onto the device. The flag is set
/// when clamping moved the location.
pub fn containing_tile(grid: &TileGrid, loc: FlatLoc) -> (TileLoc, bool) {
    let clamp = |v: f32, size: u32| -> (i32, bool) {
        let cell = v.floor() as i32;
        let max = size as i32 - 1;
        let clamped = cell.clamp(0, max);
        (clamped, clamped != cell)
    };
    let (x, cx) = clamp(loc.x, grid.width());
    let (y, cy) = clamp(loc.y, grid.height());
    let (layer, cl) = clamp(loc.layer, grid.layers());
    (grid.root_of(TileLoc::new(x, y, layer)), cx || cy || cl)
}

/// Hints resolved onto root tiles, grouped by tile.
#[derive(Debug, Clone)]
pub struct HintTable {
    tiles: Vec<TileLoc>,
    sub_tiles: Vec<Option<u32>>,
    by_tile: BTreeMap<TileLoc, Vec<MoleculeId>>,
}

impl HintTable {
    /// Root tile the molecule was hinted to.
    pub fn tile_of(&self, molecule: MoleculeId) -> TileLoc {
        self.tiles[molecule.index()]
    }

    /// Sub-tile the molecule asked for, if any.
    pub fn sub_tile_of(&self, molecule: MoleculeId) -> Option<u32> {
        self.sub_tiles[molecule.index()]
    }

    /// Molecules hinted to `tile`, in molecule order.
    pub fn molecules_in(&self, tile: TileLoc) -> &[MoleculeId] {
        self.by_tile.get(&tile).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates over hinted tiles in `(x, y, layer)` order.
    pub fn tiles(&self) -> impl Iterator<Item = (TileLoc, &[MoleculeId])> {
        self.by_tile.iter().map(|(t, m)| (*t, m.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::AtomNetlist;
    use tessel_arch::{Architecture, BlockMode};

    fn grid_2x2() -> TileGrid {
        let mut arch = Architecture::new();
        let lut = arch.add_model("lut").unwrap();
        let clb = arch
            .add_logical_type("clb", vec![BlockMode::new("m", vec![(lut, 1)])], 4, 4)
            .unwrap();
        let tile = arch.add_physical_type("clb", 1, 1, 1, vec![clb]).unwrap();
        TileGrid::builder(&arch, 2, 2, 1)
            .unwrap()
            .fill(tile)
            .unwrap()
            .build()
    }

    #[test]
    fn fractional_hint_floors_to_tile() {
        let grid = grid_2x2();
        let (tile, clamped) = containing_tile(&grid, FlatLoc::new(1.7, 0.2));
        assert_eq!(tile, TileLoc::new(1, 0, 0));
        assert!(!clamped);
    }

    #[test]
    fn outside_hint_is_clamped_with_warning() {
        let grid = grid_2x2();
        let mut nl = AtomNetlist::new();
        nl.add_block("a", tessel_arch::ModelId::from_raw(0));
        let p = Prepacked::singletons(&nl);
        let mut flat = FlatPlacement::new();
        flat.set(MoleculeId::from_raw(0), FlatLoc::new(-3.0, 9.0).with_sub_tile(0));
        let sink = DiagnosticSink::new();
        let hints = flat.resolve(&p, &grid, &sink);
        assert_eq!(hints.tile_of(MoleculeId::from_raw(0)), TileLoc::new(0, 1, 0));
        assert_eq!(hints.sub_tile_of(MoleculeId::from_raw(0)), Some(0));
        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::W101);
    }

    #[test]
    fn missing_hint_uses_center() {
        let grid = grid_2x2();
        let mut nl = AtomNetlist::new();
        nl.add_block("a", tessel_arch::ModelId::from_raw(0));
        let p = Prepacked::singletons(&nl);
        let sink = DiagnosticSink::new();
        let hints = FlatPlacement::new().resolve(&p, &grid, &sink);
        assert_eq!(hints.tile_of(MoleculeId::from_raw(0)), TileLoc::new(1, 1, 0));
        assert_eq!(hints.molecules_in(TileLoc::new(1, 1, 0)).len(), 1);
        assert_eq!(sink.take_all()[0].code, codes::W102);
    }

    #[test]
    fn centroid_averages_hints() {
        let mut flat = FlatPlacement::new();
        flat.set(MoleculeId::from_raw(0), FlatLoc::new(0.0, 0.0));
        flat.set(MoleculeId::from_raw(1), FlatLoc::new(2.0, 4.0));
        let c = flat
            .centroid(&[MoleculeId::from_raw(0), MoleculeId::from_raw(1), MoleculeId::from_raw(7)])
            .unwrap();
        assert_eq!((c.x, c.y), (1.0, 2.0));
        assert!(flat.centroid(&[MoleculeId::from_raw(5)]).is_none());
    }
}
