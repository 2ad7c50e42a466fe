//! The device grid: cell types, multi-cell footprints, and sub-tile capacity.
//!
//! Every cell records its physical tile type and its offset from the root cell
//! of the footprint covering it. Only root cells are legal placement anchors.

use crate::error::ArchError;
use crate::ids::{LogicalTypeId, PhysicalTypeId};
use crate::types::PhysicalTileType;
use crate::Architecture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tessel_common::Arena;

/// A grid cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileLoc {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Die layer.
    pub layer: i32,
}

impl TileLoc {
    /// Creates a tile location.
    pub const fn new(x: i32, y: i32, layer: i32) -> Self {
        Self { x, y, layer }
    }

    /// Returns the location shifted by `(dx, dy)` on the same layer.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.layer)
    }

    /// Returns the sub-tile `sub_tile` of this tile.
    pub fn with_sub_tile(self, sub_tile: u32) -> PlLoc {
        PlLoc::new(self.x, self.y, self.layer, sub_tile)
    }

    /// Manhattan distance in the x/y plane, ignoring the layer.
    pub fn manhattan(self, other: TileLoc) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for TileLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.layer)
    }
}

/// A concrete placement slot: a tile plus a sub-tile index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlLoc {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Die layer.
    pub layer: i32,
    /// Sub-tile index within the tile.
    pub sub_tile: u32,
}

impl PlLoc {
    /// Creates a placement location.
    pub const fn new(x: i32, y: i32, layer: i32, sub_tile: u32) -> Self {
        Self {
            x,
            y,
            layer,
            sub_tile,
        }
    }

    /// Returns the tile part of this location.
    pub fn tile(self) -> TileLoc {
        TileLoc::new(self.x, self.y, self.layer)
    }
}

impl fmt::Display for PlLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}):{}", self.x, self.y, self.layer, self.sub_tile)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct Cell {
    tile_type: Option<PhysicalTypeId>,
    dx: u32,
    dy: u32,
}

/// The static device grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    width: u32,
    height: u32,
    layers: u32,
    cells: Vec<Cell>,
    tile_types: Arena<PhysicalTypeId, PhysicalTileType>,
    type_capacity: HashMap<LogicalTypeId, u32>,
}

impl TileGrid {
    /// Starts building a grid of the given dimensions for `arch`.
    pub fn builder(
        arch: &Architecture,
        width: u32,
        height: u32,
        layers: u32,
    ) -> Result<TileGridBuilder, ArchError> {
        TileGridBuilder::new(arch, width, height, layers)
    }

    /// Grid width in cells.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of die layers.
    pub fn layers(&self) -> u32 {
        self.layers
    }

    /// Returns `true` if `loc` lies inside the device.
    pub fn contains(&self, loc: TileLoc) -> bool {
        loc.x >= 0
            && loc.y >= 0
            && loc.layer >= 0
            && (loc.x as u32) < self.width
            && (loc.y as u32) < self.height
            && (loc.layer as u32) < self.layers
    }

    fn cell(&self, loc: TileLoc) -> Option<&Cell> {
        if !self.contains(loc) {
            return None;
        }
        let index = cell_index(self.width, self.height, loc);
        self.cells.get(index)
    }

    /// The physical type covering `loc`, or `None` for empty or off-device cells.
    pub fn physical_type(&self, loc: TileLoc) -> Option<PhysicalTypeId> {
        self.cell(loc).and_then(|c| c.tile_type)
    }

    /// The physical tile type with the given ID.
    pub fn tile_type(&self, id: PhysicalTypeId) -> &PhysicalTileType {
        &self.tile_types[id]
    }

    /// Offset `(dx, dy)` from the footprint root to `loc`.
    pub fn root_offset(&self, loc: TileLoc) -> (u32, u32) {
        self.cell(loc).map(|c| (c.dx, c.dy)).unwrap_or((0, 0))
    }

    /// The root cell of the footprint covering `loc`.
    pub fn root_of(&self, loc: TileLoc) -> TileLoc {
        let (dx, dy) = self.root_offset(loc);
        loc.offset(-(dx as i32), -(dy as i32))
    }

    /// Returns `true` if `loc` is a typed footprint root.
    pub fn is_root(&self, loc: TileLoc) -> bool {
        matches!(self.cell(loc), Some(c) if c.tile_type.is_some() && c.dx == 0 && c.dy == 0)
    }

    /// Sub-tile capacity of the tile at `loc`; zero for empty or off-device cells.
    pub fn capacity(&self, loc: TileLoc) -> u32 {
        self.physical_type(loc)
            .map(|t| self.tile_types[t].capacity)
            .unwrap_or(0)
    }

    /// Returns `true` if a cluster of `logical` may occupy the tile at `loc`.
    pub fn is_compatible(&self, loc: TileLoc, logical: LogicalTypeId) -> bool {
        self.physical_type(loc)
            .is_some_and(|t| self.tile_types[t].accepts(logical))
    }

    /// Iterates over all root tiles, layer-major, then by column, then by row.
    pub fn root_tiles(&self) -> impl Iterator<Item = TileLoc> + '_ {
        let (w, h, l) = (self.width as i32, self.height as i32, self.layers as i32);
        (0..l)
            .flat_map(move |layer| {
                (0..w).flat_map(move |x| (0..h).map(move |y| TileLoc::new(x, y, layer)))
            })
            .filter(|loc| self.is_root(*loc))
    }

    /// Total sub-tiles on the device able to host `logical`.
    pub fn type_capacity(&self, logical: LogicalTypeId) -> u32 {
        self.type_capacity.get(&logical).copied().unwrap_or(0)
    }
}

fn cell_index(width: u32, height: u32, loc: TileLoc) -> usize {
    let plane = width as usize * height as usize;
    loc.layer as usize * plane + loc.x as usize * height as usize + loc.y as usize
}

/// Stamps tile footprints onto an initially empty grid.
#[derive(Debug)]
pub struct TileGridBuilder {
    width: u32,
    height: u32,
    layers: u32,
    cells: Vec<Cell>,
    tile_types: Arena<PhysicalTypeId, PhysicalTileType>,
}

impl TileGridBuilder {
    /// Creates a builder for an empty `width × height × layers` grid.
    pub fn new(
        arch: &Architecture,
        width: u32,
        height: u32,
        layers: u32,
    ) -> Result<Self, ArchError> {
        if width == 0 || height == 0 || layers == 0 {
            return Err(ArchError::EmptyGrid {
                width,
                height,
                layers,
            });
        }
        let count = width as usize * height as usize * layers as usize;
        Ok(Self {
            width,
            height,
            layers,
            cells: vec![Cell::default(); count],
            tile_types: arch.physical_types.clone(),
        })
    }

    fn in_bounds(&self, loc: TileLoc) -> bool {
        loc.x >= 0
            && loc.y >= 0
            && loc.layer >= 0
            && (loc.x as u32) < self.width
            && (loc.y as u32) < self.height
            && (loc.layer as u32) < self.layers
    }

    /// Stamps one tile of `tile_type` with its root at `root`.
    pub fn place(&mut self, root: TileLoc, tile_type: PhysicalTypeId) -> Result<&mut Self, ArchError> {
        let (name, w, h) = {
            let t = &self.tile_types[tile_type];
            (t.name.clone(), t.width, t.height)
        };
        let far = root.offset(w as i32 - 1, h as i32 - 1);
        if !self.in_bounds(root) || !self.in_bounds(far) {
            return Err(ArchError::FootprintOutOfBounds {
                tile: name,
                x: root.x,
                y: root.y,
                layer: root.layer,
            });
        }
        for dx in 0..w {
            for dy in 0..h {
                let loc = root.offset(dx as i32, dy as i32);
                let index = cell_index(self.width, self.height, loc);
                if self.cells[index].tile_type.is_some() {
                    return Err(ArchError::FootprintOverlap {
                        tile: name,
                        x: loc.x,
                        y: loc.y,
                        layer: loc.layer,
                    });
                }
            }
        }
        for dx in 0..w {
            for dy in 0..h {
                let loc = root.offset(dx as i32, dy as i32);
                let index = cell_index(self.width, self.height, loc);
                self.cells[index] = Cell {
                    tile_type: Some(tile_type),
                    dx,
                    dy,
                };
            }
        }
        Ok(self)
    }

    /// Stamps `tile_type` up column `x` on `layer` starting at row `y0`, as
    /// many times as it fits without overlapping.
    pub fn column(
        &mut self,
        x: i32,
        y0: i32,
        layer: i32,
        tile_type: PhysicalTypeId,
    ) -> Result<&mut Self, ArchError> {
        let step = self.tile_types[tile_type].height as i32;
        let mut y = y0;
        while y + step <= self.height as i32 {
            self.place(TileLoc::new(x, y, layer), tile_type)?;
            y += step;
        }
        Ok(self)
    }

    /// Stamps `tile_type` on every still-empty cell where its whole footprint fits.
    pub fn fill(&mut self, tile_type: PhysicalTypeId) -> Result<&mut Self, ArchError> {
        let (w, h) = {
            let t = &self.tile_types[tile_type];
            (t.width as i32, t.height as i32)
        };
        for layer in 0..self.layers as i32 {
            for x in 0..self.width as i32 {
                for y in 0..self.height as i32 {
                    let root = TileLoc::new(x, y, layer);
                    if self.footprint_free(root, w, h) {
                        self.place(root, tile_type)?;
                    }
                }
            }
        }
        Ok(self)
    }

    fn footprint_free(&self, root: TileLoc, w: i32, h: i32) -> bool {
        (0..w).all(|dx| {
            (0..h).all(|dy| {
                let loc = root.offset(dx, dy);
                self.in_bounds(loc)
                    && self.cells[cell_index(self.width, self.height, loc)]
                        .tile_type
                        .is_none()
            })
        })
    }

    /// Finishes the grid, precomputing per-logical-type sub-tile totals.
    pub fn build(&mut self) -> TileGrid {
        let mut type_capacity: HashMap<LogicalTypeId, u32> = HashMap::new();
        for cell in &self.cells {
            let Some(t) = cell.tile_type else { continue };
            if cell.dx != 0 || cell.dy != 0 {
                continue;
            }
            let tile = &self.tile_types[t];
            for logical in &tile.compatible {
                *type_capacity.entry(*logical).or_insert(0) += tile.capacity;
            }
        }
        TileGrid {
            width: self.width,
            height: self.height,
            layers: self.layers,
            cells: self.cells.clone(),
            tile_types: self.tile_types.clone(),
            type_capacity,
        }
    }
}
