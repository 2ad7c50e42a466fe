//! Floorplan regions restricting where clusters may be placed.

use crate::grid::{PlLoc, TileLoc};
use serde::{Deserialize, Serialize};

/// An inclusive rectangle on one layer, optionally pinned to a sub-tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// Lowest column.
    pub x_min: i32,
    /// Lowest row.
    pub y_min: i32,
    /// Highest column.
    pub x_max: i32,
    /// Highest row.
    pub y_max: i32,
    /// Layer the rectangle lives on.
    pub layer: i32,
    /// Sub-tile the region is pinned to, if any.
    pub sub_tile: Option<u32>,
}

impl Region {
    /// Creates a rectangle spanning `(x_min, y_min)` to `(x_max, y_max)` inclusive.
    pub fn rect(x_min: i32, y_min: i32, x_max: i32, y_max: i32, layer: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
            layer,
            sub_tile: None,
        }
    }

    /// Creates a region covering exactly one placement slot.
    pub fn site(loc: PlLoc) -> Self {
        Self {
            x_min: loc.x,
            y_min: loc.y,
            x_max: loc.x,
            y_max: loc.y,
            layer: loc.layer,
            sub_tile: Some(loc.sub_tile),
        }
    }

    /// Returns `true` if the rectangle covers no cell.
    pub fn is_empty(&self) -> bool {
        self.x_min > self.x_max || self.y_min > self.y_max
    }

    /// Returns `true` if `loc` lies inside the rectangle and matches the pinned sub-tile.
    pub fn contains(&self, loc: PlLoc) -> bool {
        self.contains_tile(loc.tile()) && self.sub_tile.map_or(true, |s| s == loc.sub_tile)
    }

    /// Returns `true` if the tile lies inside the rectangle.
    pub fn contains_tile(&self, loc: TileLoc) -> bool {
        loc.layer == self.layer
            && (self.x_min..=self.x_max).contains(&loc.x)
            && (self.y_min..=self.y_max).contains(&loc.y)
    }

    /// The overlap of two regions, or `None` if they are disjoint.
    pub fn intersect(&self, other: &Region) -> Option<Region> {
        if self.layer != other.layer {
            return None;
        }
        let sub_tile = match (self.sub_tile, other.sub_tile) {
            (Some(a), Some(b)) if a != b => return None,
            (a, b) => a.or(b),
        };
        let region = Region {
            x_min: self.x_min.max(other.x_min),
            y_min: self.y_min.max(other.y_min),
            x_max: self.x_max.min(other.x_max),
            y_max: self.y_max.min(other.y_max),
            layer: self.layer,
            sub_tile,
        };
        (!region.is_empty()).then_some(region)
    }

    /// Iterates over the tiles covered, by column then row.
    pub fn tiles(&self) -> impl Iterator<Item = TileLoc> {
        let Region {
            x_min,
            y_min,
            x_max,
            y_max,
            layer,
            ..
        } = *self;
        (x_min..=x_max).flat_map(move |x| (y_min..=y_max).map(move |y| TileLoc::new(x, y, layer)))
    }
}

/// A union of [`Region`]s an atom or cluster is confined to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionRegion {
    /// The member rectangles.
    pub regions: Vec<Region>,
}

impl PartitionRegion {
    /// Creates a partition region from its rectangles, dropping empty ones.
    pub fn new(regions: Vec<Region>) -> Self {
        Self {
            regions: regions.into_iter().filter(|r| !r.is_empty()).collect(),
        }
    }

    /// Returns `true` if no placement slot satisfies the region.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Returns `true` if any member rectangle contains `loc`.
    pub fn contains(&self, loc: PlLoc) -> bool {
        self.regions.iter().any(|r| r.contains(loc))
    }

    /// Returns `true` if any member rectangle contains the tile.
    pub fn contains_tile(&self, loc: TileLoc) -> bool {
        self.regions.iter().any(|r| r.contains_tile(loc))
    }

    /// Pairwise intersection of both unions.
    pub fn intersect(&self, other: &PartitionRegion) -> PartitionRegion {
        let regions = self
            .regions
            .iter()
            .flat_map(|a| other.regions.iter().filter_map(move |b| a.intersect(b)))
            .collect();
        PartitionRegion { regions }
    }

    /// If the region admits exactly one placement slot, returns it.
    pub fn is_single_site(&self) -> Option<PlLoc> {
        match self.regions.as_slice() {
            [r] if r.x_min == r.x_max && r.y_min == r.y_max => r
                .sub_tile
                .map(|s| PlLoc::new(r.x_min, r.y_min, r.layer, s)),
            _ => None,
        }
    }

    /// Iterates over every tile covered by any member rectangle.
    ///
    /// Tiles covered by overlapping rectangles are yielded once per rectangle.
    pub fn tiles(&self) -> impl Iterator<Item = TileLoc> + '_ {
        self.regions.iter().flat_map(|r| r.tiles())
    }
}
