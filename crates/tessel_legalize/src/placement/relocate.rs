//! Radius-expanding search for clusters whose desired slot is taken.

use super::placer::ClusterPlacer;
use super::ring::ManhattanRing;
use crate::error::LegalizeError;
use crate::ids::ClusterId;
use tessel_arch::{LogicalTypeId, PlLoc, TileLoc};

/// Finds the nearest free, compatible slot around a desired tile.
///
/// Rings grow from radius zero until they span the whole device. Within a
/// radius, layers closer to the desired one come first.
#[derive(Debug, Clone, Copy)]
pub struct RelocationSearch {
    max_radius: u32,
}

impl RelocationSearch {
    /// Creates a search bounded by the placer's device.
    pub fn new(placer: &ClusterPlacer<'_>) -> Self {
        let grid = placer.grid();
        Self {
            max_radius: (grid.width() + grid.height()).saturating_sub(2),
        }
    }

    /// The largest radius tried.
    pub fn max_radius(&self) -> u32 {
        self.max_radius
    }

    /// Places `cluster` at the first admissible slot nearest `desired`.
    ///
    /// Fails with [`LegalizeError::RelocationExhausted`] once the maximum
    /// radius has been searched.
    pub fn relocate(
        &self,
        placer: &mut ClusterPlacer<'_>,
        cluster: ClusterId,
        block_type: LogicalTypeId,
        desired: TileLoc,
    ) -> Result<PlLoc, LegalizeError> {
        if let Some(loc) = placer.location(cluster) {
            return Ok(loc);
        }
        let grid = placer.grid();
        let mut layers: Vec<i32> = (0..grid.layers() as i32).collect();
        layers.sort_by_key(|l| ((l - desired.layer).abs(), *l));

        for radius in 0..=self.max_radius {
            for &layer in &layers {
                let center = TileLoc::new(desired.x, desired.y, layer);
                for tile in ManhattanRing::new(center, radius) {
                    if !grid.is_root(tile) || !grid.is_compatible(tile, block_type) {
                        continue;
                    }
                    for sub in 0..grid.capacity(tile) {
                        if placer.place(cluster, tile, sub) {
                            return Ok(tile.with_sub_tile(sub));
                        }
                    }
                }
            }
        }
        Err(LegalizeError::RelocationExhausted {
            cluster,
            radius: self.max_radius,
        })
    }
}
