//! Binding finished clusters to device slots.

use super::macros::{MacroMember, PlaceMacros};
use super::table::PlacementTable;
use crate::cluster::Clustering;
use crate::ids::ClusterId;
use tessel_arch::{PlLoc, TileGrid, TileLoc};

/// Places clusters, and the macros they belong to, onto a [`TileGrid`].
///
/// Every placement either binds the whole unit or changes nothing.
pub struct ClusterPlacer<'p> {
    grid: &'p TileGrid,
    clustering: &'p Clustering,
    macros: &'p PlaceMacros,
    table: PlacementTable,
}

impl<'p> ClusterPlacer<'p> {
    /// Creates a placer with an empty binding table.
    pub fn new(grid: &'p TileGrid, clustering: &'p Clustering, macros: &'p PlaceMacros) -> Self {
        Self {
            grid,
            clustering,
            macros,
            table: PlacementTable::new(),
        }
    }

    /// The device grid.
    pub fn grid(&self) -> &'p TileGrid {
        self.grid
    }

    /// The bindings made so far.
    pub fn table(&self) -> &PlacementTable {
        &self.table
    }

    /// Consumes the placer, returning its bindings.
    pub fn into_table(self) -> PlacementTable {
        self.table
    }

    /// The slot `cluster` is bound to.
    pub fn location(&self, cluster: ClusterId) -> Option<PlLoc> {
        self.table.location(cluster)
    }

    /// Binds the unit of `cluster` so that `cluster` itself lands on
    /// `(tile, sub_tile)`.
    ///
    /// Returns `true` without changes if the cluster is already placed, and
    /// `false` without changes if any member of its unit cannot take its slot.
    pub fn place(&mut self, cluster: ClusterId, tile: TileLoc, sub_tile: u32) -> bool {
        self.bind_unit(cluster, tile, sub_tile, false)
    }

    /// Tries `preferred` first, then every sub-tile of `tile` in order.
    pub fn place_in_tile(&mut self, cluster: ClusterId, tile: TileLoc, preferred: Option<u32>) -> bool {
        if let Some(sub) = preferred {
            if self.place(cluster, tile, sub) {
                return true;
            }
        }
        (0..self.grid.capacity(tile)).any(|sub| self.place(cluster, tile, sub))
    }

    /// Searches the cluster's whole legal area for any admissible slot: its
    /// floorplan region if it has one, the whole device otherwise.
    ///
    /// Idempotent on placed clusters. Returns `false` only once every tile of
    /// the area has been tried.
    pub fn exhaustive_place(&mut self, cluster: ClusterId) -> bool {
        if self.table.is_placed(cluster) {
            return true;
        }
        let grid = self.grid;
        let tiles: Vec<TileLoc> = match &self.clustering.cluster(cluster).region {
            Some(region) => region.tiles().filter(|t| grid.is_root(*t)).collect(),
            None => grid.root_tiles().collect(),
        };
        tiles
            .into_iter()
            .any(|tile| (0..grid.capacity(tile)).any(|sub| self.place(cluster, tile, sub)))
    }

    /// Binds every cluster whose floorplan region is a single slot.
    ///
    /// Returns the clusters whose slot was not admissible.
    pub fn place_fixed_clusters(&mut self) -> Vec<ClusterId> {
        let clustering = self.clustering;
        let mut failed = Vec::new();
        for (id, cluster) in clustering.clusters.iter() {
            let Some(site) = cluster.region.as_ref().and_then(|r| r.is_single_site()) else {
                continue;
            };
            if !self.bind_unit(id, site.tile(), site.sub_tile, true) {
                failed.push(id);
            }
        }
        failed
    }

    fn bind_unit(&mut self, cluster: ClusterId, tile: TileLoc, sub_tile: u32, fixed: bool) -> bool {
        if self.table.is_placed(cluster) {
            return true;
        }
        let unit = self.macros.unit(cluster);
        let Some(anchor) = unit.iter().find(|m| m.cluster == cluster).copied() else {
            return false;
        };
        let head = TileLoc::new(
            tile.x - anchor.dx,
            tile.y - anchor.dy,
            tile.layer - anchor.dlayer,
        );

        let mut slots = Vec::with_capacity(unit.len());
        for member in &unit {
            let loc = member_tile(head, member).with_sub_tile(sub_tile);
            if !self.admissible(member.cluster, loc) {
                return false;
            }
            slots.push((member.cluster, loc));
        }
        for (member, loc) in slots {
            if fixed {
                self.table.bind_fixed(member, loc);
            } else {
                self.table.bind(member, loc);
            }
        }
        true
    }

    fn admissible(&self, cluster: ClusterId, loc: PlLoc) -> bool {
        let tile = loc.tile();
        let fc = self.clustering.cluster(cluster);
        self.grid.is_root(tile)
            && loc.sub_tile < self.grid.capacity(tile)
            && self.grid.is_compatible(tile, fc.block_type)
            && fc.region.as_ref().map_or(true, |r| r.contains(loc))
            && self.table.is_free(loc)
            && !self.table.is_placed(cluster)
    }
}

fn member_tile(head: TileLoc, member: &MacroMember) -> TileLoc {
    TileLoc::new(
        head.x + member.dx,
        head.y + member.dy,
        head.layer + member.dlayer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flat::containing_tile;
    use crate::ids::MoleculeId;
    use crate::testutil::{cluster_each, Bench};
    use tessel_arch::{PartitionRegion, Region};

    #[test]
    fn place_binds_and_is_idempotent() {
        let bench = Bench::scenario_a();
        let clustering = cluster_each(&bench, |_| None);
        let macros = PlaceMacros::default();
        let mut placer = ClusterPlacer::new(&bench.grid, &clustering, &macros);
        let c0 = ClusterId::from_raw(0);
        assert!(placer.place(c0, TileLoc::new(1, 1, 0), 0));
        assert_eq!(placer.location(c0), Some(PlLoc::new(1, 1, 0, 0)));
        // Already placed: success, nothing moves.
        assert!(placer.place(c0, TileLoc::new(0, 0, 0), 0));
        assert!(placer.exhaustive_place(c0));
        assert_eq!(placer.location(c0), Some(PlLoc::new(1, 1, 0, 0)));
        assert_eq!(placer.table().len(), 1);
    }

    #[test]
    fn rejects_taken_slot_and_bad_sub_tile() {
        let bench = Bench::scenario_a();
        let clustering = cluster_each(&bench, |_| None);
        let macros = PlaceMacros::default();
        let mut placer = ClusterPlacer::new(&bench.grid, &clustering, &macros);
        let tile = TileLoc::new(0, 0, 0);
        assert!(placer.place(ClusterId::from_raw(0), tile, 0));
        assert!(!placer.place(ClusterId::from_raw(1), tile, 0));
        assert!(!placer.place(ClusterId::from_raw(1), tile, 1));
        assert!(!placer.place(ClusterId::from_raw(1), TileLoc::new(5, 5, 0), 0));
        assert!(!placer.table().is_placed(ClusterId::from_raw(1)));
    }

    #[test]
    fn region_outside_desired_site_fails_cleanly() {
        let bench = Bench::scenario_a();
        let region = PartitionRegion::new(vec![Region::rect(1, 0, 1, 1, 0)]);
        let clustering = cluster_each(&bench, |i| (i == 0).then(|| region.clone()));
        let macros = PlaceMacros::default();
        let mut placer = ClusterPlacer::new(&bench.grid, &clustering, &macros);
        let c0 = ClusterId::from_raw(0);
        assert!(!placer.place(c0, TileLoc::new(0, 0, 0), 0));
        assert!(placer.table().is_empty());
        assert!(placer.exhaustive_place(c0));
        assert_eq!(placer.location(c0).map(|l| l.x), Some(1));
    }

    #[test]
    fn exhaustive_fails_only_when_device_is_full() {
        let bench = Bench::scenario_a();
        let clustering = cluster_each(&bench, |_| None);
        let macros = PlaceMacros::default();
        let mut placer = ClusterPlacer::new(&bench.grid, &clustering, &macros);
        for i in 0..4 {
            assert!(placer.exhaustive_place(ClusterId::from_raw(i)));
        }
        let slots: std::collections::HashSet<_> = placer.table().iter().map(|(l, _)| l).collect();
        assert_eq!(slots.len(), 4);
    }

    #[test]
    fn fixed_clusters_bind_first() {
        let bench = Bench::scenario_a();
        let site = PlLoc::new(1, 0, 0, 0);
        let region = PartitionRegion::new(vec![Region::site(site)]);
        let clustering = cluster_each(&bench, |i| (i == 2).then(|| region.clone()));
        let macros = PlaceMacros::default();
        let mut placer = ClusterPlacer::new(&bench.grid, &clustering, &macros);
        assert!(placer.place_fixed_clusters().is_empty());
        assert_eq!(placer.location(ClusterId::from_raw(2)), Some(site));
        assert!(placer.table().is_fixed(ClusterId::from_raw(2)));
    }

    #[test]
    fn macro_binds_all_members_or_none() {
        let bench = Bench::with_chain();
        let clustering = cluster_each(&bench, |_| None);
        let macros = PlaceMacros::from_chains(&bench.prepacked, &clustering);
        assert_eq!(macros.len(), 1);
        let head = ClusterId::from_raw(0);
        let tail = ClusterId::from_raw(1);
        assert_eq!(macros.unit(tail).len(), 2);

        let mut placer = ClusterPlacer::new(&bench.grid, &clustering, &macros);
        // The tail would need row 2 on a 2-row device.
        assert!(!placer.place(head, TileLoc::new(0, 1, 0), 0));
        assert!(placer.table().is_empty());
        // Placing the tail drags the head one row below it.
        assert!(placer.place(tail, TileLoc::new(1, 1, 0), 0));
        assert_eq!(placer.location(head), Some(PlLoc::new(1, 0, 0, 0)));
        assert_eq!(placer.location(tail), Some(PlLoc::new(1, 1, 0, 0)));
    }

    #[test]
    fn tall_tiles_bind_only_at_their_root() {
        // 1x2 tiles rooted at (0, 0) and (1, 0); every hint is on (0, 1).
        let bench = Bench::tall_tiles(3);
        let clustering = cluster_each(&bench, |_| None);
        let macros = PlaceMacros::default();
        let mut placer = ClusterPlacer::new(&bench.grid, &clustering, &macros);
        let upper = TileLoc::new(0, 1, 0);
        let c0 = ClusterId::from_raw(0);
        assert!(!placer.place(c0, upper, 0));
        assert!(!placer.table().is_placed(c0));

        let hint = bench.flat.get(MoleculeId::from_raw(0)).unwrap();
        let (desired, clamped) = containing_tile(&bench.grid, hint);
        assert_eq!((desired, clamped), (TileLoc::new(0, 0, 0), false));
        assert!(placer.place(c0, desired, 0));

        let c1 = ClusterId::from_raw(1);
        assert!(placer.exhaustive_place(c1));
        assert_eq!(placer.location(c1), Some(PlLoc::new(1, 0, 0, 0)));
        // Two roots, three clusters: the upper cells never count as slots.
        assert!(!placer.exhaustive_place(ClusterId::from_raw(2)));
        assert_eq!(placer.table().len(), 2);
    }
}
