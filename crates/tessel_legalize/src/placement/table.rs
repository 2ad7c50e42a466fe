//! The cluster ↔ slot binding table.

use crate::ids::ClusterId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tessel_arch::PlLoc;

/// Injective map from placement slots to clusters.
///
/// Bindings are write-once: a bound cluster is never moved and a bound slot is
/// never reassigned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "TableRepr", into = "TableRepr")]
pub struct PlacementTable {
    by_loc: BTreeMap<PlLoc, ClusterId>,
    by_cluster: HashMap<ClusterId, PlLoc>,
    fixed: HashSet<ClusterId>,
}

impl PlacementTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `cluster` to `loc`. Returns `false`, changing nothing, if either
    /// side is already bound.
    pub fn bind(&mut self, cluster: ClusterId, loc: PlLoc) -> bool {
        if self.by_loc.contains_key(&loc) || self.by_cluster.contains_key(&cluster) {
            return false;
        }
        self.by_loc.insert(loc, cluster);
        self.by_cluster.insert(cluster, loc);
        true
    }

    /// Binds a cluster whose region pins it to one slot.
    pub fn bind_fixed(&mut self, cluster: ClusterId, loc: PlLoc) -> bool {
        let bound = self.bind(cluster, loc);
        if bound {
            self.fixed.insert(cluster);
        }
        bound
    }

    /// The slot `cluster` is bound to.
    pub fn location(&self, cluster: ClusterId) -> Option<PlLoc> {
        self.by_cluster.get(&cluster).copied()
    }

    /// The cluster bound to `loc`.
    pub fn occupant(&self, loc: PlLoc) -> Option<ClusterId> {
        self.by_loc.get(&loc).copied()
    }

    /// Returns `true` if no cluster is bound to `loc`.
    pub fn is_free(&self, loc: PlLoc) -> bool {
        !self.by_loc.contains_key(&loc)
    }

    /// Returns `true` if `cluster` is bound.
    pub fn is_placed(&self, cluster: ClusterId) -> bool {
        self.by_cluster.contains_key(&cluster)
    }

    /// Returns `true` if `cluster` was bound as a fixed cluster.
    pub fn is_fixed(&self, cluster: ClusterId) -> bool {
        self.fixed.contains(&cluster)
    }

    /// Number of bound clusters.
    pub fn len(&self) -> usize {
        self.by_cluster.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.by_cluster.is_empty()
    }

    /// Iterates over bindings in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (PlLoc, ClusterId)> + '_ {
        self.by_loc.iter().map(|(l, c)| (*l, *c))
    }
}

/// Flat serialized form; slot keys are not strings, so maps are stored as lists.
#[derive(Serialize, Deserialize)]
struct TableRepr {
    bindings: Vec<(PlLoc, ClusterId)>,
    fixed: Vec<ClusterId>,
}

impl From<PlacementTable> for TableRepr {
    fn from(table: PlacementTable) -> Self {
        let mut fixed: Vec<ClusterId> = table.fixed.into_iter().collect();
        fixed.sort_unstable();
        Self {
            bindings: table.by_loc.into_iter().collect(),
            fixed,
        }
    }
}

impl From<TableRepr> for PlacementTable {
    fn from(repr: TableRepr) -> Self {
        let mut table = PlacementTable::new();
        for (loc, cluster) in repr.bindings {
            table.bind(cluster, loc);
        }
        table.fixed = repr.fixed.into_iter().collect();
        table
    }
}
