//! The legality oracle: the arbiter of which molecules may share a cluster.
//!
//! Clustering passes never reason about architecture legality themselves.
//! They ask a [`LegalityOracle`] to start clusters and add molecules, under
//! either the cheap or the strict tier, and react to the returned
//! [`PackStatus`].

mod capacity;

pub use capacity::CapacityOracle;

use crate::ids::{ClusterId, MoleculeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tessel_arch::LogicalTypeId;

/// Which legality tier the oracle applies to `start` and `add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegalizationStrategy {
    /// Capacity and pin feasibility only.
    Cheap,
    /// Full internal-routing feasibility on every mutation.
    Strict,
}

/// Outcome of a `start` or `add` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackStatus {
    /// The molecule was added.
    Passed,
    /// The mode has no room for one of the molecule's models.
    FailedCapacity,
    /// The cluster would need more external inputs than it has pins.
    FailedPins,
    /// The cluster's contents cannot be internally routed.
    FailedRouting,
    /// The floorplan regions of the cluster and molecule do not overlap.
    FailedFloorplan,
    /// The cluster was cleaned and accepts no more molecules.
    ClusterClosed,
    /// The molecule is already in a cluster.
    AlreadyClustered,
}

impl PackStatus {
    /// Returns `true` for [`PackStatus::Passed`].
    pub fn is_pass(self) -> bool {
        self == PackStatus::Passed
    }
}

/// Old → new cluster ID mapping produced by [`LegalityOracle::compress`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterRemap {
    map: HashMap<ClusterId, ClusterId>,
}

impl ClusterRemap {
    /// Records that `old` is now `new`.
    pub fn insert(&mut self, old: ClusterId, new: ClusterId) {
        self.map.insert(old, new);
    }

    /// The new ID of `old`, or `None` if the cluster was destroyed.
    pub fn get(&self, old: ClusterId) -> Option<ClusterId> {
        self.map.get(&old).copied()
    }

    /// Number of surviving clusters.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if no cluster survived.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Arbiter of cluster legality.
///
/// Implementations own every cluster under construction. Callers must hold
/// exclusive access; nothing here is meant to be shared across threads.
pub trait LegalityOracle {
    /// Selects the tier applied by [`start`](Self::start) and [`add`](Self::add).
    fn set_strategy(&mut self, strategy: LegalizationStrategy);

    /// The current tier.
    fn strategy(&self) -> LegalizationStrategy;

    /// Starts a cluster of `block_type` in mode index `mode` holding `molecule`.
    fn start(
        &mut self,
        molecule: MoleculeId,
        block_type: LogicalTypeId,
        mode: usize,
    ) -> (PackStatus, Option<ClusterId>);

    /// Adds `molecule` to `cluster`. On failure the cluster is unchanged.
    fn add(&mut self, molecule: MoleculeId, cluster: ClusterId) -> PackStatus;

    /// Returns `true` if the cluster's type and mode could ever hold `molecule`.
    fn is_compatible(&self, molecule: MoleculeId, cluster: ClusterId) -> bool;

    /// Runs the strict check on the cluster as it stands.
    fn check_strict_legality(&mut self, cluster: ClusterId) -> bool;

    /// Closes the cluster to further additions and drops transient bookkeeping.
    fn clean(&mut self, cluster: ClusterId);

    /// Destroys the cluster, returning its members to the unclustered pool.
    fn destroy(&mut self, cluster: ClusterId) -> Vec<MoleculeId>;

    /// Members of the cluster in insertion order.
    fn members(&self, cluster: ClusterId) -> &[MoleculeId];

    /// The cluster's logical block type.
    fn block_type(&self, cluster: ClusterId) -> LogicalTypeId;

    /// The cluster's mode index.
    fn mode(&self, cluster: ClusterId) -> usize;

    /// Returns `true` if the cluster's mode still has a free primitive slot.
    fn has_remaining_capacity(&self, cluster: ClusterId) -> bool;

    /// The cluster holding `molecule`, if any.
    fn molecule_cluster(&self, molecule: MoleculeId) -> Option<ClusterId>;

    /// External input pins the cluster can still take.
    fn inputs_available(&self, cluster: ClusterId) -> u32;

    /// IDs of all clusters not destroyed, ascending.
    fn live_clusters(&self) -> Vec<ClusterId>;

    /// Renumbers live clusters densely from zero, preserving order.
    fn compress(&mut self) -> ClusterRemap;
}
