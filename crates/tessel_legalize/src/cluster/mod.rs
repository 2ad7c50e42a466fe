//! Clustering: turning molecules into legal clusters.
//!
//! Three clusterers share the helpers here: [`GreedyClusterer`] grows clusters
//! from ranked seeds, [`ReconstructionClusterer`] rebuilds clusters around the
//! tiles molecules were hinted to, and the naive binning in [`naive`] packs
//! each hinted tile into as few clusters as it can. All of them drive a
//! [`LegalityOracle`](crate::oracle::LegalityOracle) and record, per cluster,
//! where placement should try to put it.

mod candidate;
mod greedy;
pub(crate) mod naive;
mod reconstruct;
mod seed;

pub use greedy::{GreedyClusterer, GreedyOutcome};
pub use reconstruct::{ReconstructionClusterer, ReconstructionOutcome};
pub use seed::{rank_for_reconstruction, SeedSelector};

use crate::context::LegalizeContext;
use crate::error::LegalizeError;
use crate::ids::{ClusterId, MoleculeId};
use crate::oracle::{LegalityOracle, LegalizationStrategy, PackStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tessel_arch::{LogicalTypeId, PartitionRegion, TileGrid, TileLoc};
use tessel_common::{Arena, InternalError};

/// Which pass created a cluster. Placement binds tile-pass clusters first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterOrigin {
    /// Naive per-tile binning.
    Naive,
    /// Greedy seed-driven growth.
    Greedy,
    /// Reconstruction tile-grouped pass.
    TilePass,
    /// Reconstruction neighbor-search pass.
    NeighborPass,
}

/// Where placement should try to put a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredLocation {
    /// Root tile the cluster was built for.
    pub tile: TileLoc,
    /// Sub-tile claimed during clustering, if any.
    pub sub_tile: Option<u32>,
}

/// Where one cluster is in its two-tier lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Start from the seed and grow under the given tier.
    Build(LegalizationStrategy),
    /// Growth stalled under the cheap tier; run the strict check.
    Check(ClusterId),
    /// The strict check failed; destroy and regrow under the strict tier.
    Abandon(ClusterId),
    /// The cluster is kept.
    Finalize(ClusterId),
}

/// Per-cluster bookkeeping kept by a clustering pass alongside the oracle.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ClusterMeta {
    pub(crate) desired: Option<DesiredLocation>,
    pub(crate) origin: ClusterOrigin,
}

/// A finalized cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalCluster {
    /// The cluster's block type.
    pub block_type: LogicalTypeId,
    /// The cluster's mode index.
    pub mode: usize,
    /// Members in insertion order.
    pub molecules: Vec<MoleculeId>,
    /// Floorplan region, `None` if unconstrained.
    pub region: Option<PartitionRegion>,
    /// Placement hint.
    pub desired: Option<DesiredLocation>,
    /// The pass that created the cluster.
    pub origin: ClusterOrigin,
}

/// The final cluster table handed to placement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Clustering {
    /// Clusters, densely numbered.
    pub clusters: Arena<ClusterId, FinalCluster>,
    molecule_cluster: HashMap<MoleculeId, ClusterId>,
}

impl Clustering {
    /// Compresses the oracle and collects its live clusters.
    pub(crate) fn harvest(
        ctx: &LegalizeContext<'_>,
        oracle: &mut dyn LegalityOracle,
        meta: HashMap<ClusterId, ClusterMeta>,
    ) -> Result<Self, LegalizeError> {
        let remap = oracle.compress();
        let mut by_new: HashMap<ClusterId, ClusterMeta> = HashMap::with_capacity(meta.len());
        for (old, m) in meta {
            if let Some(new) = remap.get(old) {
                by_new.insert(new, m);
            }
        }

        let mut clustering = Clustering::default();
        for id in oracle.live_clusters() {
            let m = by_new.get(&id).ok_or_else(|| {
                InternalError::new(format!("cluster {id} has no pass bookkeeping"))
            })?;
            let molecules = oracle.members(id).to_vec();
            let region = ctx
                .floorplan
                .and_then(|fp| fp.region_of(ctx.prepacked, &molecules));
            let allocated = clustering.push(FinalCluster {
                block_type: oracle.block_type(id),
                mode: oracle.mode(id),
                molecules,
                region,
                desired: m.desired,
                origin: m.origin,
            });
            if allocated != id {
                return Err(InternalError::new(format!(
                    "compressed cluster {id} landed at {allocated}"
                ))
                .into());
            }
        }
        Ok(clustering)
    }

    /// Appends a finalized cluster and indexes its members.
    pub(crate) fn push(&mut self, cluster: FinalCluster) -> ClusterId {
        let members = cluster.molecules.clone();
        let id = self.clusters.alloc(cluster);
        for mol in members {
            self.molecule_cluster.insert(mol, id);
        }
        id
    }

    /// The cluster holding `molecule`.
    pub fn cluster_of(&self, molecule: MoleculeId) -> Option<ClusterId> {
        self.molecule_cluster.get(&molecule).copied()
    }

    /// The cluster with the given ID.
    pub fn cluster(&self, id: ClusterId) -> &FinalCluster {
        &self.clusters[id]
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Returns `true` if there are no clusters.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

/// Fails with [`LegalizeError::ArchitectureMismatch`] if any molecule has an
/// atom whose model no block type can hold.
pub fn check_candidates(ctx: &LegalizeContext<'_>) -> Result<(), LegalizeError> {
    for (id, mol) in ctx.prepacked.molecules.iter() {
        for &atom in &mol.atoms {
            let model = ctx.netlist.blocks[atom].model;
            if ctx.candidates.candidates(model).is_empty() {
                return Err(mismatch(ctx, id));
            }
        }
    }
    Ok(())
}

pub(crate) fn mismatch(ctx: &LegalizeContext<'_>, molecule: MoleculeId) -> LegalizeError {
    let root = ctx.prepacked.molecule(molecule).root();
    let model = ctx.netlist.blocks[root].model;
    LegalizeError::ArchitectureMismatch {
        molecule,
        model: ctx.arch.models[model].name.clone(),
    }
}

/// Tracks clusters per block type so new clusters prefer the least utilized type.
#[derive(Debug, Clone, Default)]
pub(crate) struct TypeBalancer {
    used: HashMap<LogicalTypeId, u32>,
    enabled: bool,
}

impl TypeBalancer {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            used: HashMap::new(),
            enabled,
        }
    }

    pub(crate) fn record(&mut self, block_type: LogicalTypeId) {
        *self.used.entry(block_type).or_insert(0) += 1;
    }

    pub(crate) fn release(&mut self, block_type: LogicalTypeId) {
        if let Some(n) = self.used.get_mut(&block_type) {
            *n = n.saturating_sub(1);
        }
    }

    /// Candidate types in start preference order.
    fn order(&self, grid: &TileGrid, candidates: &[LogicalTypeId]) -> Vec<LogicalTypeId> {
        let mut ordered = candidates.to_vec();
        if self.enabled {
            let utilization = |t: &LogicalTypeId| -> f64 {
                let capacity = grid.type_capacity(*t);
                if capacity == 0 {
                    return f64::INFINITY;
                }
                f64::from(self.used.get(t).copied().unwrap_or(0)) / f64::from(capacity)
            };
            ordered.sort_by(|a, b| utilization(a).total_cmp(&utilization(b)));
        }
        ordered
    }
}

/// Probes candidate `(type, mode)` pairs for `molecule` in preference order
/// and returns the first cluster the oracle starts.
///
/// `allow` filters candidate types (e.g. to those a given tile accepts).
/// Returns `Ok(None)` when every allowed pair is rejected.
pub(crate) fn start_cluster(
    ctx: &LegalizeContext<'_>,
    oracle: &mut dyn LegalityOracle,
    balancer: &TypeBalancer,
    molecule: MoleculeId,
    allow: impl Fn(LogicalTypeId) -> bool,
) -> Result<Option<ClusterId>, LegalizeError> {
    let root = ctx.prepacked.molecule(molecule).root();
    let candidates = ctx.candidates.candidates(ctx.netlist.blocks[root].model);
    if candidates.is_empty() {
        return Err(mismatch(ctx, molecule));
    }
    for block_type in balancer.order(ctx.grid, candidates) {
        if !allow(block_type) {
            continue;
        }
        let modes = ctx.arch.logical_types[block_type].modes.len();
        for mode in 0..modes {
            if let (PackStatus::Passed, Some(cluster)) = oracle.start(molecule, block_type, mode) {
                return Ok(Some(cluster));
            }
        }
    }
    Ok(None)
}

/// Molecules not in any cluster.
pub(crate) fn unclustered(ctx: &LegalizeContext<'_>, oracle: &dyn LegalityOracle) -> Vec<MoleculeId> {
    ctx.prepacked
        .molecules
        .ids()
        .filter(|m| oracle.molecule_cluster(*m).is_none())
        .collect()
}
