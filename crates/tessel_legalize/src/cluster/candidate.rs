//! Candidate molecules for growing a greedy cluster.
//!
//! Candidates come from a fixed sequence of sources, each consulted only when
//! the ones before it have nothing left: molecules hinted to the seed's tile,
//! connectivity-scored neighbors, the lowest-fanout high-fanout net, the
//! cluster's attraction groups, and finally unrelated filler. A successful
//! addition rescores everything and restarts the sequence.

use crate::context::LegalizeContext;
use crate::ids::{AtomBlockId, AtomNetId, AttractGroupId, ClusterId, MoleculeId};
use crate::oracle::LegalityOracle;
use std::collections::{BTreeSet, HashMap, HashSet};
use tessel_config::ClusteringConfig;

/// Gain adjustment for a candidate attracted to a different group than the cluster.
const FOREIGN_GROUP_PENALTY: f32 = -0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    SameTile,
    Connectivity,
    HighFanout,
    Attraction,
    Unrelated,
    Exhausted,
}

/// Unclustered-filler index: molecules bucketed by external input count.
#[derive(Debug, Clone)]
pub(crate) struct UnrelatedBuckets {
    buckets: Vec<Vec<MoleculeId>>,
}

impl UnrelatedBuckets {
    pub(crate) fn new(ctx: &LegalizeContext<'_>) -> Self {
        let mut buckets: Vec<Vec<MoleculeId>> = Vec::new();
        for (id, mol) in ctx.prepacked.molecules.iter() {
            let k = mol.stats.ext_inputs as usize;
            if buckets.len() <= k {
                buckets.resize_with(k + 1, Vec::new);
            }
            buckets[k].push(id);
        }
        Self { buckets }
    }
}

/// Per-cluster candidate state.
pub(crate) struct CandidateSource<'c, 'a> {
    ctx: &'c LegalizeContext<'a>,
    config: &'c ClusteringConfig,
    unrelated: &'c UnrelatedBuckets,
    repeat_limit: usize,
    preferred: Vec<MoleculeId>,
    source: Source,
    feasible: Vec<(MoleculeId, f32)>,
    cluster_atoms: HashSet<AtomBlockId>,
    cluster_nets: BTreeSet<AtomNetId>,
    groups: BTreeSet<AttractGroupId>,
    failures: HashMap<MoleculeId, usize>,
    blocked: HashSet<MoleculeId>,
    tried_high_fanout: bool,
    unrelated_attempts: usize,
}

impl<'c, 'a> CandidateSource<'c, 'a> {
    pub(crate) fn new(
        ctx: &'c LegalizeContext<'a>,
        config: &'c ClusteringConfig,
        unrelated: &'c UnrelatedBuckets,
        repeat_limit: usize,
        preferred: Vec<MoleculeId>,
    ) -> Self {
        Self {
            ctx,
            config,
            unrelated,
            repeat_limit,
            preferred,
            source: Source::SameTile,
            feasible: Vec::new(),
            cluster_atoms: HashSet::new(),
            cluster_nets: BTreeSet::new(),
            groups: BTreeSet::new(),
            failures: HashMap::new(),
            blocked: HashSet::new(),
            tried_high_fanout: false,
            unrelated_attempts: 0,
        }
    }

    /// Records a molecule that joined the cluster.
    pub(crate) fn on_added(&mut self, molecule: MoleculeId) {
        let netlist = self.ctx.netlist;
        for &atom in &self.ctx.prepacked.molecule(molecule).atoms {
            self.cluster_atoms.insert(atom);
            let block = &netlist.blocks[atom];
            self.cluster_nets.extend(
                block
                    .inputs
                    .iter()
                    .chain(block.outputs.iter())
                    .copied()
                    .filter(|n| !netlist.nets[*n].is_global),
            );
            if let Some(group) = self.ctx.attraction.and_then(|a| a.group_of(atom)) {
                self.groups.insert(group);
            }
        }
        self.feasible.clear();
        self.blocked.clear();
        self.source = Source::SameTile;
    }

    /// Records a molecule the oracle rejected.
    pub(crate) fn on_failed(&mut self, molecule: MoleculeId) {
        *self.failures.entry(molecule).or_insert(0) += 1;
        self.blocked.insert(molecule);
    }

    fn eligible(&self, molecule: MoleculeId, oracle: &dyn LegalityOracle) -> bool {
        oracle.molecule_cluster(molecule).is_none()
            && !self.blocked.contains(&molecule)
            && self.failures.get(&molecule).copied().unwrap_or(0) < self.repeat_limit
    }

    /// The next molecule to try adding to `cluster`, or `None` when every
    /// source is exhausted.
    pub(crate) fn next(
        &mut self,
        oracle: &dyn LegalityOracle,
        cluster: ClusterId,
    ) -> Option<MoleculeId> {
        loop {
            if let Some((mol, _)) = self.feasible.pop() {
                if self.eligible(mol, oracle) {
                    return Some(mol);
                }
                continue;
            }
            self.source = match self.source {
                Source::SameTile => {
                    self.fill_preferred(oracle);
                    Source::Connectivity
                }
                Source::Connectivity => {
                    self.fill_connected(oracle);
                    Source::HighFanout
                }
                Source::HighFanout => {
                    if !self.tried_high_fanout {
                        self.tried_high_fanout = true;
                        self.fill_high_fanout(oracle);
                    }
                    Source::Attraction
                }
                Source::Attraction => {
                    self.fill_attraction(oracle);
                    Source::Unrelated
                }
                Source::Unrelated => {
                    if self.config.allow_unrelated_clustering
                        && self.unrelated_attempts < self.config.max_unrelated_attempts
                    {
                        self.unrelated_attempts += 1;
                        self.fill_unrelated(oracle, cluster);
                    }
                    Source::Exhausted
                }
                Source::Exhausted => return None,
            };
        }
    }

    /// Queues molecules in `order` so that popping yields them front to back.
    fn queue_in_order(&mut self, order: Vec<MoleculeId>) {
        let limit = self.config.feasible_candidate_limit;
        self.feasible
            .extend(order.into_iter().take(limit).rev().map(|m| (m, 0.0)));
    }

    fn fill_preferred(&mut self, oracle: &dyn LegalityOracle) {
        let order: Vec<MoleculeId> = self
            .preferred
            .iter()
            .copied()
            .filter(|m| self.eligible(*m, oracle))
            .collect();
        self.queue_in_order(order);
    }

    fn fill_connected(&mut self, oracle: &dyn LegalityOracle) {
        let netlist = self.ctx.netlist;
        let mut scores: HashMap<MoleculeId, (f32, f32)> = HashMap::new();
        for &net_id in &self.cluster_nets {
            let net = &netlist.nets[net_id];
            if net.pin_count() > self.config.high_fanout_threshold {
                continue;
            }
            let inside = net
                .blocks()
                .filter(|b| self.cluster_atoms.contains(b))
                .count();
            let outside = net.pin_count().saturating_sub(inside).max(1) as f32;
            for block in net.blocks() {
                if self.cluster_atoms.contains(&block) {
                    continue;
                }
                let mol = self.ctx.prepacked.molecule_of(block);
                if !self.eligible(mol, oracle) {
                    continue;
                }
                let score = scores.entry(mol).or_insert((0.0, 0.0));
                score.0 += 1.0;
                score.1 += 1.0 / outside;
            }
        }
        let beta = self.config.connection_beta;
        let mut gains: Vec<(MoleculeId, f32)> = scores
            .into_iter()
            .map(|(mol, (sharing, connection))| {
                let pins = self.ctx.prepacked.molecule(mol).stats.pins().max(1) as f32;
                let gain = ((1.0 - beta) * sharing + beta * connection) / pins;
                (mol, gain + self.attraction_bonus(mol))
            })
            .collect();
        // Ascending gain; among equals the lowest ID ends up last.
        gains.sort_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)));
        let limit = self.config.feasible_candidate_limit;
        if gains.len() > limit {
            gains.drain(..gains.len() - limit);
        }
        self.feasible = gains;
    }

    fn attraction_bonus(&self, molecule: MoleculeId) -> f32 {
        let Some(attraction) = self.ctx.attraction else {
            return 0.0;
        };
        let mut bonus = 0.0;
        let mut foreign = false;
        for &atom in &self.ctx.prepacked.molecule(molecule).atoms {
            match attraction.group_of(atom) {
                Some(g) if self.groups.contains(&g) => bonus += attraction.group(g).gain,
                Some(_) if !self.groups.is_empty() => foreign = true,
                _ => {}
            }
        }
        if bonus == 0.0 && foreign {
            FOREIGN_GROUP_PENALTY
        } else {
            bonus
        }
    }

    fn fill_high_fanout(&mut self, oracle: &dyn LegalityOracle) {
        let netlist = self.ctx.netlist;
        let threshold = self.config.high_fanout_threshold;
        let Some(net_id) = self
            .cluster_nets
            .iter()
            .copied()
            .filter(|n| netlist.nets[*n].pin_count() > threshold)
            .min_by_key(|n| (netlist.nets[*n].pin_count(), *n))
        else {
            return;
        };
        let mut seen = HashSet::new();
        let order: Vec<MoleculeId> = netlist.nets[net_id]
            .blocks()
            .filter(|b| !self.cluster_atoms.contains(b))
            .map(|b| self.ctx.prepacked.molecule_of(b))
            .filter(|m| seen.insert(*m) && self.eligible(*m, oracle))
            .collect();
        self.queue_in_order(order);
    }

    fn fill_attraction(&mut self, oracle: &dyn LegalityOracle) {
        let Some(attraction) = self.ctx.attraction else {
            return;
        };
        let mut seen = HashSet::new();
        let order: Vec<MoleculeId> = self
            .groups
            .iter()
            .flat_map(|g| attraction.group(*g).atoms.iter())
            .filter(|a| !self.cluster_atoms.contains(a))
            .map(|a| self.ctx.prepacked.molecule_of(*a))
            .filter(|m| seen.insert(*m) && self.eligible(*m, oracle))
            .collect();
        self.queue_in_order(order);
    }

    fn fill_unrelated(&mut self, oracle: &dyn LegalityOracle, cluster: ClusterId) {
        let buckets = &self.unrelated.buckets;
        if buckets.is_empty() {
            return;
        }
        let available = (oracle.inputs_available(cluster) as usize).min(buckets.len() - 1);
        let pick = (0..=available)
            .rev()
            .find_map(|k| buckets[k].iter().copied().find(|m| self.eligible(*m, oracle)));
        if let Some(mol) = pick {
            self.feasible.push((mol, 0.0));
        }
    }
}
