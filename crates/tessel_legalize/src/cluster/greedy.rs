//! Seed-driven bottom-up clustering with two legality tiers.
//!
//! Each cluster runs through an explicit state machine:
//!
//! ```text
//! Build(Cheap) -> Check -> Finalize
//!                   |
//!                   +-> Abandon -> Build(Strict) -> Finalize
//! ```
//!
//! Under [`TierPolicy::Sweeps`] the check is deferred: every cluster is built
//! cheap, then one strict sweep destroys the failures, and a second strict
//! pass regrows whatever they released.

use super::candidate::{CandidateSource, UnrelatedBuckets};
use super::seed::SeedSelector;
use super::{
    mismatch, start_cluster, ClusterMeta, ClusterOrigin, DesiredLocation, Phase, TypeBalancer,
};
use crate::codes;
use crate::context::LegalizeContext;
use crate::error::LegalizeError;
use crate::flat::{containing_tile, HintTable};
use crate::ids::{ClusterId, MoleculeId};
use crate::oracle::{LegalityOracle, LegalizationStrategy};
use std::collections::HashMap;
use tessel_config::{ClusteringConfig, TierPolicy};
use tessel_diagnostics::{Diagnostic, DiagnosticSink};

/// Result of a greedy clustering run.
#[derive(Debug, Clone, Default)]
pub struct GreedyOutcome {
    pub(crate) meta: HashMap<ClusterId, ClusterMeta>,
    /// Clusters destroyed by the strict check and regrown.
    pub regrown: usize,
}

impl GreedyOutcome {
    /// Number of finalized clusters.
    pub fn clusters(&self) -> usize {
        self.meta.len()
    }
}

struct RunState {
    selector: SeedSelector,
    balancer: TypeBalancer,
    buckets: UnrelatedBuckets,
    outcome: GreedyOutcome,
    /// Cheap-tier clusters waiting for the strict sweep, not yet cleaned.
    unswept: Vec<ClusterId>,
}

/// Grows clusters from ranked seeds.
pub struct GreedyClusterer<'c, 'a> {
    ctx: &'c LegalizeContext<'a>,
    config: &'c ClusteringConfig,
    hints: Option<&'c HintTable>,
    sink: &'c DiagnosticSink,
}

impl<'c, 'a> GreedyClusterer<'c, 'a> {
    /// Creates a clusterer that ignores placement hints.
    pub fn new(
        ctx: &'c LegalizeContext<'a>,
        config: &'c ClusteringConfig,
        sink: &'c DiagnosticSink,
    ) -> Self {
        Self {
            ctx,
            config,
            hints: None,
            sink,
        }
    }

    /// Makes growth prefer molecules hinted to the seed's tile, and records
    /// each cluster's hint centroid as its desired location.
    pub fn with_hints(mut self, hints: &'c HintTable) -> Self {
        self.hints = Some(hints);
        self
    }

    /// Clusters every molecule.
    ///
    /// Fails with [`LegalizeError::ArchitectureMismatch`] if a seed cannot
    /// start a cluster of any candidate type.
    pub fn run(&self, oracle: &mut dyn LegalityOracle) -> Result<GreedyOutcome, LegalizeError> {
        let mut state = RunState {
            selector: SeedSelector::new(self.ctx.prepacked, self.config.seed_ranking),
            balancer: TypeBalancer::new(self.config.balance_block_type_utilization),
            buckets: UnrelatedBuckets::new(self.ctx),
            outcome: GreedyOutcome::default(),
            unswept: Vec::new(),
        };
        match self.config.tier_policy {
            TierPolicy::Interleaved => {
                self.pass(oracle, &mut state, LegalizationStrategy::Cheap, true)?;
            }
            TierPolicy::Sweeps => {
                self.pass(oracle, &mut state, LegalizationStrategy::Cheap, false)?;
                for cluster in std::mem::take(&mut state.unswept) {
                    if oracle.check_strict_legality(cluster) {
                        oracle.clean(cluster);
                    } else {
                        self.abandon(oracle, &mut state, cluster);
                    }
                }
                self.pass(oracle, &mut state, LegalizationStrategy::Strict, false)?;
            }
        }
        self.sink.emit(Diagnostic::note(
            codes::P003,
            format!(
                "greedy clustering built {} cluster(s), {} regrown under the strict tier",
                state.outcome.clusters(),
                state.outcome.regrown
            ),
        ));
        Ok(state.outcome)
    }

    /// Clusters seeds until none is left.
    fn pass(
        &self,
        oracle: &mut dyn LegalityOracle,
        state: &mut RunState,
        first_tier: LegalizationStrategy,
        check_cheap: bool,
    ) -> Result<(), LegalizeError> {
        let sweep_later = first_tier == LegalizationStrategy::Cheap && !check_cheap;
        while let Some(seed) = state.selector.next_seed(&*oracle) {
            let mut phase = Phase::Build(first_tier);
            loop {
                phase = match phase {
                    Phase::Build(tier) => {
                        oracle.set_strategy(tier);
                        let cluster =
                            start_cluster(self.ctx, oracle, &state.balancer, seed, |_| true)?
                                .ok_or_else(|| mismatch(self.ctx, seed))?;
                        self.grow(oracle, &state.buckets, cluster, seed);
                        if tier == LegalizationStrategy::Cheap && check_cheap {
                            Phase::Check(cluster)
                        } else {
                            Phase::Finalize(cluster)
                        }
                    }
                    Phase::Check(cluster) => {
                        if oracle.check_strict_legality(cluster) {
                            Phase::Finalize(cluster)
                        } else {
                            Phase::Abandon(cluster)
                        }
                    }
                    Phase::Abandon(cluster) => {
                        self.abandon(oracle, state, cluster);
                        Phase::Build(LegalizationStrategy::Strict)
                    }
                    Phase::Finalize(cluster) => {
                        self.finalize(oracle, state, cluster);
                        if sweep_later {
                            state.unswept.push(cluster);
                        } else {
                            oracle.clean(cluster);
                        }
                        break;
                    }
                };
            }
        }
        Ok(())
    }

    fn grow(
        &self,
        oracle: &mut dyn LegalityOracle,
        buckets: &UnrelatedBuckets,
        cluster: ClusterId,
        seed: MoleculeId,
    ) {
        let preferred = self
            .hints
            .map(|h| h.molecules_in(h.tile_of(seed)).to_vec())
            .unwrap_or_default();
        let repeat_limit = if self.ctx.has_attraction() {
            self.config.attraction_repeat_limit
        } else {
            1
        };
        let mut source = CandidateSource::new(self.ctx, self.config, buckets, repeat_limit, preferred);
        source.on_added(seed);
        while oracle.has_remaining_capacity(cluster) {
            let Some(candidate) = source.next(&*oracle, cluster) else {
                break;
            };
            if oracle.add(candidate, cluster).is_pass() {
                source.on_added(candidate);
            } else {
                source.on_failed(candidate);
            }
        }
    }

    fn abandon(&self, oracle: &mut dyn LegalityOracle, state: &mut RunState, cluster: ClusterId) {
        // Counters only cover finalized clusters, so a cluster abandoned
        // before finalizing was never recorded.
        if state.outcome.meta.remove(&cluster).is_some() {
            state.balancer.release(oracle.block_type(cluster));
        }
        let members = oracle.destroy(cluster);
        state.outcome.regrown += 1;
        self.sink.emit(
            Diagnostic::note(codes::P002, "cluster failed the strict legality check")
                .with_subject(format!("cluster {cluster}"))
                .with_note(format!("{} molecule(s) returned for regrowth", members.len())),
        );
    }

    fn finalize(&self, oracle: &mut dyn LegalityOracle, state: &mut RunState, cluster: ClusterId) {
        state.balancer.record(oracle.block_type(cluster));
        let desired = self.desired(oracle.members(cluster));
        state.outcome.meta.insert(
            cluster,
            ClusterMeta {
                desired,
                origin: ClusterOrigin::Greedy,
            },
        );
    }

    fn desired(&self, members: &[MoleculeId]) -> Option<DesiredLocation> {
        if self.hints.is_none() {
            return None;
        }
        let centroid = self.ctx.flat.centroid(members)?;
        Some(DesiredLocation {
            tile: containing_tile(self.ctx.grid, centroid).0,
            sub_tile: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::CapacityOracle;
    use crate::testutil::{Bench, CleanOrder};

    fn run(bench: &Bench, config: &ClusteringConfig) -> (GreedyOutcome, usize) {
        let ctx = bench.context();
        let sink = DiagnosticSink::new();
        let mut oracle = CapacityOracle::new(&ctx);
        let outcome = GreedyClusterer::new(&ctx, config, &sink)
            .run(&mut oracle)
            .unwrap();
        for c in oracle.live_clusters() {
            assert!(oracle.check_strict_legality(c));
        }
        for m in bench.prepacked.molecules.ids() {
            assert!(oracle.molecule_cluster(m).is_some());
        }
        (outcome, oracle.live_clusters().len())
    }

    #[test]
    fn strict_failure_regrows_from_same_seed() {
        let bench = Bench::routing_squeeze();
        let (outcome, live) = run(&bench, &ClusteringConfig::default());
        assert_eq!(outcome.regrown, 1);
        assert_eq!(live, 2);
        assert_eq!(outcome.clusters(), 2);
    }

    #[test]
    fn sweeps_policy_also_ends_strict_legal() {
        let bench = Bench::routing_squeeze();
        let config = ClusteringConfig {
            tier_policy: TierPolicy::Sweeps,
            ..ClusteringConfig::default()
        };
        let (outcome, live) = run(&bench, &config);
        assert_eq!(outcome.regrown, 1);
        assert_eq!(outcome.clusters(), live);
    }

    #[test]
    fn sweeps_policy_cleans_only_checked_clusters() {
        let bench = Bench::routing_squeeze();
        let ctx = bench.context();
        let sink = DiagnosticSink::new();
        let mut oracle = CleanOrder::new(&ctx);
        let config = ClusteringConfig {
            tier_policy: TierPolicy::Sweeps,
            ..ClusteringConfig::default()
        };
        let outcome = GreedyClusterer::new(&ctx, &config, &sink)
            .run(&mut oracle)
            .unwrap();
        assert_eq!(outcome.regrown, 1);
        assert!(oracle.late_checks.is_empty());
        assert!(oracle.live_clusters().iter().all(|&c| oracle.was_cleaned(c)));
    }

    #[test]
    fn connected_chain_packs_into_one_cluster() {
        let bench = Bench::lut_chain(3, 0);
        let (outcome, live) = run(&bench, &ClusteringConfig::default());
        assert_eq!(live, 1);
        assert_eq!(outcome.regrown, 0);
    }

    #[test]
    fn without_filler_unrelated_molecules_stay_apart() {
        let bench = Bench::lut_chain(1, 2);
        let config = ClusteringConfig {
            allow_unrelated_clustering: false,
            ..ClusteringConfig::default()
        };
        let (_, live) = run(&bench, &config);
        assert_eq!(live, 3);

        let (_, packed) = run(&bench, &ClusteringConfig::default());
        assert!(packed < 3);
    }

    #[test]
    fn unknown_model_is_architecture_mismatch() {
        let bench = Bench::orphan_model();
        let ctx = bench.context();
        let sink = DiagnosticSink::new();
        let mut oracle = CapacityOracle::new(&ctx);
        let config = ClusteringConfig::default();
        let err = GreedyClusterer::new(&ctx, &config, &sink)
            .run(&mut oracle)
            .unwrap_err();
        assert!(matches!(err, LegalizeError::ArchitectureMismatch { .. }));
    }

    #[test]
    fn hinted_clusters_record_centroid_tile() {
        let bench = Bench::scenario_a();
        let ctx = bench.context();
        let sink = DiagnosticSink::new();
        let hints = ctx.flat.resolve(ctx.prepacked, ctx.grid, &sink);
        let mut oracle = CapacityOracle::new(&ctx);
        let config = ClusteringConfig::default();
        let outcome = GreedyClusterer::new(&ctx, &config, &sink)
            .with_hints(&hints)
            .run(&mut oracle)
            .unwrap();
        for (cluster, meta) in &outcome.meta {
            let members = oracle.members(*cluster);
            if members.len() == 1 {
                let desired = meta.desired.unwrap();
                assert_eq!(desired.tile, hints.tile_of(members[0]));
            }
        }
    }
}
