//! Complete legalization flows: clustering followed by placement.
//!
//! Every flow rejects molecules no block type can hold before doing any
//! work, verifies the clustering, builds placement macros from carry chains,
//! binds fixed clusters first, and verifies the final placement.

use crate::cluster::{
    check_candidates, naive, ClusterMeta, ClusterOrigin, Clustering, GreedyClusterer,
    ReconstructionClusterer,
};
use crate::codes;
use crate::context::LegalizeContext;
use crate::error::LegalizeError;
use crate::flat::HintTable;
use crate::ids::ClusterId;
use crate::oracle::LegalityOracle;
use crate::placement::{ClusterPlacer, PlaceMacros, PlacementTable, RelocationSearch};
use crate::verify::{verify_clustering, verify_placement};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tessel_arch::TileLoc;
use tessel_config::{ClusteringConfig, LegalizerConfig, LegalizerKind, ReconstructionConfig};
use tessel_diagnostics::{Diagnostic, DiagnosticSink};

/// Wall-clock time spent in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassTiming {
    /// Pass name.
    pub pass: String,
    /// Elapsed time.
    pub elapsed: Duration,
}

/// Counters reported by a legalization run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegalizerStats {
    /// Unclustered molecules after each clustering pass.
    pub unclustered_per_pass: Vec<usize>,
    /// Clusters destroyed by a strict check and rebuilt.
    pub regrown: usize,
    /// Clusters bound at their desired location (or fixed slot).
    pub placed_at_desired: usize,
    /// Clusters moved by relocation search.
    pub relocated: usize,
    /// Clusters placed by exhaustive search.
    pub exhaustive: usize,
    /// Per-pass elapsed time.
    pub timings: Vec<PassTiming>,
}

/// The result of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalizedDesign {
    /// Final clusters.
    pub clustering: Clustering,
    /// Cluster slot bindings.
    pub placement: PlacementTable,
    /// Rigid macros built from carry chains.
    pub macros: PlaceMacros,
    /// Run counters.
    pub stats: LegalizerStats,
}

/// A complete clustering-and-placement flow.
pub trait FullLegalizer {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Legalizes the design in `ctx` using `oracle` to arbitrate clusters.
    fn legalize(
        &self,
        ctx: &LegalizeContext<'_>,
        oracle: &mut dyn LegalityOracle,
        sink: &DiagnosticSink,
    ) -> Result<LegalizedDesign, LegalizeError>;
}

/// Builds the flow selected by `config.legalizer.strategy`.
pub fn make_legalizer(config: &LegalizerConfig) -> Box<dyn FullLegalizer> {
    match config.legalizer.strategy {
        LegalizerKind::Naive => Box::new(NaiveLegalizer),
        LegalizerKind::Greedy => Box::new(GreedyLegalizer {
            clustering: config.clustering.clone(),
        }),
        LegalizerKind::MinDisturbance => Box::new(MinDisturbanceLegalizer {
            reconstruction: config.reconstruction.clone(),
            balance_block_types: config.clustering.balance_block_type_utilization,
        }),
    }
}

/// Bins molecules by hinted tile and places each bin's clusters in its tile.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveLegalizer;

/// Flat-placement-informed greedy packing followed by relocation.
#[derive(Debug, Clone, Default)]
pub struct GreedyLegalizer {
    /// Growth and tier settings.
    pub clustering: ClusteringConfig,
}

/// Reconstruction clustering that keeps clusters at their hinted tiles.
#[derive(Debug, Clone)]
pub struct MinDisturbanceLegalizer {
    /// Pass settings.
    pub reconstruction: ReconstructionConfig,
    /// Prefer the least utilized block type when starting clusters.
    pub balance_block_types: bool,
}

impl Default for MinDisturbanceLegalizer {
    fn default() -> Self {
        Self {
            reconstruction: ReconstructionConfig::default(),
            balance_block_types: true,
        }
    }
}

impl FullLegalizer for NaiveLegalizer {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn legalize(
        &self,
        ctx: &LegalizeContext<'_>,
        oracle: &mut dyn LegalityOracle,
        sink: &DiagnosticSink,
    ) -> Result<LegalizedDesign, LegalizeError> {
        let mut run = Run::new(sink);
        check_candidates(ctx)?;
        let hints = ctx.flat.resolve(ctx.prepacked, ctx.grid, sink);
        let meta = run.time("clustering", || naive::cluster_by_tile(ctx, &hints, &mut *oracle))?;
        let (clustering, macros) = run.finish_clustering(ctx, oracle, meta)?;

        let start = Instant::now();
        let mut placer = ClusterPlacer::new(ctx.grid, &clustering, &macros);
        run.place_fixed(&mut placer);
        let mut leftover = Vec::new();
        for (id, cluster) in clustering.clusters.iter() {
            if placer.table().is_placed(id) {
                continue;
            }
            let placed = cluster
                .desired
                .is_some_and(|d| placer.place_in_tile(id, d.tile, d.sub_tile));
            if placed {
                run.stats.placed_at_desired += 1;
            } else {
                leftover.push(id);
            }
        }
        let mut failed = 0;
        for id in leftover {
            if placer.exhaustive_place(id) {
                run.stats.exhaustive += 1;
            } else {
                failed += 1;
            }
        }
        if failed > 0 {
            return Err(LegalizeError::PlacementExhaustion { count: failed });
        }
        let placement = placer.into_table();
        run.record("placement", start.elapsed());

        run.finish(ctx, clustering, macros, placement)
    }
}

impl FullLegalizer for GreedyLegalizer {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn legalize(
        &self,
        ctx: &LegalizeContext<'_>,
        oracle: &mut dyn LegalityOracle,
        sink: &DiagnosticSink,
    ) -> Result<LegalizedDesign, LegalizeError> {
        let mut run = Run::new(sink);
        check_candidates(ctx)?;
        let hints = ctx.flat.resolve(ctx.prepacked, ctx.grid, sink);
        let outcome = run.time("clustering", || {
            GreedyClusterer::new(ctx, &self.clustering, sink)
                .with_hints(&hints)
                .run(&mut *oracle)
        })?;
        run.stats.regrown = outcome.regrown;
        let (clustering, macros) = run.finish_clustering(ctx, oracle, outcome.meta)?;

        let start = Instant::now();
        let placement = run.place_near_desired(ctx, &clustering, &macros, &hints, |_| true)?;
        run.record("placement", start.elapsed());

        run.finish(ctx, clustering, macros, placement)
    }
}

impl FullLegalizer for MinDisturbanceLegalizer {
    fn name(&self) -> &'static str {
        "min_disturbance"
    }

    fn legalize(
        &self,
        ctx: &LegalizeContext<'_>,
        oracle: &mut dyn LegalityOracle,
        sink: &DiagnosticSink,
    ) -> Result<LegalizedDesign, LegalizeError> {
        let mut run = Run::new(sink);
        check_candidates(ctx)?;
        let hints = ctx.flat.resolve(ctx.prepacked, ctx.grid, sink);
        let outcome = run.time("clustering", || {
            ReconstructionClusterer::new(ctx, &self.reconstruction, &hints, sink)
                .with_balancing(self.balance_block_types)
                .run(&mut *oracle)
        })?;
        run.stats.regrown = outcome.regrown;
        run.stats.unclustered_per_pass = outcome.unclustered_per_pass;
        let (clustering, macros) = run.finish_clustering(ctx, oracle, outcome.meta)?;

        let start = Instant::now();
        let placement = run.place_near_desired(ctx, &clustering, &macros, &hints, |origin| {
            origin == ClusterOrigin::TilePass
        })?;
        run.record("placement", start.elapsed());

        run.finish(ctx, clustering, macros, placement)
    }
}

/// Counters and timings collected while a flow runs.
struct Run<'s> {
    sink: &'s DiagnosticSink,
    stats: LegalizerStats,
}

impl<'s> Run<'s> {
    fn new(sink: &'s DiagnosticSink) -> Self {
        Self {
            sink,
            stats: LegalizerStats::default(),
        }
    }

    fn time<T>(&mut self, pass: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(pass, start.elapsed());
        out
    }

    fn record(&mut self, pass: &str, elapsed: Duration) {
        self.sink.emit(Diagnostic::note(
            codes::N001,
            format!("{pass} took {:.3} ms", elapsed.as_secs_f64() * 1000.0),
        ));
        self.stats.timings.push(PassTiming {
            pass: pass.to_string(),
            elapsed,
        });
    }

    fn finish_clustering(
        &mut self,
        ctx: &LegalizeContext<'_>,
        oracle: &mut dyn LegalityOracle,
        meta: HashMap<ClusterId, ClusterMeta>,
    ) -> Result<(Clustering, PlaceMacros), LegalizeError> {
        let clustering = Clustering::harvest(ctx, oracle, meta)?;
        verify_clustering(ctx, &clustering, oracle, self.sink)?;
        let macros = PlaceMacros::from_chains(ctx.prepacked, &clustering);
        Ok((clustering, macros))
    }

    fn place_fixed(&mut self, placer: &mut ClusterPlacer<'_>) {
        let before = placer.table().len();
        placer.place_fixed_clusters();
        self.stats.placed_at_desired += placer.table().len() - before;
    }

    /// Places clusters at their desired slot, the `first` ones before the
    /// rest, then relocates whatever did not fit.
    fn place_near_desired(
        &mut self,
        ctx: &LegalizeContext<'_>,
        clustering: &Clustering,
        macros: &PlaceMacros,
        hints: &HintTable,
        first: impl Fn(ClusterOrigin) -> bool,
    ) -> Result<PlacementTable, LegalizeError> {
        let mut placer = ClusterPlacer::new(ctx.grid, clustering, macros);
        self.place_fixed(&mut placer);

        let (mut order, rest): (Vec<ClusterId>, Vec<ClusterId>) = clustering
            .clusters
            .iter()
            .map(|(id, _)| id)
            .partition(|id| first(clustering.cluster(*id).origin));
        order.extend(rest);

        let mut displaced = Vec::new();
        for id in order {
            if placer.table().is_placed(id) {
                continue;
            }
            let cluster = clustering.cluster(id);
            let placed = cluster
                .desired
                .is_some_and(|d| placer.place_in_tile(id, d.tile, d.sub_tile));
            if placed {
                self.stats.placed_at_desired += 1;
            } else {
                displaced.push(id);
            }
        }

        let search = RelocationSearch::new(&placer);
        for id in displaced {
            if placer.table().is_placed(id) {
                continue;
            }
            let cluster = clustering.cluster(id);
            let target = match cluster.desired {
                Some(d) => d.tile,
                None => fallback_tile(ctx, clustering, hints, id),
            };
            search.relocate(&mut placer, id, cluster.block_type, target)?;
            self.stats.relocated += 1;
        }
        Ok(placer.into_table())
    }

    fn finish(
        self,
        ctx: &LegalizeContext<'_>,
        clustering: Clustering,
        macros: PlaceMacros,
        placement: PlacementTable,
    ) -> Result<LegalizedDesign, LegalizeError> {
        verify_placement(ctx, &clustering, &macros, &placement, self.sink)?;
        self.sink.emit(Diagnostic::note(
            codes::L001,
            format!(
                "{} of {} cluster(s) placed at their desired location",
                self.stats.placed_at_desired,
                clustering.len()
            ),
        ));
        self.sink.emit(Diagnostic::note(
            codes::L002,
            format!(
                "{} cluster(s) relocated, {} placed by exhaustive search",
                self.stats.relocated, self.stats.exhaustive
            ),
        ));
        Ok(LegalizedDesign {
            clustering,
            placement,
            macros,
            stats: self.stats,
        })
    }
}

/// Relocation start for a cluster without a desired location: the resolved
/// tile of its first member.
fn fallback_tile(
    ctx: &LegalizeContext<'_>,
    clustering: &Clustering,
    hints: &HintTable,
    id: ClusterId,
) -> TileLoc {
    clustering
        .cluster(id)
        .molecules
        .first()
        .map(|m| hints.tile_of(*m))
        .unwrap_or_else(|| {
            TileLoc::new(
                ctx.grid.width() as i32 / 2,
                ctx.grid.height() as i32 / 2,
                0,
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::CapacityOracle;
    use crate::testutil::Bench;

    fn run_flow(
        bench: &Bench,
        legalizer: &dyn FullLegalizer,
    ) -> (Result<LegalizedDesign, LegalizeError>, DiagnosticSink) {
        let ctx = bench.context();
        let sink = DiagnosticSink::new();
        let mut oracle = CapacityOracle::new(&ctx);
        let result = legalizer.legalize(&ctx, &mut oracle, &sink);
        (result, sink)
    }

    #[test]
    fn selects_flow_from_config() {
        let mut config = LegalizerConfig::default();
        assert_eq!(make_legalizer(&config).name(), "min_disturbance");
        config.legalizer.strategy = LegalizerKind::Greedy;
        assert_eq!(make_legalizer(&config).name(), "greedy");
        config.legalizer.strategy = LegalizerKind::Naive;
        assert_eq!(make_legalizer(&config).name(), "naive");
    }

    #[test]
    fn every_flow_places_every_cluster() {
        let bench = Bench::scenario_a();
        let flows: Vec<Box<dyn FullLegalizer>> = vec![
            Box::new(NaiveLegalizer),
            Box::new(GreedyLegalizer::default()),
            Box::new(MinDisturbanceLegalizer::default()),
        ];
        for flow in flows {
            let (result, sink) = run_flow(&bench, flow.as_ref());
            let design = result.unwrap();
            assert_eq!(design.placement.len(), design.clustering.len(), "{}", flow.name());
            assert!(!sink.has_errors());
            assert!(design.stats.timings.iter().any(|t| t.pass == "placement"));
        }
    }

    #[test]
    fn naive_reports_exhaustion_when_device_is_too_small() {
        // Five one-LUT clusters on a 2x2 device of one sub-tile each.
        let bench = Bench::open_grid(2, 2, 5);
        let (result, _) = run_flow(&bench, &NaiveLegalizer);
        assert_eq!(
            result.unwrap_err(),
            LegalizeError::PlacementExhaustion { count: 1 }
        );
    }

    #[test]
    fn min_disturbance_keeps_tile_clusters_at_their_hints() {
        let bench = Bench::scenario_a();
        let (result, _) = run_flow(&bench, &MinDisturbanceLegalizer::default());
        let design = result.unwrap();
        assert_eq!(design.stats.placed_at_desired, 4);
        assert_eq!(design.stats.relocated, 0);
        assert_eq!(design.stats.unclustered_per_pass[0], 0);
    }
}
