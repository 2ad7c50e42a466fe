//! Location-aware clustering that keeps clusters near their members' hints.
//!
//! The tile pass groups molecules by the root tile their hint resolves to and
//! packs each tile's sub-tiles directly. Neighbor passes then seed a cluster
//! at each leftover molecule's tile and pull in molecules hinted to nearby
//! tiles, ring by ring. Molecules still unclustered after the last pass abort
//! the run.

use super::seed::rank_for_reconstruction;
use super::{
    mismatch, start_cluster, unclustered, ClusterMeta, ClusterOrigin, DesiredLocation, Phase,
    TypeBalancer,
};
use crate::codes;
use crate::context::LegalizeContext;
use crate::error::LegalizeError;
use crate::flat::HintTable;
use crate::ids::{ClusterId, MoleculeId};
use crate::oracle::{LegalityOracle, LegalizationStrategy};
use crate::placement::Spiral;
use std::collections::HashMap;
use tessel_arch::TileLoc;
use tessel_config::{ReconstructionConfig, TierPolicy};
use tessel_diagnostics::{Diagnostic, DiagnosticSink};

/// Result of a reconstruction run.
#[derive(Debug, Clone, Default)]
pub struct ReconstructionOutcome {
    pub(crate) meta: HashMap<ClusterId, ClusterMeta>,
    /// Unclustered molecule count after each pass, in pass order.
    pub unclustered_per_pass: Vec<usize>,
    /// Clusters destroyed by a strict check.
    pub regrown: usize,
}

/// A cluster built in the tile pass and the sub-tile it claimed.
#[derive(Debug, Clone, Copy)]
struct TileSlot {
    cluster: ClusterId,
    sub_tile: u32,
}

/// Rebuilds clusters around the tiles molecules were hinted to.
pub struct ReconstructionClusterer<'c, 'a> {
    ctx: &'c LegalizeContext<'a>,
    config: &'c ReconstructionConfig,
    hints: &'c HintTable,
    sink: &'c DiagnosticSink,
    balancer: TypeBalancer,
    outcome: ReconstructionOutcome,
    /// Cheap neighbor-pass clusters waiting for the strict sweep, not yet cleaned.
    unswept: Vec<ClusterId>,
}

impl<'c, 'a> ReconstructionClusterer<'c, 'a> {
    /// Creates a clusterer over resolved hints.
    pub fn new(
        ctx: &'c LegalizeContext<'a>,
        config: &'c ReconstructionConfig,
        hints: &'c HintTable,
        sink: &'c DiagnosticSink,
    ) -> Self {
        Self {
            ctx,
            config,
            hints,
            sink,
            balancer: TypeBalancer::new(false),
            outcome: ReconstructionOutcome::default(),
            unswept: Vec::new(),
        }
    }

    /// Enables utilization-balanced block type selection for new clusters.
    pub fn with_balancing(mut self, enabled: bool) -> Self {
        self.balancer = TypeBalancer::new(enabled);
        self
    }

    /// Runs every pass.
    ///
    /// Fails with [`LegalizeError::ArchitectureMismatch`] if a neighbor-pass
    /// seed cannot start a cluster of any candidate type, and with
    /// [`LegalizeError::Unclustered`] if any molecule is left over.
    pub fn run(
        mut self,
        oracle: &mut dyn LegalityOracle,
    ) -> Result<ReconstructionOutcome, LegalizeError> {
        self.tile_pass(oracle)?;
        self.record_pass(oracle, "tile");

        match self.config.tier_policy {
            TierPolicy::Sweeps => {
                self.neighbor_pass(oracle, LegalizationStrategy::Cheap, false)?;
                self.record_pass(oracle, "neighbor (cheap)");
                for cluster in std::mem::take(&mut self.unswept) {
                    if oracle.check_strict_legality(cluster) {
                        oracle.clean(cluster);
                    } else {
                        self.discard(oracle, cluster);
                    }
                }
                self.neighbor_pass(oracle, LegalizationStrategy::Strict, false)?;
                self.record_pass(oracle, "neighbor (strict)");
            }
            TierPolicy::Interleaved => {
                self.neighbor_pass(oracle, LegalizationStrategy::Cheap, true)?;
                self.record_pass(oracle, "neighbor");
            }
        }

        let left = unclustered(self.ctx, &*oracle).len();
        if left > 0 {
            return Err(LegalizeError::Unclustered { count: left });
        }
        Ok(self.outcome)
    }

    fn record_pass(&mut self, oracle: &dyn LegalityOracle, pass: &str) {
        let left = unclustered(self.ctx, oracle).len();
        self.outcome.unclustered_per_pass.push(left);
        self.sink.emit(Diagnostic::note(
            codes::P001,
            format!("{left} molecule(s) unclustered after the {pass} pass"),
        ));
    }

    fn tile_pass(&mut self, oracle: &mut dyn LegalityOracle) -> Result<(), LegalizeError> {
        let hints = self.hints;
        for (tile, molecules) in hints.tiles() {
            let mut ranked = molecules.to_vec();
            rank_for_reconstruction(self.ctx.prepacked, &mut ranked);

            let mut slots: Vec<TileSlot> = Vec::new();
            oracle.set_strategy(LegalizationStrategy::Cheap);
            for &mol in &ranked {
                self.place_in_tile(oracle, tile, &mut slots, mol)?;
            }

            let mut retry = Vec::new();
            slots.retain(|slot| {
                if oracle.check_strict_legality(slot.cluster) {
                    return true;
                }
                self.outcome.meta.remove(&slot.cluster);
                retry.extend(oracle.destroy(slot.cluster));
                self.outcome.regrown += 1;
                false
            });
            if !retry.is_empty() {
                rank_for_reconstruction(self.ctx.prepacked, &mut retry);
                oracle.set_strategy(LegalizationStrategy::Strict);
                for &mol in &retry {
                    self.place_in_tile(oracle, tile, &mut slots, mol)?;
                }
            }

            for slot in &slots {
                self.balancer.record(oracle.block_type(slot.cluster));
                oracle.clean(slot.cluster);
            }
        }
        Ok(())
    }

    /// Adds `mol` to a cluster already in `tile`, or starts one on a free sub-tile.
    fn place_in_tile(
        &mut self,
        oracle: &mut dyn LegalityOracle,
        tile: TileLoc,
        slots: &mut Vec<TileSlot>,
        mol: MoleculeId,
    ) -> Result<(), LegalizeError> {
        for slot in slots.iter() {
            if oracle.is_compatible(mol, slot.cluster) && oracle.add(mol, slot.cluster).is_pass() {
                return Ok(());
            }
        }

        let capacity = self.ctx.grid.capacity(tile);
        let taken = |s: u32| slots.iter().any(|slot| slot.sub_tile == s);
        let sub_tile = self
            .hints
            .sub_tile_of(mol)
            .filter(|&s| s < capacity && !taken(s))
            .or_else(|| (0..capacity).find(|&s| !taken(s)));
        let Some(sub_tile) = sub_tile else {
            return Ok(());
        };

        let grid = self.ctx.grid;
        let started = start_cluster(self.ctx, oracle, &self.balancer, mol, |t| {
            grid.is_compatible(tile, t)
        })?;
        if let Some(cluster) = started {
            slots.push(TileSlot { cluster, sub_tile });
            self.outcome.meta.insert(
                cluster,
                ClusterMeta {
                    desired: Some(DesiredLocation {
                        tile,
                        sub_tile: Some(sub_tile),
                    }),
                    origin: ClusterOrigin::TilePass,
                },
            );
        }
        Ok(())
    }

    fn neighbor_pass(
        &mut self,
        oracle: &mut dyn LegalityOracle,
        first_tier: LegalizationStrategy,
        check_cheap: bool,
    ) -> Result<(), LegalizeError> {
        let sweep_later = first_tier == LegalizationStrategy::Cheap && !check_cheap;
        let mut pending = unclustered(self.ctx, &*oracle);
        rank_for_reconstruction(self.ctx.prepacked, &mut pending);

        for seed in pending {
            if oracle.molecule_cluster(seed).is_some() {
                continue;
            }
            let tile = self.hints.tile_of(seed);
            let mut phase = Phase::Build(first_tier);
            loop {
                phase = match phase {
                    Phase::Build(tier) => {
                        oracle.set_strategy(tier);
                        let cluster =
                            start_cluster(self.ctx, oracle, &self.balancer, seed, |_| true)?
                                .ok_or_else(|| mismatch(self.ctx, seed))?;
                        self.grow_around(oracle, cluster, tile);
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
                        self.discard(oracle, cluster);
                        Phase::Build(LegalizationStrategy::Strict)
                    }
                    Phase::Finalize(cluster) => {
                        self.balancer.record(oracle.block_type(cluster));
                        if sweep_later {
                            self.unswept.push(cluster);
                        } else {
                            oracle.clean(cluster);
                        }
                        self.outcome.meta.insert(
                            cluster,
                            ClusterMeta {
                                desired: Some(DesiredLocation {
                                    tile,
                                    sub_tile: None,
                                }),
                                origin: ClusterOrigin::NeighborPass,
                            },
                        );
                        break;
                    }
                };
            }
        }
        Ok(())
    }

    /// Pulls molecules hinted near `center` into `cluster`, nearest rings first.
    fn grow_around(&self, oracle: &mut dyn LegalityOracle, cluster: ClusterId, center: TileLoc) {
        for loc in Spiral::new(center, self.config.neighbor_radius) {
            if !self.ctx.grid.contains(loc) {
                continue;
            }
            for &mol in self.hints.molecules_in(loc) {
                if !oracle.has_remaining_capacity(cluster) {
                    return;
                }
                if oracle.molecule_cluster(mol).is_none() && oracle.is_compatible(mol, cluster) {
                    oracle.add(mol, cluster);
                }
            }
        }
    }

    /// Destroys a cluster that failed the strict check, returning its members.
    fn discard(&mut self, oracle: &mut dyn LegalityOracle, cluster: ClusterId) {
        if self.outcome.meta.remove(&cluster).is_some() {
            self.balancer.release(oracle.block_type(cluster));
        }
        let members = oracle.destroy(cluster);
        self.outcome.regrown += 1;
        self.sink.emit(
            Diagnostic::note(codes::P002, "cluster failed the strict legality check")
                .with_subject(format!("cluster {cluster}"))
                .with_note(format!("{} molecule(s) returned to the pool", members.len())),
        );
    }
}
