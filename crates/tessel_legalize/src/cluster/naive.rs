//! Per-tile binning: each hinted tile is packed into as few clusters as the
//! strict tier allows, without looking at connectivity.

use super::{mismatch, start_cluster, ClusterMeta, ClusterOrigin, DesiredLocation, TypeBalancer};
use crate::context::LegalizeContext;
use crate::error::LegalizeError;
use crate::flat::HintTable;
use crate::ids::{ClusterId, MoleculeId};
use crate::oracle::{LegalityOracle, LegalizationStrategy};
use std::collections::HashMap;

/// Clusters the molecules of every hinted tile among themselves.
///
/// A tile's first free molecule seeds a cluster, preferring block types the
/// tile accepts, and every other compatible molecule of the tile is offered
/// to it. Repeats until the tile is empty.
pub(crate) fn cluster_by_tile(
    ctx: &LegalizeContext<'_>,
    hints: &HintTable,
    oracle: &mut dyn LegalityOracle,
) -> Result<HashMap<ClusterId, ClusterMeta>, LegalizeError> {
    oracle.set_strategy(LegalizationStrategy::Strict);
    let balancer = TypeBalancer::new(false);
    let mut meta = HashMap::new();

    for (tile, molecules) in hints.tiles() {
        let mut pending: Vec<MoleculeId> = molecules.to_vec();
        while let Some(&seed) = pending.first() {
            let cluster = match start_cluster(ctx, oracle, &balancer, seed, |t| {
                ctx.grid.is_compatible(tile, t)
            })? {
                Some(c) => c,
                None => start_cluster(ctx, oracle, &balancer, seed, |_| true)?
                    .ok_or_else(|| mismatch(ctx, seed))?,
            };
            for &mol in &pending[1..] {
                if oracle.is_compatible(mol, cluster) {
                    oracle.add(mol, cluster);
                }
            }
            oracle.clean(cluster);
            meta.insert(
                cluster,
                ClusterMeta {
                    desired: Some(DesiredLocation {
                        tile,
                        sub_tile: None,
                    }),
                    origin: ClusterOrigin::Naive,
                },
            );
            pending.retain(|m| oracle.molecule_cluster(*m).is_none());
        }
    }
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::CapacityOracle;
    use crate::testutil::Bench;
    use tessel_diagnostics::DiagnosticSink;

    fn bin(bench: &Bench) -> (usize, Vec<usize>) {
        let ctx = bench.context();
        let sink = DiagnosticSink::new();
        let hints = ctx.flat.resolve(ctx.prepacked, ctx.grid, &sink);
        let mut oracle = CapacityOracle::new(&ctx);
        let meta = cluster_by_tile(&ctx, &hints, &mut oracle).unwrap();
        let mut sizes: Vec<usize> = meta.keys().map(|c| oracle.members(*c).len()).collect();
        sizes.sort_unstable();
        (meta.len(), sizes)
    }

    #[test]
    fn distinct_tiles_get_distinct_clusters() {
        let (count, sizes) = bin(&Bench::scenario_a());
        assert_eq!(count, 4);
        assert_eq!(sizes, vec![1, 1, 1, 1]);
    }

    #[test]
    fn shared_tile_packs_together_when_capacity_allows() {
        let (count, sizes) = bin(&Bench::shared_tile(2));
        assert_eq!(count, 1);
        assert_eq!(sizes, vec![2]);
    }

    #[test]
    fn shared_tile_splits_when_mode_is_full() {
        let (count, _) = bin(&Bench::shared_tile(1));
        assert_eq!(count, 2);
    }
}
