//! Post-hoc consistency checks on clustering and placement results.
//!
//! Each check emits one error diagnostic per violation and then fails with
//! [`LegalizeError::ConsistencyViolation`] carrying the count.

use crate::cluster::Clustering;
use crate::codes;
use crate::context::LegalizeContext;
use crate::error::LegalizeError;
use crate::ids::ClusterId;
use crate::oracle::LegalityOracle;
use crate::placement::{PlaceMacros, PlacementTable};
use std::collections::HashMap;
use tessel_arch::PlLoc;
use tessel_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};

struct Tally<'s> {
    sink: &'s DiagnosticSink,
    errors: usize,
}

impl<'s> Tally<'s> {
    fn new(sink: &'s DiagnosticSink) -> Self {
        Self { sink, errors: 0 }
    }

    fn fail(&mut self, code: DiagnosticCode, message: String, subject: String) {
        self.errors += 1;
        self.sink
            .emit(Diagnostic::error(code, message).with_subject(subject));
    }

    fn finish(self, stage: &'static str) -> Result<(), LegalizeError> {
        if self.errors == 0 {
            Ok(())
        } else {
            Err(LegalizeError::ConsistencyViolation {
                stage,
                errors: self.errors,
            })
        }
    }
}

/// Checks that every atom is in exactly one molecule, every molecule in
/// exactly one cluster, and every cluster passes the strict tier.
///
/// `oracle` must be the compressed oracle the clustering was harvested from.
pub fn verify_clustering(
    ctx: &LegalizeContext<'_>,
    clustering: &Clustering,
    oracle: &mut dyn LegalityOracle,
    sink: &DiagnosticSink,
) -> Result<(), LegalizeError> {
    let mut tally = Tally::new(sink);

    let mut atom_hits = vec![0usize; ctx.netlist.blocks.len()];
    for (_, mol) in ctx.prepacked.molecules.iter() {
        for atom in &mol.atoms {
            atom_hits[atom.index()] += 1;
        }
    }
    for (atom, block) in ctx.netlist.blocks.iter() {
        let hits = atom_hits[atom.index()];
        if hits != 1 {
            tally.fail(
                codes::E310,
                format!("atom is in {hits} molecule(s)"),
                format!("atom '{}'", block.name),
            );
        }
    }

    let mut molecule_hits = vec![0usize; ctx.prepacked.len()];
    for (_, cluster) in clustering.clusters.iter() {
        for mol in &cluster.molecules {
            molecule_hits[mol.index()] += 1;
        }
    }
    for mol in ctx.prepacked.molecules.ids() {
        let hits = molecule_hits[mol.index()];
        if hits != 1 {
            tally.fail(
                codes::E311,
                format!("molecule is in {hits} cluster(s)"),
                format!("molecule {mol}"),
            );
        }
    }

    for id in clustering.clusters.ids() {
        if !oracle.check_strict_legality(id) {
            tally.fail(
                codes::E312,
                "cluster fails the strict legality check".to_string(),
                format!("cluster {id}"),
            );
        }
    }

    tally.finish("clustering")
}

/// Checks every cluster is placed on an admissible slot, no slot is shared,
/// and macro members sit at their fixed offsets.
pub fn verify_placement(
    ctx: &LegalizeContext<'_>,
    clustering: &Clustering,
    macros: &PlaceMacros,
    table: &PlacementTable,
    sink: &DiagnosticSink,
) -> Result<(), LegalizeError> {
    let mut tally = Tally::new(sink);
    let grid = ctx.grid;

    let mut seen: HashMap<PlLoc, ClusterId> = HashMap::new();
    for (id, cluster) in clustering.clusters.iter() {
        let Some(loc) = table.location(id) else {
            tally.fail(codes::E313, "cluster is not placed".to_string(), format!("cluster {id}"));
            continue;
        };
        let tile = loc.tile();
        if !grid.is_root(tile) || loc.sub_tile >= grid.capacity(tile) {
            tally.fail(
                codes::E314,
                format!("cluster is placed on invalid slot {loc}"),
                format!("cluster {id}"),
            );
        } else if !grid.is_compatible(tile, cluster.block_type) {
            tally.fail(
                codes::E315,
                format!("tile at {tile} does not accept the cluster's block type"),
                format!("cluster {id}"),
            );
        }
        if let Some(region) = &cluster.region {
            if !region.contains(loc) {
                tally.fail(
                    codes::E316,
                    format!("cluster is placed at {loc}, outside its floorplan region"),
                    format!("cluster {id}"),
                );
            }
        }
        if let Some(other) = seen.insert(loc, id) {
            tally.fail(
                codes::E317,
                format!("slot {loc} is shared with cluster {other}"),
                format!("cluster {id}"),
            );
        }
    }

    for (macro_id, place_macro) in macros.macros.iter() {
        let Some(head) = place_macro.members.first() else {
            continue;
        };
        let Some(head_loc) = table.location(head.cluster) else {
            continue;
        };
        for member in &place_macro.members[1..] {
            let expected = (
                head_loc.x + member.dx - head.dx,
                head_loc.y + member.dy - head.dy,
                head_loc.layer + member.dlayer - head.dlayer,
            );
            let actual = table.location(member.cluster).map(|l| (l.x, l.y, l.layer));
            if actual != Some(expected) {
                tally.fail(
                    codes::E318,
                    format!("macro {macro_id} member is not at its offset from the head"),
                    format!("cluster {}", member.cluster),
                );
            }
        }
    }

    tally.finish("placement")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ClusterOrigin, FinalCluster};
    use crate::ids::MoleculeId;
    use crate::oracle::CapacityOracle;
    use crate::testutil::{cluster_each, Bench};
    use tessel_arch::TileLoc;

    #[test]
    fn missing_molecule_is_reported() {
        let bench = Bench::scenario_a();
        let ctx = bench.context();
        let mut oracle = CapacityOracle::new(&ctx);
        let ty = bench.types[0];
        for i in 0..3 {
            oracle.start(MoleculeId::from_raw(i), ty, 0);
        }
        let mut clustering = Clustering::default();
        for c in oracle.live_clusters() {
            clustering.push(FinalCluster {
                block_type: ty,
                mode: 0,
                molecules: oracle.members(c).to_vec(),
                region: None,
                desired: None,
                origin: ClusterOrigin::Greedy,
            });
        }
        let sink = DiagnosticSink::new();
        let err = verify_clustering(&ctx, &clustering, &mut oracle, &sink).unwrap_err();
        assert_eq!(
            err,
            LegalizeError::ConsistencyViolation {
                stage: "clustering",
                errors: 1
            }
        );
        assert_eq!(sink.take_all()[0].code, codes::E311);
    }

    #[test]
    fn unplaced_and_shared_slots_are_reported() {
        let bench = Bench::scenario_a();
        let ctx = bench.context();
        let clustering = cluster_each(&bench, |_| None);
        let macros = PlaceMacros::default();
        let mut table = PlacementTable::new();
        table.bind(ClusterId::from_raw(0), TileLoc::new(0, 0, 0).with_sub_tile(0));
        table.bind(ClusterId::from_raw(1), TileLoc::new(1, 0, 0).with_sub_tile(0));
        table.bind(ClusterId::from_raw(2), TileLoc::new(0, 1, 0).with_sub_tile(3));
        let sink = DiagnosticSink::new();
        let err = verify_placement(&ctx, &clustering, &macros, &table, &sink).unwrap_err();
        assert_eq!(
            err,
            LegalizeError::ConsistencyViolation {
                stage: "placement",
                errors: 2
            }
        );
        let codes_seen: Vec<_> = sink.take_all().into_iter().map(|d| d.code).collect();
        assert!(codes_seen.contains(&codes::E313));
        assert!(codes_seen.contains(&codes::E314));
    }

    #[test]
    fn clean_placement_passes() {
        let bench = Bench::scenario_a();
        let ctx = bench.context();
        let clustering = cluster_each(&bench, |_| None);
        let macros = PlaceMacros::default();
        let mut table = PlacementTable::new();
        for (i, tile) in bench.grid.root_tiles().enumerate() {
            table.bind(ClusterId::from_raw(i as u32), tile.with_sub_tile(0));
        }
        let sink = DiagnosticSink::new();
        assert!(verify_placement(&ctx, &clustering, &macros, &table, &sink).is_ok());
        assert!(!sink.has_errors());
    }
}
