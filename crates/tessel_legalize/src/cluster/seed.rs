//! Seed selection and molecule ranking.
//!
//! Ranking is a pure function of prepacked statistics, so it is the one step
//! run in parallel. Both sorts are stable and end in an ascending-ID
//! tie-break, which keeps runs reproducible.

use crate::ids::MoleculeId;
use crate::oracle::LegalityOracle;
use crate::prepack::Prepacked;
use rayon::prelude::*;
use std::cmp::Ordering;
use tessel_config::SeedRanking;

/// Hands out the next unclustered molecule to start a cluster from.
#[derive(Debug, Clone)]
pub struct SeedSelector {
    order: Vec<MoleculeId>,
    cursor: usize,
}

impl SeedSelector {
    /// Ranks every molecule of `prepacked` by `ranking`.
    pub fn new(prepacked: &Prepacked, ranking: SeedRanking) -> Self {
        let mut order: Vec<MoleculeId> = prepacked.molecules.ids().collect();
        order.par_sort_by(|&a, &b| {
            let sa = prepacked.molecule(a).stats;
            let sb = prepacked.molecule(b).stats;
            let primary = match ranking {
                SeedRanking::MaxInputs => sb.ext_inputs.cmp(&sa.ext_inputs),
                SeedRanking::Blocks => sb
                    .blocks
                    .cmp(&sa.blocks)
                    .then(sb.ext_inputs.cmp(&sa.ext_inputs)),
                SeedRanking::Pins => sb.pins().cmp(&sa.pins()),
            };
            primary.then(a.cmp(&b))
        });
        Self { order, cursor: 0 }
    }

    /// The ranked order.
    pub fn order(&self) -> &[MoleculeId] {
        &self.order
    }

    /// The best-ranked molecule not yet in a cluster, or `None` once every
    /// molecule is clustered.
    ///
    /// Molecules returned to the pool by a destroyed cluster are found again
    /// by a final rescan once the cursor reaches the end.
    pub fn next_seed(&mut self, oracle: &dyn LegalityOracle) -> Option<MoleculeId> {
        while let Some(&mol) = self.order.get(self.cursor) {
            if oracle.molecule_cluster(mol).is_none() {
                return Some(mol);
            }
            self.cursor += 1;
        }
        self.order
            .iter()
            .copied()
            .find(|m| oracle.molecule_cluster(*m).is_none())
    }
}

/// Sorts molecules for reconstruction: carry-chain links first, then
/// descending external inputs, then ascending ID.
pub fn rank_for_reconstruction(prepacked: &Prepacked, molecules: &mut [MoleculeId]) {
    molecules.par_sort_by(|&a, &b| reconstruction_order(prepacked, a, b));
}

fn reconstruction_order(prepacked: &Prepacked, a: MoleculeId, b: MoleculeId) -> Ordering {
    let ca = prepacked.is_chain(a);
    let cb = prepacked.is_chain(b);
    cb.cmp(&ca)
        .then_with(|| {
            let ia = prepacked.molecule(a).stats.ext_inputs;
            let ib = prepacked.molecule(b).stats.ext_inputs;
            ib.cmp(&ia)
        })
        .then(a.cmp(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Bench;

    /// Molecules: m0 = 2-atom group with 2 inputs, m1 = 1 input,
    /// m2 = 3 inputs, m3 = 3 inputs.
    fn ranked_bench() -> Bench {
        Bench::fanin(&[1, 3, 3], Some(2))
    }

    fn ids(v: &[u32]) -> Vec<MoleculeId> {
        v.iter().map(|&i| MoleculeId::from_raw(i)).collect()
    }

    #[test]
    fn max_inputs_ranking_breaks_ties_by_id() {
        let bench = ranked_bench();
        let selector = SeedSelector::new(&bench.prepacked, SeedRanking::MaxInputs);
        assert_eq!(selector.order(), ids(&[2, 3, 0, 1]).as_slice());
    }

    #[test]
    fn blocks_ranking_puts_groups_first() {
        let bench = ranked_bench();
        let selector = SeedSelector::new(&bench.prepacked, SeedRanking::Blocks);
        assert_eq!(selector.order(), ids(&[0, 2, 3, 1]).as_slice());
    }

    #[test]
    fn next_seed_skips_clustered_and_rescans() {
        let bench = ranked_bench();
        let ctx = bench.context();
        let mut oracle = crate::oracle::CapacityOracle::new(&ctx);
        let mut selector = SeedSelector::new(&bench.prepacked, SeedRanking::MaxInputs);
        let ty = bench.types[0];

        let first = selector.next_seed(&oracle).unwrap();
        assert_eq!(first, MoleculeId::from_raw(2));
        let c = oracle.start(first, ty, 0).1.unwrap();
        assert_eq!(selector.next_seed(&oracle), Some(MoleculeId::from_raw(3)));

        for m in [3, 0, 1] {
            oracle.start(MoleculeId::from_raw(m), ty, 0);
        }
        assert_eq!(selector.next_seed(&oracle), None);

        oracle.destroy(c);
        assert_eq!(selector.next_seed(&oracle), Some(MoleculeId::from_raw(2)));
    }

    #[test]
    fn reconstruction_puts_chains_first() {
        let bench = Bench::with_chain();
        let mut mols: Vec<MoleculeId> = bench.prepacked.molecules.ids().collect();
        mols.reverse();
        rank_for_reconstruction(&bench.prepacked, &mut mols);
        assert!(bench.prepacked.is_chain(mols[0]));
        assert!(bench.prepacked.is_chain(mols[1]));
        assert!(!bench.prepacked.is_chain(mols[2]));
    }
}
