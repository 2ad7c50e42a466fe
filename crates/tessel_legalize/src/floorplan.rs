//! Floorplan constraints: per-atom placement regions.

use crate::ids::{AtomBlockId, MoleculeId};
use crate::prepack::Prepacked;
use std::collections::HashMap;
use tessel_arch::PartitionRegion;

/// Regions atoms are confined to. Unconstrained atoms have no entry.
#[derive(Debug, Clone, Default)]
pub struct FloorplanConstraints {
    atom_regions: HashMap<AtomBlockId, PartitionRegion>,
}

impl FloorplanConstraints {
    /// Creates an empty constraint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Confines `atom` to `region`, intersecting with any earlier constraint.
    pub fn constrain(&mut self, atom: AtomBlockId, region: PartitionRegion) {
        let merged = match self.atom_regions.get(&atom) {
            Some(existing) => existing.intersect(&region),
            None => region,
        };
        self.atom_regions.insert(atom, merged);
    }

    /// The region of `atom`, or `None` if unconstrained.
    pub fn atom_region(&self, atom: AtomBlockId) -> Option<&PartitionRegion> {
        self.atom_regions.get(&atom)
    }

    /// Returns `true` if no atom is constrained.
    pub fn is_empty(&self) -> bool {
        self.atom_regions.is_empty()
    }

    /// Intersection of the regions of every atom in `molecules`, or `None` if
    /// none of them is constrained. An empty result means no site satisfies all.
    pub fn region_of(
        &self,
        prepacked: &Prepacked,
        molecules: &[MoleculeId],
    ) -> Option<PartitionRegion> {
        molecules
            .iter()
            .flat_map(|m| prepacked.molecule(*m).atoms.iter())
            .filter_map(|a| self.atom_regions.get(a))
            .fold(None, |acc: Option<PartitionRegion>, r| match acc {
                None => Some(r.clone()),
                Some(acc) => Some(acc.intersect(r)),
            })
    }
}
