//! Attraction groups: atoms the clusterer should try to keep together.

use crate::ids::{AtomBlockId, AttractGroupId};
use std::collections::HashMap;
use tessel_common::Arena;

/// One attraction group.
#[derive(Debug, Clone)]
pub struct AttractionGroup {
    /// Member atoms.
    pub atoms: Vec<AtomBlockId>,
    /// Gain bonus for candidates in the same group as the cluster.
    pub gain: f32,
}

/// All attraction groups of a design. An atom belongs to at most one group.
#[derive(Debug, Clone, Default)]
pub struct AttractionGroups {
    groups: Arena<AttractGroupId, AttractionGroup>,
    atom_group: HashMap<AtomBlockId, AttractGroupId>,
}

impl AttractionGroups {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group. Atoms already in another group stay there.
    pub fn add_group(&mut self, atoms: Vec<AtomBlockId>, gain: f32) -> AttractGroupId {
        let members: Vec<AtomBlockId> = atoms
            .into_iter()
            .filter(|a| !self.atom_group.contains_key(a))
            .collect();
        let id = self.groups.alloc(AttractionGroup {
            atoms: members.clone(),
            gain,
        });
        for atom in members {
            self.atom_group.insert(atom, id);
        }
        id
    }

    /// The group of `atom`, if any.
    pub fn group_of(&self, atom: AtomBlockId) -> Option<AttractGroupId> {
        self.atom_group.get(&atom).copied()
    }

    /// The group with the given ID.
    pub fn group(&self, id: AttractGroupId) -> &AttractionGroup {
        &self.groups[id]
    }

    /// Returns `true` if there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
