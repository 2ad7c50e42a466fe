//! Prepacked molecules: the indivisible units clustering works with.
//!
//! Every atom ends up in exactly one molecule. Explicit groups and carry-chain
//! links become multi-atom molecules; every other atom becomes a singleton.

use crate::error::LegalizeError;
use crate::ids::{AtomBlockId, MoleculeId};
use crate::netlist::AtomNetlist;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tessel_common::Arena;

/// External-pin statistics used to rank molecules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoleculeStats {
    /// Atoms in the molecule.
    pub blocks: u32,
    /// Distinct non-global nets driven from outside the molecule.
    pub ext_inputs: u32,
    /// Distinct non-global nets leaving the molecule.
    pub ext_outputs: u32,
}

impl MoleculeStats {
    /// Used external pins.
    pub fn pins(&self) -> u32 {
        self.ext_inputs + self.ext_outputs
    }
}

/// A group of atoms that must share a cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Molecule {
    /// Member atoms, root first.
    pub atoms: Vec<AtomBlockId>,
    /// Index into [`Prepacked::chains`] if the molecule is a carry-chain link.
    pub chain: Option<usize>,
    /// Ranking statistics.
    pub stats: MoleculeStats,
}

impl Molecule {
    /// The root atom, whose model selects candidate block types.
    pub fn root(&self) -> AtomBlockId {
        self.atoms[0]
    }
}

/// The result of prepacking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prepacked {
    /// All molecules.
    pub molecules: Arena<MoleculeId, Molecule>,
    /// Ordered links of each carry chain.
    pub chains: Vec<Vec<MoleculeId>>,
    atom_molecule: Vec<MoleculeId>,
}

impl Prepacked {
    /// Wraps every atom in its own molecule.
    pub fn singletons(netlist: &AtomNetlist) -> Self {
        MoleculeTable::new(netlist).finish(Vec::new())
    }

    /// The molecule containing `atom`.
    pub fn molecule_of(&self, atom: AtomBlockId) -> MoleculeId {
        self.atom_molecule[atom.index()]
    }

    /// The molecule with the given ID.
    pub fn molecule(&self, id: MoleculeId) -> &Molecule {
        &self.molecules[id]
    }

    /// Number of molecules.
    pub fn len(&self) -> usize {
        self.molecules.len()
    }

    /// Returns `true` if there are no molecules.
    pub fn is_empty(&self) -> bool {
        self.molecules.is_empty()
    }

    /// Returns `true` if the molecule is a carry-chain link.
    pub fn is_chain(&self, id: MoleculeId) -> bool {
        self.molecules[id].chain.is_some()
    }
}

/// Collects explicit molecule groupings before building [`Prepacked`].
#[derive(Debug, Clone, Default)]
pub struct PrepackBuilder {
    groups: Vec<Vec<AtomBlockId>>,
    chains: Vec<Vec<Vec<AtomBlockId>>>,
}

impl PrepackBuilder {
    /// Creates a builder with no explicit groups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a molecule holding exactly `atoms`, root first.
    pub fn group(mut self, atoms: Vec<AtomBlockId>) -> Self {
        self.groups.push(atoms);
        self
    }

    /// Requests a carry chain whose links, in order, are the given molecules.
    pub fn chain(mut self, links: Vec<Vec<AtomBlockId>>) -> Self {
        self.chains.push(links);
        self
    }

    /// Builds the molecules, adding singletons for ungrouped atoms.
    pub fn build(self, netlist: &AtomNetlist) -> Result<Prepacked, LegalizeError> {
        let mut table = MoleculeTable::new(netlist);
        let mut chains = Vec::with_capacity(self.chains.len());
        for (index, links) in self.chains.into_iter().enumerate() {
            let mut ids = Vec::with_capacity(links.len());
            for link in links {
                ids.push(table.claim(link, Some(index))?);
            }
            chains.push(ids);
        }
        for group in self.groups {
            table.claim(group, None)?;
        }
        Ok(table.finish(chains))
    }
}

struct MoleculeTable<'a> {
    netlist: &'a AtomNetlist,
    molecules: Arena<MoleculeId, Molecule>,
    owner: Vec<Option<MoleculeId>>,
}

impl<'a> MoleculeTable<'a> {
    fn new(netlist: &'a AtomNetlist) -> Self {
        Self {
            netlist,
            molecules: Arena::new(),
            owner: vec![None; netlist.blocks.len()],
        }
    }

    fn claim(
        &mut self,
        atoms: Vec<AtomBlockId>,
        chain: Option<usize>,
    ) -> Result<MoleculeId, LegalizeError> {
        if atoms.is_empty() {
            return Err(LegalizeError::InvalidPrepack("empty molecule".to_string()));
        }
        let id = MoleculeId::from_raw(self.molecules.len() as u32);
        for &atom in &atoms {
            let slot = self
                .owner
                .get_mut(atom.index())
                .ok_or_else(|| LegalizeError::InvalidPrepack(format!("unknown atom {atom}")))?;
            if slot.is_some() {
                return Err(LegalizeError::InvalidPrepack(format!(
                    "atom '{}' is in more than one molecule",
                    self.netlist.blocks[atom].name
                )));
            }
            *slot = Some(id);
        }
        let stats = molecule_stats(self.netlist, &atoms);
        Ok(self.molecules.alloc(Molecule {
            atoms,
            chain,
            stats,
        }))
    }

    /// Wraps every unclaimed atom in a singleton and freezes the table.
    fn finish(mut self, chains: Vec<Vec<MoleculeId>>) -> Prepacked {
        for atom in self.netlist.blocks.ids() {
            if self.owner[atom.index()].is_none() {
                let stats = molecule_stats(self.netlist, &[atom]);
                let id = self.molecules.alloc(Molecule {
                    atoms: vec![atom],
                    chain: None,
                    stats,
                });
                self.owner[atom.index()] = Some(id);
            }
        }
        Prepacked {
            molecules: self.molecules,
            chains,
            atom_molecule: self.owner.into_iter().flatten().collect(),
        }
    }
}

fn molecule_stats(netlist: &AtomNetlist, atoms: &[AtomBlockId]) -> MoleculeStats {
    let set: HashSet<AtomBlockId> = atoms.iter().copied().collect();
    MoleculeStats {
        blocks: atoms.len() as u32,
        ext_inputs: netlist.external_inputs(&set).len() as u32,
        ext_outputs: netlist.external_outputs(&set).len() as u32,
    }
}
