//! The atom netlist: primitive blocks and the nets connecting them.

use crate::ids::{AtomBlockId, AtomNetId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tessel_arch::ModelId;
use tessel_common::Arena;

/// A primitive circuit element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomBlock {
    /// Instance name.
    pub name: String,
    /// Primitive model.
    pub model: ModelId,
    /// Nets driving this block's inputs.
    pub inputs: Vec<AtomNetId>,
    /// Nets driven by this block.
    pub outputs: Vec<AtomNetId>,
}

/// A net between atoms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomNet {
    /// Net name.
    pub name: String,
    /// Driving block; `None` for primary inputs.
    pub driver: Option<AtomBlockId>,
    /// Sink blocks.
    pub sinks: Vec<AtomBlockId>,
    /// Global nets (clocks, resets) use dedicated routing and are never
    /// counted against cluster pin or track budgets.
    pub is_global: bool,
}

impl AtomNet {
    /// Number of block pins on the net.
    pub fn pin_count(&self) -> usize {
        self.sinks.len() + usize::from(self.driver.is_some())
    }

    /// Iterates over every block on the net, driver first.
    pub fn blocks(&self) -> impl Iterator<Item = AtomBlockId> + '_ {
        self.driver.into_iter().chain(self.sinks.iter().copied())
    }
}

/// Primitive blocks and nets of the design.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtomNetlist {
    /// All blocks.
    pub blocks: Arena<AtomBlockId, AtomBlock>,
    /// All nets.
    pub nets: Arena<AtomNetId, AtomNet>,
}

impl AtomNetlist {
    /// Creates an empty netlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an unconnected block.
    pub fn add_block(&mut self, name: impl Into<String>, model: ModelId) -> AtomBlockId {
        self.blocks.alloc(AtomBlock {
            name: name.into(),
            model,
            inputs: Vec::new(),
            outputs: Vec::new(),
        })
    }

    /// Adds a signal net and connects its pins.
    pub fn add_net(
        &mut self,
        name: impl Into<String>,
        driver: Option<AtomBlockId>,
        sinks: &[AtomBlockId],
    ) -> AtomNetId {
        self.connect(name.into(), driver, sinks, false)
    }

    /// Adds a global net and connects its pins.
    pub fn add_global_net(
        &mut self,
        name: impl Into<String>,
        driver: Option<AtomBlockId>,
        sinks: &[AtomBlockId],
    ) -> AtomNetId {
        self.connect(name.into(), driver, sinks, true)
    }

    fn connect(
        &mut self,
        name: String,
        driver: Option<AtomBlockId>,
        sinks: &[AtomBlockId],
        is_global: bool,
    ) -> AtomNetId {
        let net = self.nets.alloc(AtomNet {
            name,
            driver,
            sinks: sinks.to_vec(),
            is_global,
        });
        if let Some(d) = driver {
            self.blocks[d].outputs.push(net);
        }
        for &s in sinks {
            self.blocks[s].inputs.push(net);
        }
        net
    }

    /// Non-global nets driving `atoms` from outside the set.
    pub fn external_inputs(&self, atoms: &HashSet<AtomBlockId>) -> BTreeSet<AtomNetId> {
        atoms
            .iter()
            .flat_map(|&a| self.blocks[a].inputs.iter().copied())
            .filter(|&n| {
                let net = &self.nets[n];
                !net.is_global && net.driver.map_or(true, |d| !atoms.contains(&d))
            })
            .collect()
    }

    /// Non-global nets driven inside `atoms` with at least one sink outside.
    pub fn external_outputs(&self, atoms: &HashSet<AtomBlockId>) -> BTreeSet<AtomNetId> {
        atoms
            .iter()
            .flat_map(|&a| self.blocks[a].outputs.iter().copied())
            .filter(|&n| {
                let net = &self.nets[n];
                !net.is_global && net.sinks.iter().any(|s| !atoms.contains(s))
            })
            .collect()
    }

    /// Distinct non-global nets touching any block of `atoms`.
    pub fn touched_nets(&self, atoms: &HashSet<AtomBlockId>) -> BTreeSet<AtomNetId> {
        atoms
            .iter()
            .flat_map(|&a| {
                let block = &self.blocks[a];
                block.inputs.iter().chain(block.outputs.iter()).copied()
            })
            .filter(|&n| !self.nets[n].is_global)
            .collect()
    }
}
