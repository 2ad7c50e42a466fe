//! Rigid placement macros built from carry chains.
//!
//! A chain whose links landed in more than one cluster becomes a vertical
//! column: the cluster holding the first link is the head at offset zero and
//! each following cluster sits one row above the previous one.

use crate::cluster::Clustering;
use crate::ids::{ClusterId, MacroId};
use crate::prepack::Prepacked;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tessel_common::Arena;

/// One cluster of a macro and its offset from the macro head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroMember {
    /// The member cluster.
    pub cluster: ClusterId,
    /// Column offset from the head.
    pub dx: i32,
    /// Row offset from the head.
    pub dy: i32,
    /// Layer offset from the head.
    pub dlayer: i32,
}

impl MacroMember {
    /// A lone cluster as its own unit.
    pub fn head(cluster: ClusterId) -> Self {
        Self {
            cluster,
            dx: 0,
            dy: 0,
            dlayer: 0,
        }
    }
}

/// A rigid group of clusters placed as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceMacro {
    /// Members; the first is the head.
    pub members: Vec<MacroMember>,
}

/// All macros of a design.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaceMacros {
    /// The macros.
    pub macros: Arena<MacroId, PlaceMacro>,
    cluster_macro: HashMap<ClusterId, MacroId>,
}

impl PlaceMacros {
    /// Builds a macro for every chain that spans several clusters.
    pub fn from_chains(prepacked: &Prepacked, clustering: &Clustering) -> Self {
        let mut macros = PlaceMacros::default();
        for chain in &prepacked.chains {
            let mut clusters: Vec<ClusterId> = Vec::with_capacity(chain.len());
            for &mol in chain {
                if let Some(c) = clustering.cluster_of(mol) {
                    if !clusters.contains(&c) {
                        clusters.push(c);
                    }
                }
            }
            if clusters.len() < 2 {
                continue;
            }
            let members = clusters
                .iter()
                .enumerate()
                .map(|(i, &cluster)| MacroMember {
                    cluster,
                    dx: 0,
                    dy: i as i32,
                    dlayer: 0,
                })
                .collect();
            let id = macros.macros.alloc(PlaceMacro { members });
            for c in clusters {
                macros.cluster_macro.insert(c, id);
            }
        }
        macros
    }

    /// The macro holding `cluster`, if any.
    pub fn macro_of(&self, cluster: ClusterId) -> Option<MacroId> {
        self.cluster_macro.get(&cluster).copied()
    }

    /// The placement unit of `cluster`: its macro's members, or the cluster
    /// alone at offset zero.
    pub fn unit(&self, cluster: ClusterId) -> Vec<MacroMember> {
        match self.macro_of(cluster) {
            Some(id) => self.macros[id].members.clone(),
            None => vec![MacroMember::head(cluster)],
        }
    }

    /// Number of macros.
    pub fn len(&self) -> usize {
        self.macros.len()
    }

    /// Returns `true` if there are no macros.
    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}
