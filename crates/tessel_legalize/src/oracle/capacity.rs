//! Reference oracle built from the architecture's capacity and wiring budgets.
//!
//! The cheap tier checks per-model mode capacity, the external input pin
//! budget and floorplan overlap. The strict tier additionally bounds the
//! number of distinct non-global nets touching the cluster by the block
//! type's routing tracks.

use super::{ClusterRemap, LegalityOracle, LegalizationStrategy, PackStatus};
use crate::context::LegalizeContext;
use crate::floorplan::FloorplanConstraints;
use crate::ids::{AtomBlockId, ClusterId, MoleculeId};
use crate::netlist::AtomNetlist;
use crate::prepack::Prepacked;
use std::collections::{HashMap, HashSet};
use tessel_arch::{Architecture, LogicalTypeId, ModelId, PartitionRegion};

#[derive(Debug, Clone)]
struct ClusterState {
    block_type: LogicalTypeId,
    mode: usize,
    molecules: Vec<MoleculeId>,
    atoms: HashSet<AtomBlockId>,
    usage: HashMap<ModelId, u32>,
    region: Option<PartitionRegion>,
    ext_inputs: u32,
    open: bool,
    alive: bool,
}

impl ClusterState {
    fn empty(block_type: LogicalTypeId, mode: usize) -> Self {
        Self {
            block_type,
            mode,
            molecules: Vec::new(),
            atoms: HashSet::new(),
            usage: HashMap::new(),
            region: None,
            ext_inputs: 0,
            open: true,
            alive: true,
        }
    }
}

/// Tentative result of adding a molecule, committed only on success.
struct Admission {
    atoms: HashSet<AtomBlockId>,
    usage: HashMap<ModelId, u32>,
    region: Option<PartitionRegion>,
    ext_inputs: u32,
}

/// A [`LegalityOracle`] over [`Architecture`] budgets.
pub struct CapacityOracle<'a> {
    arch: &'a Architecture,
    netlist: &'a AtomNetlist,
    prepacked: &'a Prepacked,
    floorplan: Option<&'a FloorplanConstraints>,
    strategy: LegalizationStrategy,
    clusters: Vec<ClusterState>,
    molecule_cluster: Vec<Option<ClusterId>>,
}

impl<'a> CapacityOracle<'a> {
    /// Creates an oracle with no clusters, in the cheap tier.
    pub fn new(ctx: &LegalizeContext<'a>) -> Self {
        Self {
            arch: ctx.arch,
            netlist: ctx.netlist,
            prepacked: ctx.prepacked,
            floorplan: ctx.floorplan,
            strategy: LegalizationStrategy::Cheap,
            clusters: Vec::new(),
            molecule_cluster: vec![None; ctx.prepacked.len()],
        }
    }

    fn state(&self, cluster: ClusterId) -> &ClusterState {
        &self.clusters[cluster.index()]
    }

    fn admit(&self, state: &ClusterState, molecule: MoleculeId) -> Result<Admission, PackStatus> {
        if self.molecule_cluster[molecule.index()].is_some() {
            return Err(PackStatus::AlreadyClustered);
        }
        if !state.open || !state.alive {
            return Err(PackStatus::ClusterClosed);
        }
        let block = &self.arch.logical_types[state.block_type];
        let mode = block.modes.get(state.mode).ok_or(PackStatus::FailedCapacity)?;
        let mol = self.prepacked.molecule(molecule);

        let mut usage = state.usage.clone();
        for &atom in &mol.atoms {
            let model = self.netlist.blocks[atom].model;
            let used = usage.entry(model).or_insert(0);
            *used += 1;
            if *used > mode.capacity_for(model) {
                return Err(PackStatus::FailedCapacity);
            }
        }

        let mut region = state.region.clone();
        if let Some(fp) = self.floorplan {
            if let Some(mol_region) = fp.region_of(self.prepacked, &[molecule]) {
                let merged = match &region {
                    Some(r) => r.intersect(&mol_region),
                    None => mol_region,
                };
                if merged.is_empty() {
                    return Err(PackStatus::FailedFloorplan);
                }
                region = Some(merged);
            }
        }

        let mut atoms = state.atoms.clone();
        atoms.extend(mol.atoms.iter().copied());
        let ext_inputs = self.netlist.external_inputs(&atoms).len() as u32;
        if ext_inputs > block.input_pins {
            return Err(PackStatus::FailedPins);
        }
        if self.strategy == LegalizationStrategy::Strict
            && !self.routable(state.block_type, &atoms)
        {
            return Err(PackStatus::FailedRouting);
        }
        Ok(Admission {
            atoms,
            usage,
            region,
            ext_inputs,
        })
    }

    fn routable(&self, block_type: LogicalTypeId, atoms: &HashSet<AtomBlockId>) -> bool {
        let tracks = self.arch.logical_types[block_type].routing_tracks;
        self.netlist.touched_nets(atoms).len() as u32 <= tracks
    }

    fn commit(&mut self, cluster: ClusterId, molecule: MoleculeId, admission: Admission) {
        let state = &mut self.clusters[cluster.index()];
        state.molecules.push(molecule);
        state.atoms = admission.atoms;
        state.usage = admission.usage;
        state.region = admission.region;
        state.ext_inputs = admission.ext_inputs;
        self.molecule_cluster[molecule.index()] = Some(cluster);
    }
}

impl LegalityOracle for CapacityOracle<'_> {
    fn set_strategy(&mut self, strategy: LegalizationStrategy) {
        self.strategy = strategy;
    }

    fn strategy(&self) -> LegalizationStrategy {
        self.strategy
    }

    fn start(
        &mut self,
        molecule: MoleculeId,
        block_type: LogicalTypeId,
        mode: usize,
    ) -> (PackStatus, Option<ClusterId>) {
        let state = ClusterState::empty(block_type, mode);
        match self.admit(&state, molecule) {
            Ok(admission) => {
                let id = ClusterId::from_raw(self.clusters.len() as u32);
                self.clusters.push(state);
                self.commit(id, molecule, admission);
                (PackStatus::Passed, Some(id))
            }
            Err(status) => (status, None),
        }
    }

    fn add(&mut self, molecule: MoleculeId, cluster: ClusterId) -> PackStatus {
        match self.admit(self.state(cluster), molecule) {
            Ok(admission) => {
                self.commit(cluster, molecule, admission);
                PackStatus::Passed
            }
            Err(status) => status,
        }
    }

    fn is_compatible(&self, molecule: MoleculeId, cluster: ClusterId) -> bool {
        let state = self.state(cluster);
        if !state.alive {
            return false;
        }
        let Some(mode) = self.arch.logical_types[state.block_type].modes.get(state.mode) else {
            return false;
        };
        let mol = self.prepacked.molecule(molecule);
        let fits = mol
            .atoms
            .iter()
            .all(|&a| mode.capacity_for(self.netlist.blocks[a].model) > 0);
        let placeable = match (self.floorplan, &state.region) {
            (Some(fp), Some(region)) => fp
                .region_of(self.prepacked, &[molecule])
                .map_or(true, |r| !region.intersect(&r).is_empty()),
            _ => true,
        };
        fits && placeable
    }

    fn check_strict_legality(&mut self, cluster: ClusterId) -> bool {
        let state = self.state(cluster);
        let block = &self.arch.logical_types[state.block_type];
        state.alive
            && state.ext_inputs <= block.input_pins
            && self.routable(state.block_type, &state.atoms)
    }

    fn clean(&mut self, cluster: ClusterId) {
        let state = &mut self.clusters[cluster.index()];
        state.open = false;
        state.usage.shrink_to_fit();
    }

    fn destroy(&mut self, cluster: ClusterId) -> Vec<MoleculeId> {
        let state = &mut self.clusters[cluster.index()];
        state.alive = false;
        state.open = false;
        state.atoms.clear();
        state.usage.clear();
        state.region = None;
        state.ext_inputs = 0;
        let members = std::mem::take(&mut state.molecules);
        for m in &members {
            self.molecule_cluster[m.index()] = None;
        }
        members
    }

    fn members(&self, cluster: ClusterId) -> &[MoleculeId] {
        &self.state(cluster).molecules
    }

    fn block_type(&self, cluster: ClusterId) -> LogicalTypeId {
        self.state(cluster).block_type
    }

    fn mode(&self, cluster: ClusterId) -> usize {
        self.state(cluster).mode
    }

    fn has_remaining_capacity(&self, cluster: ClusterId) -> bool {
        let state = self.state(cluster);
        if !state.alive || !state.open {
            return false;
        }
        let Some(mode) = self.arch.logical_types[state.block_type].modes.get(state.mode) else {
            return false;
        };
        let used: u32 = state.usage.values().sum();
        used < mode.total_capacity()
    }

    fn molecule_cluster(&self, molecule: MoleculeId) -> Option<ClusterId> {
        self.molecule_cluster[molecule.index()]
    }

    fn inputs_available(&self, cluster: ClusterId) -> u32 {
        let state = self.state(cluster);
        self.arch.logical_types[state.block_type]
            .input_pins
            .saturating_sub(state.ext_inputs)
    }

    fn live_clusters(&self) -> Vec<ClusterId> {
        self.clusters
            .iter()
            .enumerate()
            .filter(|(_, s)| s.alive)
            .map(|(i, _)| ClusterId::from_raw(i as u32))
            .collect()
    }

    fn compress(&mut self) -> ClusterRemap {
        let mut remap = ClusterRemap::default();
        let old = std::mem::take(&mut self.clusters);
        for (index, state) in old.into_iter().enumerate() {
            if !state.alive {
                continue;
            }
            let new_id = ClusterId::from_raw(self.clusters.len() as u32);
            remap.insert(ClusterId::from_raw(index as u32), new_id);
            for m in &state.molecules {
                self.molecule_cluster[m.index()] = Some(new_id);
            }
            self.clusters.push(state);
        }
        remap
    }
}
