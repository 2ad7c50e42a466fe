//! Small hand-built designs shared by unit tests.

use crate::attraction::AttractionGroups;
use crate::cluster::{ClusterOrigin, Clustering, FinalCluster};
use crate::context::LegalizeContext;
use crate::flat::{FlatLoc, FlatPlacement};
use crate::floorplan::FloorplanConstraints;
use crate::ids::{AtomBlockId, ClusterId, MoleculeId};
use crate::netlist::AtomNetlist;
use crate::oracle::{
    CapacityOracle, ClusterRemap, LegalityOracle, LegalizationStrategy, PackStatus,
};
use crate::prepack::{PrepackBuilder, Prepacked};
use std::collections::HashSet;
use tessel_arch::{
    Architecture, BlockMode, LogicalTypeId, ModelId, PartitionRegion, PhysicalTypeId, TileGrid,
    TileLoc,
};

pub(crate) struct Bench {
    pub arch: Architecture,
    pub grid: TileGrid,
    pub netlist: AtomNetlist,
    pub prepacked: Prepacked,
    pub flat: FlatPlacement,
    pub floorplan: Option<FloorplanConstraints>,
    pub attraction: Option<AttractionGroups>,
    pub types: Vec<LogicalTypeId>,
}

/// A one-type architecture: `clb` holding `luts` LUTs, on a `w`x`h` device
/// of `sub_tiles`-slot tiles, each `footprint` cells wide and tall.
struct LutDevice {
    arch: Architecture,
    lut: ModelId,
    clb: LogicalTypeId,
    tile: PhysicalTypeId,
}

impl LutDevice {
    fn new(luts: u32, input_pins: u32, tracks: u32, sub_tiles: u32) -> Self {
        Self::shaped(luts, input_pins, tracks, sub_tiles, (1, 1))
    }

    fn shaped(luts: u32, input_pins: u32, tracks: u32, sub_tiles: u32, footprint: (u32, u32)) -> Self {
        let (fw, fh) = footprint;
        let mut arch = Architecture::new();
        let lut = arch.add_model("lut").unwrap();
        let clb = arch
            .add_logical_type("clb", vec![BlockMode::new("default", vec![(lut, luts)])], input_pins, tracks)
            .unwrap();
        let tile = arch
            .add_physical_type("clb_tile", fw, fh, sub_tiles, vec![clb])
            .unwrap();
        Self {
            arch,
            lut,
            clb,
            tile,
        }
    }

    fn grid(&self, w: u32, h: u32) -> TileGrid {
        self.stacked_grid(w, h, 1)
    }

    fn stacked_grid(&self, w: u32, h: u32, layers: u32) -> TileGrid {
        TileGrid::builder(&self.arch, w, h, layers)
            .unwrap()
            .fill(self.tile)
            .unwrap()
            .build()
    }
}

impl Bench {
    fn assemble(device: LutDevice, grid: TileGrid, netlist: AtomNetlist, prepacked: Prepacked) -> Self {
        Self {
            grid,
            netlist,
            prepacked,
            flat: FlatPlacement::new(),
            floorplan: None,
            attraction: None,
            types: vec![device.clb],
            arch: device.arch,
        }
    }

    pub fn context(&self) -> LegalizeContext<'_> {
        let mut ctx = LegalizeContext::new(
            &self.arch,
            &self.grid,
            &self.netlist,
            &self.prepacked,
            &self.flat,
        );
        if let Some(fp) = &self.floorplan {
            ctx = ctx.with_floorplan(fp);
        }
        if let Some(groups) = &self.attraction {
            ctx = ctx.with_attraction(groups);
        }
        ctx
    }

    /// Hints every molecule to the center of `tile`.
    fn hint_all(&mut self, tile: TileLoc) {
        for mol in self.prepacked.molecules.ids() {
            self.flat.set(mol, center_of(tile));
        }
    }

    /// Two LUT-holding types `A` and `B`, each accepted by one 1-slot tile of
    /// a 2x1 device, and two unconnected LUTs.
    pub fn two_types() -> Self {
        let mut arch = Architecture::new();
        let lut = arch.add_model("lut").unwrap();
        let a = arch
            .add_logical_type("A", vec![BlockMode::new("m", vec![(lut, 2)])], 4, 8)
            .unwrap();
        let b = arch
            .add_logical_type("B", vec![BlockMode::new("m", vec![(lut, 2)])], 4, 8)
            .unwrap();
        let tile_a = arch.add_physical_type("tile_a", 1, 1, 1, vec![a]).unwrap();
        let tile_b = arch.add_physical_type("tile_b", 1, 1, 1, vec![b]).unwrap();
        let grid = TileGrid::builder(&arch, 2, 1, 1)
            .unwrap()
            .place(TileLoc::new(0, 0, 0), tile_a)
            .unwrap()
            .place(TileLoc::new(1, 0, 0), tile_b)
            .unwrap()
            .build();
        let mut netlist = AtomNetlist::new();
        netlist.add_block("l0", lut);
        netlist.add_block("l1", lut);
        let prepacked = Prepacked::singletons(&netlist);
        Self {
            arch,
            grid,
            netlist,
            prepacked,
            flat: FlatPlacement::new(),
            floorplan: None,
            attraction: None,
            types: vec![a, b],
        }
    }

    /// Unconnected LUTs fed by `counts[i]` primary inputs each. With
    /// `group = Some(k)`, molecule 0 is a two-LUT group `g0 -> g1` with `k`
    /// primary inputs on `g0`.
    pub fn fanin(counts: &[usize], group: Option<usize>) -> Self {
        let total: usize = counts.iter().sum::<usize>() + group.unwrap_or(0);
        let atoms = counts.len() + if group.is_some() { 2 } else { 0 };
        let device = LutDevice::new(atoms as u32, total as u32 + 1, 64, 1);
        let grid = device.grid(2, 2);
        let mut netlist = AtomNetlist::new();
        let mut builder = PrepackBuilder::new();
        if let Some(k) = group {
            let g0 = netlist.add_block("g0", device.lut);
            let g1 = netlist.add_block("g1", device.lut);
            primary_inputs(&mut netlist, g0, k);
            netlist.add_net("g0_g1", Some(g0), &[g1]);
            builder = builder.group(vec![g0, g1]);
        }
        for (i, &count) in counts.iter().enumerate() {
            let atom = netlist.add_block(format!("l{i}"), device.lut);
            primary_inputs(&mut netlist, atom, count);
        }
        let prepacked = builder.build(&netlist).unwrap();
        Self::assemble(device, grid, netlist, prepacked)
    }

    /// A two-link carry chain `c0 -> c1` plus one free LUT, on a 2x2 device
    /// of one-LUT clusters.
    pub fn with_chain() -> Self {
        let device = LutDevice::new(1, 4, 8, 1);
        let grid = device.grid(2, 2);
        let mut netlist = AtomNetlist::new();
        let c0 = netlist.add_block("c0", device.lut);
        let c1 = netlist.add_block("c1", device.lut);
        netlist.add_block("free", device.lut);
        netlist.add_net("carry", Some(c0), &[c1]);
        let prepacked = PrepackBuilder::new()
            .chain(vec![vec![c0], vec![c1]])
            .build(&netlist)
            .unwrap();
        Self::assemble(device, grid, netlist, prepacked)
    }

    /// `chain` LUTs connected `l0 -> l1 -> ...` (with a primary input on
    /// `l0`) followed by `isolated` LUTs with one primary input each.
    pub fn lut_chain(chain: usize, isolated: usize) -> Self {
        let device = LutDevice::new(4, 8, 16, 1);
        let grid = device.grid(2, 2);
        let mut netlist = AtomNetlist::new();
        let links: Vec<AtomBlockId> = (0..chain)
            .map(|i| netlist.add_block(format!("l{i}"), device.lut))
            .collect();
        if let Some(&first) = links.first() {
            primary_inputs(&mut netlist, first, 1);
        }
        for pair in links.windows(2) {
            netlist.add_net(format!("n{}", pair[0]), Some(pair[0]), &[pair[1]]);
        }
        for i in 0..isolated {
            let atom = netlist.add_block(format!("iso{i}"), device.lut);
            primary_inputs(&mut netlist, atom, 1);
        }
        let prepacked = Prepacked::singletons(&netlist);
        Self::assemble(device, grid, netlist, prepacked)
    }

    /// Three LUTs `a0 -> {a1, a2}` that fit one cluster under the cheap tier
    /// but touch seven nets against a budget of five tracks. `a0` alone
    /// touches five.
    pub fn routing_squeeze() -> Self {
        let device = LutDevice::new(4, 10, 5, 1);
        let grid = device.grid(2, 2);
        let mut netlist = AtomNetlist::new();
        let a0 = netlist.add_block("a0", device.lut);
        let a1 = netlist.add_block("a1", device.lut);
        let a2 = netlist.add_block("a2", device.lut);
        primary_inputs(&mut netlist, a0, 3);
        primary_inputs(&mut netlist, a1, 1);
        primary_inputs(&mut netlist, a2, 1);
        netlist.add_net("a0_a1", Some(a0), &[a1]);
        netlist.add_net("a0_a2", Some(a0), &[a2]);
        let prepacked = Prepacked::singletons(&netlist);
        let mut bench = Self::assemble(device, grid, netlist, prepacked);
        bench.hint_all(TileLoc::new(0, 0, 0));
        bench
    }

    /// A LUT plus a DSP atom the architecture has no block type for.
    pub fn orphan_model() -> Self {
        let mut device = LutDevice::new(4, 8, 16, 1);
        let dsp = device.arch.add_model("dsp").unwrap();
        let grid = device.grid(2, 2);
        let mut netlist = AtomNetlist::new();
        netlist.add_block("l0", device.lut);
        netlist.add_block("d0", dsp);
        let prepacked = Prepacked::singletons(&netlist);
        let mut bench = Self::assemble(device, grid, netlist, prepacked);
        bench.hint_all(TileLoc::new(0, 0, 0));
        bench
    }

    /// Four unconnected LUTs on a 2x2 device of one-LUT, one-slot tiles,
    /// each hinted to a different tile.
    pub fn scenario_a() -> Self {
        let device = LutDevice::new(1, 4, 8, 1);
        let grid = device.grid(2, 2);
        let mut netlist = AtomNetlist::new();
        for i in 0..4 {
            netlist.add_block(format!("l{i}"), device.lut);
        }
        let prepacked = Prepacked::singletons(&netlist);
        let mut bench = Self::assemble(device, grid, netlist, prepacked);
        let tiles = [(0, 0), (1, 0), (0, 1), (1, 1)];
        for (mol, &(x, y)) in bench.prepacked.molecules.ids().zip(tiles.iter()) {
            bench.flat.set(mol, center_of(TileLoc::new(x, y, 0)));
        }
        bench
    }

    /// Two unconnected LUTs hinted to one two-slot tile; clusters hold
    /// `luts` LUTs.
    pub fn shared_tile(luts: u32) -> Self {
        let device = LutDevice::new(luts, 4, 8, 2);
        let grid = device.grid(2, 2);
        let mut netlist = AtomNetlist::new();
        netlist.add_block("l0", device.lut);
        netlist.add_block("l1", device.lut);
        let prepacked = Prepacked::singletons(&netlist);
        let mut bench = Self::assemble(device, grid, netlist, prepacked);
        bench.hint_all(TileLoc::new(0, 0, 0));
        bench
    }

    /// A two-LUT group `g0 -> g1` on a 2x2 device whose clusters hold one LUT.
    pub fn oversized_group() -> Self {
        let device = LutDevice::new(1, 4, 8, 1);
        let grid = device.grid(2, 2);
        let mut netlist = AtomNetlist::new();
        let g0 = netlist.add_block("g0", device.lut);
        let g1 = netlist.add_block("g1", device.lut);
        primary_inputs(&mut netlist, g0, 1);
        netlist.add_net("g0_g1", Some(g0), &[g1]);
        let prepacked = PrepackBuilder::new().group(vec![g0, g1]).build(&netlist).unwrap();
        let mut bench = Self::assemble(device, grid, netlist, prepacked);
        bench.hint_all(TileLoc::new(0, 0, 0));
        bench
    }

    /// `n` unconnected LUTs on a 2x2 device of 1x2 one-slot tiles rooted at
    /// `(0, 0)` and `(1, 0)`, all hinted to the upper cell `(0, 1)`.
    pub fn tall_tiles(n: usize) -> Self {
        let device = LutDevice::shaped(1, 4, 8, 1, (1, 2));
        let grid = device.grid(2, 2);
        let mut netlist = AtomNetlist::new();
        for i in 0..n {
            netlist.add_block(format!("l{i}"), device.lut);
        }
        let prepacked = Prepacked::singletons(&netlist);
        let mut bench = Self::assemble(device, grid, netlist, prepacked);
        bench.hint_all(TileLoc::new(0, 1, 0));
        bench
    }

    /// `n` unconnected LUTs on a 2x2 device with `layers` layers of one-LUT,
    /// one-slot tiles, all hinted to the origin of layer 0.
    pub fn stacked(layers: u32, n: usize) -> Self {
        let device = LutDevice::new(1, 4, 8, 1);
        let grid = device.stacked_grid(2, 2, layers);
        let mut netlist = AtomNetlist::new();
        for i in 0..n {
            netlist.add_block(format!("l{i}"), device.lut);
        }
        let prepacked = Prepacked::singletons(&netlist);
        let mut bench = Self::assemble(device, grid, netlist, prepacked);
        bench.hint_all(TileLoc::new(0, 0, 0));
        bench
    }

    /// `n` unconnected LUTs hinted to one single-slot tile of a 2x2 device.
    pub fn crowded_tile(n: usize) -> Self {
        let mut bench = Self::open_grid(2, 2, n);
        bench.hint_all(TileLoc::new(0, 0, 0));
        bench
    }

    /// `n` unconnected LUTs on a `w`x`h` device of one-LUT, one-slot tiles,
    /// all hinted to the origin.
    pub fn open_grid(w: u32, h: u32, n: usize) -> Self {
        let device = LutDevice::new(1, 4, 8, 1);
        let grid = device.grid(w, h);
        let mut netlist = AtomNetlist::new();
        for i in 0..n {
            netlist.add_block(format!("l{i}"), device.lut);
        }
        let prepacked = Prepacked::singletons(&netlist);
        let mut bench = Self::assemble(device, grid, netlist, prepacked);
        bench.hint_all(TileLoc::new(0, 0, 0));
        bench
    }
}

fn primary_inputs(netlist: &mut AtomNetlist, atom: AtomBlockId, count: usize) {
    for i in 0..count {
        netlist.add_net(format!("pi_{atom}_{i}"), None, &[atom]);
    }
}

fn center_of(tile: TileLoc) -> FlatLoc {
    FlatLoc::new(tile.x as f32 + 0.5, tile.y as f32 + 0.5).on_layer(tile.layer as f32)
}

/// One cluster of the bench's first type per molecule, cluster `i` holding
/// molecule `i`, with the region `region(i)`.
pub(crate) fn cluster_each(
    bench: &Bench,
    region: impl Fn(u32) -> Option<PartitionRegion>,
) -> Clustering {
    let mut clustering = Clustering::default();
    for mol in bench.prepacked.molecules.ids() {
        clustering.push(FinalCluster {
            block_type: bench.types[0],
            mode: 0,
            molecules: vec![mol],
            region: region(mol.as_raw()),
            desired: None,
            origin: ClusterOrigin::Greedy,
        });
    }
    clustering
}

/// A [`CapacityOracle`] that remembers which clusters were cleaned and flags
/// strict checks run on a cluster after its `clean`.
pub(crate) struct CleanOrder<'a> {
    inner: CapacityOracle<'a>,
    cleaned: HashSet<ClusterId>,
    pub late_checks: Vec<ClusterId>,
}

impl<'a> CleanOrder<'a> {
    pub fn new(ctx: &LegalizeContext<'a>) -> Self {
        Self {
            inner: CapacityOracle::new(ctx),
            cleaned: HashSet::new(),
            late_checks: Vec::new(),
        }
    }

    pub fn was_cleaned(&self, cluster: ClusterId) -> bool {
        self.cleaned.contains(&cluster)
    }
}

impl LegalityOracle for CleanOrder<'_> {
    fn set_strategy(&mut self, strategy: LegalizationStrategy) {
        self.inner.set_strategy(strategy);
    }

    fn strategy(&self) -> LegalizationStrategy {
        self.inner.strategy()
    }

    fn start(
        &mut self,
        molecule: MoleculeId,
        block_type: LogicalTypeId,
        mode: usize,
    ) -> (PackStatus, Option<ClusterId>) {
        self.inner.start(molecule, block_type, mode)
    }

    fn add(&mut self, molecule: MoleculeId, cluster: ClusterId) -> PackStatus {
        self.inner.add(molecule, cluster)
    }

    fn is_compatible(&self, molecule: MoleculeId, cluster: ClusterId) -> bool {
        self.inner.is_compatible(molecule, cluster)
    }

    fn check_strict_legality(&mut self, cluster: ClusterId) -> bool {
        if self.cleaned.contains(&cluster) {
            self.late_checks.push(cluster);
        }
        self.inner.check_strict_legality(cluster)
    }

    fn clean(&mut self, cluster: ClusterId) {
        self.cleaned.insert(cluster);
        self.inner.clean(cluster);
    }

    fn destroy(&mut self, cluster: ClusterId) -> Vec<MoleculeId> {
        self.inner.destroy(cluster)
    }

    fn members(&self, cluster: ClusterId) -> &[MoleculeId] {
        self.inner.members(cluster)
    }

    fn block_type(&self, cluster: ClusterId) -> LogicalTypeId {
        self.inner.block_type(cluster)
    }

    fn mode(&self, cluster: ClusterId) -> usize {
        self.inner.mode(cluster)
    }

    fn has_remaining_capacity(&self, cluster: ClusterId) -> bool {
        self.inner.has_remaining_capacity(cluster)
    }

    fn molecule_cluster(&self, molecule: MoleculeId) -> Option<ClusterId> {
        self.inner.molecule_cluster(molecule)
    }

    fn inputs_available(&self, cluster: ClusterId) -> u32 {
        self.inner.inputs_available(cluster)
    }

    fn live_clusters(&self) -> Vec<ClusterId> {
        self.inner.live_clusters()
    }

    fn compress(&mut self) -> ClusterRemap {
        self.cleaned.clear();
        self.inner.compress()
    }
}
