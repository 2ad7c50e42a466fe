//! Cluster legalization for FPGA placement.
//!
//! Turns a prepacked atom netlist with upstream placement hints into legal
//! clusters bound to concrete device slots, disturbing the hints as little
//! as possible.
//!
//! # Pipeline
//!
//! 1. **Resolve hints**: snap every molecule's flat location to a tile
//!    ([`flat::FlatPlacement::resolve`])
//! 2. **Cluster**: group molecules into clusters through a
//!    [`LegalityOracle`], greedily or by per-tile reconstruction
//! 3. **Verify clustering**: every molecule in exactly one strict-legal cluster
//! 4. **Place**: bind clusters to their desired slots, relocating displaced
//!    ones along Manhattan rings, with an exhaustive scan as last resort
//! 5. **Verify placement**: no shared slots, compatible tiles, macro offsets
//!
//! # Usage
//!
//! ```ignore
//! use tessel_legalize::{legalize, LegalizeContext};
//!
//! let ctx = LegalizeContext::new(&arch, &grid, &netlist, &prepacked, &flat);
//! let design = legalize(&ctx, &config, &sink)?;
//! assert_eq!(design.placement.len(), design.clustering.len());
//! ```

#![warn(missing_docs)]

pub mod attraction;
pub mod cluster;
pub mod codes;
pub mod context;
pub mod error;
pub mod flat;
pub mod floorplan;
pub mod ids;
pub mod legalizer;
pub mod netlist;
pub mod oracle;
pub mod placement;
pub mod prepack;
pub mod verify;

#[cfg(test)]
mod testutil;

pub use attraction::AttractionGroups;
pub use cluster::{
    ClusterOrigin, Clustering, DesiredLocation, FinalCluster, GreedyClusterer,
    ReconstructionClusterer, SeedSelector,
};
pub use context::LegalizeContext;
pub use error::LegalizeError;
pub use flat::{FlatLoc, FlatPlacement, HintTable};
pub use floorplan::FloorplanConstraints;
pub use ids::{AtomBlockId, AtomNetId, AttractGroupId, ClusterId, MacroId, MoleculeId};
pub use legalizer::{
    make_legalizer, FullLegalizer, GreedyLegalizer, LegalizedDesign, LegalizerStats,
    MinDisturbanceLegalizer, NaiveLegalizer,
};
pub use netlist::AtomNetlist;
pub use oracle::{CapacityOracle, LegalityOracle, LegalizationStrategy, PackStatus};
pub use placement::{ClusterPlacer, ManhattanRing, PlacementTable, RelocationSearch};
pub use prepack::{PrepackBuilder, Prepacked};

use tessel_config::LegalizerConfig;
use tessel_diagnostics::DiagnosticSink;

/// Runs the flow selected by `config` with the built-in [`CapacityOracle`].
pub fn legalize(
    ctx: &LegalizeContext<'_>,
    config: &LegalizerConfig,
    sink: &DiagnosticSink,
) -> Result<LegalizedDesign, LegalizeError> {
    let mut oracle = CapacityOracle::new(ctx);
    legalize_with(ctx, config, &mut oracle, sink)
}

/// Runs the flow selected by `config` against a caller-supplied oracle.
///
/// A fatal error is also emitted to `sink` as a diagnostic before it is
/// returned.
pub fn legalize_with(
    ctx: &LegalizeContext<'_>,
    config: &LegalizerConfig,
    oracle: &mut dyn LegalityOracle,
    sink: &DiagnosticSink,
) -> Result<LegalizedDesign, LegalizeError> {
    let flow = make_legalizer(config);
    flow.legalize(ctx, oracle, sink).inspect_err(|e| {
        sink.emit(e.to_diagnostic());
    })
}
