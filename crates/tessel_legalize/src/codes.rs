//! Diagnostic codes emitted by the legalizer.
//!
//! `E301`..`E306` mirror the variants of [`LegalizeError`](crate::LegalizeError)
//! and `E310`..`E318` individual verification failures. `W1xx` are recovered
//! input anomalies, `P0xx` clustering progress, `L0xx` placement progress and
//! `N0xx` run statistics.

use tessel_diagnostics::{Category, DiagnosticCode};

/// No candidate block type accepts a molecule.
pub const E301: DiagnosticCode = DiagnosticCode::new(Category::Error, 301);
/// Molecules left unclustered after every pass.
pub const E302: DiagnosticCode = DiagnosticCode::new(Category::Error, 302);
/// Relocation search exhausted its radius.
pub const E303: DiagnosticCode = DiagnosticCode::new(Category::Error, 303);
/// Exhaustive placement failed for some clusters.
pub const E304: DiagnosticCode = DiagnosticCode::new(Category::Error, 304);
/// A verification stage failed.
pub const E305: DiagnosticCode = DiagnosticCode::new(Category::Error, 305);
/// Prepacked molecules do not partition the netlist.
pub const E306: DiagnosticCode = DiagnosticCode::new(Category::Error, 306);

/// An atom is not in exactly one molecule.
pub const E310: DiagnosticCode = DiagnosticCode::new(Category::Error, 310);
/// A molecule is not in exactly one cluster.
pub const E311: DiagnosticCode = DiagnosticCode::new(Category::Error, 311);
/// A finalized cluster fails the strict legality check.
pub const E312: DiagnosticCode = DiagnosticCode::new(Category::Error, 312);
/// A cluster has no placement.
pub const E313: DiagnosticCode = DiagnosticCode::new(Category::Error, 313);
/// A cluster is placed off a root tile, off the device, or past the sub-tile capacity.
pub const E314: DiagnosticCode = DiagnosticCode::new(Category::Error, 314);
/// A cluster is placed on a tile type that does not accept its block type.
pub const E315: DiagnosticCode = DiagnosticCode::new(Category::Error, 315);
/// A cluster is placed outside its floorplan region.
pub const E316: DiagnosticCode = DiagnosticCode::new(Category::Error, 316);
/// Two clusters share a placement slot.
pub const E317: DiagnosticCode = DiagnosticCode::new(Category::Error, 317);
/// A macro member is not at its fixed offset from the macro head.
pub const E318: DiagnosticCode = DiagnosticCode::new(Category::Error, 318);

/// Internal invariant broken.
pub const E399: DiagnosticCode = DiagnosticCode::new(Category::Error, 399);

/// A placement hint was outside the device and was clamped.
pub const W101: DiagnosticCode = DiagnosticCode::new(Category::Warning, 101);
/// A molecule had no placement hint.
pub const W102: DiagnosticCode = DiagnosticCode::new(Category::Warning, 102);

/// Unclustered molecule count after a clustering pass.
pub const P001: DiagnosticCode = DiagnosticCode::new(Category::Pack, 1);
/// A cluster failed the strict tier and was regrown.
pub const P002: DiagnosticCode = DiagnosticCode::new(Category::Pack, 2);
/// Clustering summary.
pub const P003: DiagnosticCode = DiagnosticCode::new(Category::Pack, 3);

/// Clusters placed at their desired location.
pub const L001: DiagnosticCode = DiagnosticCode::new(Category::Place, 1);
/// Clusters moved by relocation or exhaustive search.
pub const L002: DiagnosticCode = DiagnosticCode::new(Category::Place, 2);

/// Per-pass elapsed time.
pub const N001: DiagnosticCode = DiagnosticCode::new(Category::Note, 1);
