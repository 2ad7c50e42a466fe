//! Messages the legalizer reports while it runs.
//!
//! Stages push [`Diagnostic`]s tagged with a [`DiagnosticCode`] into one
//! [`DiagnosticSink`]; [`TerminalRenderer`] prints them.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
