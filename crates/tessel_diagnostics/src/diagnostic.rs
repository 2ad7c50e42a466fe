//! The diagnostic record.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// One message from the legalizer.
///
/// There is no source text to underline, so a diagnostic names the molecule,
/// cluster or tile it is about in [`subject`](Self::subject) instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// How serious it is.
    pub severity: Severity,
    /// Stable identifier, e.g. `E303`.
    pub code: DiagnosticCode,
    /// Headline.
    pub message: String,
    /// The entity this diagnostic is about, e.g. `cluster 4`.
    pub subject: Option<String>,
    /// Extra facts, one per line.
    pub notes: Vec<String>,
    /// Suggested fixes.
    pub help: Vec<String>,
}

impl Diagnostic {
    fn build(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            code,
            message: message.into(),
            subject: None,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// A fatal problem.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::build(Severity::Error, code, message)
    }

    /// A recovered anomaly.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::build(Severity::Warning, code, message)
    }

    /// Progress or statistics.
    pub fn note(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::build(Severity::Note, code, message)
    }

    /// Sets the entity this diagnostic is about.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Appends a note line.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Appends a help line.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}
