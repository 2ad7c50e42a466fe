//! Turning diagnostics into text.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::fmt::Write;

/// Formats one diagnostic.
pub trait DiagnosticRenderer {
    /// Formatted diagnostic, newline-terminated.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// rustc-flavoured plain text:
///
/// ```text
/// error[E303]: no legal location for cluster 12
///   --> cluster 12
///    = note: searched out to radius 40
/// ```
pub struct TerminalRenderer {
    /// Emit ANSI colors around the header.
    pub color: bool,
}

impl TerminalRenderer {
    /// Renderer with or without ANSI colors.
    pub fn new(color: bool) -> Self {
        TerminalRenderer { color }
    }

    fn ansi(severity: Severity) -> &'static str {
        match severity {
            Severity::Error => "\x1b[1;31m",
            Severity::Warning => "\x1b[1;33m",
            Severity::Note => "\x1b[1;36m",
            Severity::Help => "\x1b[1;32m",
        }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();
        let header = format!("{}[{}]", diag.severity, diag.code);
        // Writing into a String cannot fail.
        let _ = if self.color {
            writeln!(
                out,
                "{}{header}\x1b[0m: {}",
                Self::ansi(diag.severity),
                diag.message
            )
        } else {
            writeln!(out, "{header}: {}", diag.message)
        };
        if let Some(subject) = &diag.subject {
            let _ = writeln!(out, "  --> {subject}");
        }
        let footers = diag
            .notes
            .iter()
            .map(|n| ("note", n))
            .chain(diag.help.iter().map(|h| ("help", h)));
        for (kind, text) in footers {
            let _ = writeln!(out, "   = {kind}: {text}");
        }
        out
    }
}
