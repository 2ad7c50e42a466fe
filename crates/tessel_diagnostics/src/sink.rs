//! Shared collector that every legalization stage reports into.

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Log {
    entries: Vec<Diagnostic>,
    errors: usize,
}

/// Collects diagnostics from any thread.
///
/// Draining with [`take_all`](Self::take_all) empties the log but the error
/// tally keeps counting, so a driver can flush messages between passes and
/// still ask [`has_errors`](Self::has_errors) at the end.
#[derive(Default)]
pub struct DiagnosticSink {
    log: Mutex<Log>,
}

impl DiagnosticSink {
    /// An empty sink.
    pub fn new() -> Self {
        DiagnosticSink::default()
    }

    fn log(&self) -> MutexGuard<'_, Log> {
        // A reporter that panicked mid-push still left a valid log.
        self.log.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Records `diag`.
    pub fn emit(&self, diag: Diagnostic) {
        let mut log = self.log();
        if diag.severity == Severity::Error {
            log.errors += 1;
        }
        log.entries.push(diag);
    }

    /// Whether an error was ever emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Errors emitted since creation, drained or not.
    pub fn error_count(&self) -> usize {
        self.log().errors
    }

    /// Whether an undrained diagnostic carries `code`.
    pub fn contains_code(&self, code: DiagnosticCode) -> bool {
        self.log().entries.iter().any(|d| d.code == code)
    }

    /// Removes and returns everything recorded so far.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.log().entries)
    }

    /// Copy of the undrained diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.log().entries.clone()
    }
}
