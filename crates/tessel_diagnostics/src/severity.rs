//! How serious a diagnostic is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic seriousness. Later variants compare greater.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A hint attached to some other message.
    Help,
    /// Progress and run statistics.
    Note,
    /// The run recovered, e.g. a hint was clamped onto the grid.
    Warning,
    /// The legalized result cannot be used.
    Error,
}

impl Severity {
    /// Whether this is [`Severity::Error`].
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Lowercase label used by renderers.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Help => "help",
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worst_of_a_run_is_the_max() {
        let run = [Severity::Note, Severity::Warning, Severity::Help];
        assert_eq!(run.iter().max(), Some(&Severity::Warning));
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn only_errors_are_fatal() {
        assert!(Severity::Error.is_error());
        assert!(!Severity::Warning.is_error());
        assert_eq!(Severity::Note.to_string(), "note");
    }
}
