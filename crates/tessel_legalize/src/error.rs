//! Fatal legalization errors.
//!
//! A strict-tier rejection of a cluster is not represented here: it is
//! recovered inside the clustering pass by destroying and regrowing the cluster.

use crate::codes;
use crate::ids::{ClusterId, MoleculeId};
use tessel_common::InternalError;
use tessel_diagnostics::Diagnostic;

/// Every condition that aborts a legalization run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LegalizeError {
    /// No candidate block type and mode accepts the molecule.
    #[error("no block type can hold molecule {molecule} (model '{model}')")]
    ArchitectureMismatch {
        /// The rejected molecule.
        molecule: MoleculeId,
        /// Model name of the molecule's root atom.
        model: String,
    },

    /// Molecules remained unclustered after every reconstruction pass.
    #[error("{count} molecule(s) could not be clustered")]
    Unclustered {
        /// Number of molecules left over.
        count: usize,
    },

    /// Relocation reached its maximum radius without finding a free site.
    #[error("no free site for cluster {cluster} within radius {radius}")]
    RelocationExhausted {
        /// The cluster that could not be placed.
        cluster: ClusterId,
        /// The radius reached.
        radius: u32,
    },

    /// Exhaustive placement could not place some clusters anywhere.
    #[error("{count} cluster(s) could not be placed anywhere on the device")]
    PlacementExhaustion {
        /// Number of unplaced clusters.
        count: usize,
    },

    /// Post-hoc verification of a stage found errors.
    #[error("{stage} verification failed with {errors} error(s)")]
    ConsistencyViolation {
        /// The verified stage (`clustering` or `placement`).
        stage: &'static str,
        /// Number of violations found.
        errors: usize,
    },

    /// The prepacked molecules do not partition the netlist.
    #[error("invalid prepacking: {0}")]
    InvalidPrepack(String),

    /// An internal invariant was broken.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl LegalizeError {
    /// Converts the error into the diagnostic emitted before it is returned.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            LegalizeError::ArchitectureMismatch { .. } => codes::E301,
            LegalizeError::Unclustered { .. } => codes::E302,
            LegalizeError::RelocationExhausted { .. } => codes::E303,
            LegalizeError::PlacementExhaustion { .. } => codes::E304,
            LegalizeError::ConsistencyViolation { .. } => codes::E305,
            LegalizeError::InvalidPrepack(_) => codes::E306,
            LegalizeError::Internal(_) => codes::E399,
        };
        let diag = Diagnostic::error(code, self.to_string());
        match self {
            LegalizeError::ArchitectureMismatch { molecule, .. } => diag
                .with_subject(format!("molecule {molecule}"))
                .with_help("the architecture has no block type whose modes hold this model"),
            LegalizeError::RelocationExhausted { cluster, .. } => {
                diag.with_subject(format!("cluster {cluster}"))
            }
            LegalizeError::Unclustered { .. } | LegalizeError::PlacementExhaustion { .. } => {
                diag.with_note("the device does not have enough compatible capacity")
            }
            _ => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_diagnostics::Severity;

    #[test]
    fn display_relocation_exhausted() {
        let err = LegalizeError::RelocationExhausted {
            cluster: ClusterId::from_raw(4),
            radius: 12,
        };
        assert_eq!(err.to_string(), "no free site for cluster 4 within radius 12");
    }

    #[test]
    fn mismatch_diagnostic_names_molecule() {
        let err = LegalizeError::ArchitectureMismatch {
            molecule: MoleculeId::from_raw(2),
            model: "bram".to_string(),
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.code, codes::E301);
        assert_eq!(diag.subject.as_deref(), Some("molecule 2"));
    }

    #[test]
    fn internal_is_transparent() {
        let err: LegalizeError = InternalError::new("bad remap").into();
        assert_eq!(err.to_string(), "internal legalizer error: bad remap");
    }
}
