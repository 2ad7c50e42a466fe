//! Broken-invariant errors.

/// A bookkeeping inconsistency inside the legalizer itself.
///
/// Bad input designs or architectures never produce this; they surface
/// through each crate's own error enum. Seeing one means a table such as a
/// cluster remap or a pass record fell out of sync.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal legalizer error: {message}")]
pub struct InternalError {
    /// What was found out of sync.
    pub message: String,
}

impl InternalError {
    /// Wraps a description of the broken invariant.
    pub fn new(message: impl Into<String>) -> Self {
        InternalError {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        InternalError::new(message)
    }
}

/// Result of an operation that only fails on a broken invariant.
pub type TesselResult<T> = Result<T, InternalError>;
