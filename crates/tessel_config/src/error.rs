//! Failures while reading a `tessel.toml`.

/// Why a legalizer configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The contents are not valid TOML or do not match the schema.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A value parsed but is out of range, such as a zero neighbor radius.
    #[error("validation error: {0}")]
    ValidationError(String),
}
