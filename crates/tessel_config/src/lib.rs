//! Parsing and validation of `tessel.toml` legalizer configuration files.
//!
//! Every section and field has a default, so an empty file (or no file at all,
//! via [`LegalizerConfig::default`]) yields the standard minimum-disturbance flow.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
