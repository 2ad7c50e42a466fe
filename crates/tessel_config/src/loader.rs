//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::LegalizerConfig;
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE_NAME: &str = "tessel.toml";

/// Loads and validates `tessel.toml` from a project directory.
pub fn load_config(project_dir: &Path) -> Result<LegalizerConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<LegalizerConfig, ConfigError> {
    let config: LegalizerConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &LegalizerConfig) -> Result<(), ConfigError> {
    if config.reconstruction.neighbor_radius == 0 {
        return Err(ConfigError::ValidationError(
            "reconstruction.neighbor_radius must be positive".to_string(),
        ));
    }
    let clustering = &config.clustering;
    if clustering.attraction_repeat_limit == 0 {
        return Err(ConfigError::ValidationError(
            "clustering.attraction_repeat_limit must be positive".to_string(),
        ));
    }
    if clustering.feasible_candidate_limit == 0 {
        return Err(ConfigError::ValidationError(
            "clustering.feasible_candidate_limit must be positive".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&clustering.connection_beta) {
        return Err(ConfigError::ValidationError(format!(
            "clustering.connection_beta must be within [0, 1], got {}",
            clustering.connection_beta
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LegalizerKind, SeedRanking, TierPolicy};

    #[test]
    fn empty_config_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, LegalizerConfig::default());
        assert_eq!(config.legalizer.strategy, LegalizerKind::MinDisturbance);
        assert_eq!(config.clustering.tier_policy, TierPolicy::Interleaved);
        assert_eq!(config.reconstruction.tier_policy, TierPolicy::Sweeps);
        assert_eq!(config.reconstruction.neighbor_radius, 8);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[legalizer]
strategy = "greedy"

[clustering]
seed_ranking = "pins"
tier_policy = "sweeps"
allow_unrelated_clustering = false
max_unrelated_attempts = 3
balance_block_type_utilization = false
attraction_repeat_limit = 20
feasible_candidate_limit = 5
high_fanout_threshold = 16
connection_beta = 0.5

[reconstruction]
neighbor_radius = 3
tier_policy = "interleaved"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.legalizer.strategy, LegalizerKind::Greedy);
        assert_eq!(config.clustering.seed_ranking, SeedRanking::Pins);
        assert_eq!(config.clustering.tier_policy, TierPolicy::Sweeps);
        assert!(!config.clustering.allow_unrelated_clustering);
        assert_eq!(config.clustering.max_unrelated_attempts, 3);
        assert_eq!(config.clustering.feasible_candidate_limit, 5);
        assert_eq!(config.clustering.connection_beta, 0.5);
        assert_eq!(config.reconstruction.neighbor_radius, 3);
        assert_eq!(config.reconstruction.tier_policy, TierPolicy::Interleaved);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = load_config_from_str("[clustering]\nmax_unrelated_attempts = 4\n").unwrap();
        assert_eq!(config.clustering.max_unrelated_attempts, 4);
        assert_eq!(config.clustering.attraction_repeat_limit, 500);
        assert!(config.clustering.allow_unrelated_clustering);
    }

    #[test]
    fn unknown_strategy_is_parse_error() {
        let err = load_config_from_str("[legalizer]\nstrategy = \"annealing\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn zero_radius_rejected() {
        let err = load_config_from_str("[reconstruction]\nneighbor_radius = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn zero_feasible_limit_rejected() {
        let err =
            load_config_from_str("[clustering]\nfeasible_candidate_limit = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn beta_out_of_range_rejected() {
        let err = load_config_from_str("[clustering]\nconnection_beta = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("connection_beta"));
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
