//! Configuration types deserialized from `tessel.toml`.

use serde::{Deserialize, Serialize};

/// The top-level legalizer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegalizerConfig {
    /// Flow selection.
    pub legalizer: LegalizerSection,
    /// Greedy seed-driven clustering knobs.
    pub clustering: ClusteringConfig,
    /// Location-aware reconstruction knobs.
    pub reconstruction: ReconstructionConfig,
}

/// The `[legalizer]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegalizerSection {
    /// Which full legalizer to run.
    pub strategy: LegalizerKind,
}

/// The full legalization flow to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalizerKind {
    /// Bin by hinted tile, pack each bin into one cluster, place in that tile.
    Naive,
    /// Seed-driven greedy clustering informed by the flat placement.
    Greedy,
    /// Tile-grouped reconstruction that preserves the hinted locations.
    #[default]
    MinDisturbance,
}

/// How the seed selector ranks unclustered molecules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedRanking {
    /// Descending count of used external inputs.
    #[default]
    MaxInputs,
    /// Descending atom count.
    Blocks,
    /// Descending count of used external pins (inputs and outputs).
    Pins,
}

/// Order in which the cheap and strict legality tiers are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierPolicy {
    /// Per cluster: grow cheap, check strict, regrow strict from the same seed on failure.
    #[default]
    Interleaved,
    /// Whole pass under the cheap tier, then a strict sweep over what remains.
    Sweeps,
}

/// The `[clustering]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Seed ranking statistic.
    pub seed_ranking: SeedRanking,
    /// Tier ordering for greedy clustering.
    pub tier_policy: TierPolicy,
    /// Whether unconnected filler molecules may be added to a cluster.
    pub allow_unrelated_clustering: bool,
    /// Maximum unrelated filler attempts per cluster.
    pub max_unrelated_attempts: usize,
    /// Start new clusters in the least utilized compatible block type.
    pub balance_block_type_utilization: bool,
    /// Repeat-candidate limit when attraction groups are present.
    pub attraction_repeat_limit: usize,
    /// Upper bound on the feasible-candidate list kept per cluster.
    pub feasible_candidate_limit: usize,
    /// Nets with more sinks than this are skipped when scoring connectivity.
    pub high_fanout_threshold: usize,
    /// Weight of connection gain against sharing gain, in `[0, 1]`.
    pub connection_beta: f32,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            seed_ranking: SeedRanking::MaxInputs,
            tier_policy: TierPolicy::Interleaved,
            allow_unrelated_clustering: true,
            max_unrelated_attempts: 1,
            balance_block_type_utilization: true,
            attraction_repeat_limit: 500,
            feasible_candidate_limit: 30,
            high_fanout_threshold: 64,
            connection_beta: 0.9,
        }
    }
}

/// The `[reconstruction]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    /// Maximum Manhattan radius probed for partner molecules.
    pub neighbor_radius: u32,
    /// Tier ordering for the neighbor passes.
    pub tier_policy: TierPolicy,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            neighbor_radius: 8,
            tier_policy: TierPolicy::Sweeps,
        }
    }
}
