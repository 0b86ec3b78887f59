//! Tuning configuration
//!
//! Loads every probability and table named in the turn-resolution spec
//! from `tuning.toml` for adjustment without recompiling. `EngineConfig::default()`
//! reproduces the spec's own literal numbers exactly, so a driver built
//! with no config file still behaves per specification.

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default tuning file path.
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Top-level configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub decay: DecayConfig,
    pub action: ActionConfig,
    pub penalty: PenaltyConfig,
    pub conflict: ConflictConfig,
    pub monitoring: MonitoringConfig,
}

/// §4.3 decay thresholds and rates.
#[derive(Debug, Clone, Deserialize)]
pub struct DecayConfig {
    pub stronghold_threshold: u8,
    pub base_threshold: u8,
    pub per_point_loss_prob: f64,
    pub saturation_9_prob: f64,
    pub saturation_10_prob: f64,
}

/// §4.5 DC and outcome-table configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionConfig {
    pub base_dc: i32,
    /// Influence-band DC modifier, indexed 0..=9 by current influence.
    pub influence_band_modifier: [i32; 10],
    pub stronghold_dc_delta: i32,
    pub take_dc_delta: i32,
    /// Relationship (-2..=2, offset by 2) modifier for take DC.
    pub take_relationship_modifier: [i32; 5],
    pub gain_crit_success_double_prob: f64,
    pub gain_crit_fail_loss_prob: f64,
    pub take_success_apply_prob: f64,
    pub take_crit_success_double_both_prob: f64,
    pub take_crit_success_double_self_only_prob: f64,
    pub take_crit_fail_self_loss_prob: f64,
    pub take_crit_fail_target_gain_prob: f64,
    pub initiate_conflict_success_trigger_prob: f64,
    pub initiate_conflict_crit_success_trigger_prob: f64,
}

/// §4.6 penalty tracker magnitudes and squadron slot table.
#[derive(Debug, Clone, Deserialize)]
pub struct PenaltyConfig {
    pub agent_penalty_hostile: i32,
    pub agent_penalty_unfriendly: i32,
    pub squadron_penalty_hostile: i32,
    pub squadron_penalty_unfriendly: i32,
    /// Indexed by mobility 0..=5: (same-district slots, adjacent slots, either slots).
    pub mobility_slots: [(u8, u8, u8); 6],
}

/// §4.7 conflict detection Bernoulli rates.
#[derive(Debug, Clone, Deserialize)]
pub struct ConflictConfig {
    pub relationship_unfriendly_prob: f64,
    pub relationship_hostile_prob: f64,
    pub adjacent_join_prob_per_mobility: f64,
}

/// A table value keyed by the eight quality tiers.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TierTable<T> {
    pub legendary: T,
    pub exceptional: T,
    pub very_good: T,
    pub good: T,
    pub average: T,
    pub poor: T,
    pub very_poor: T,
    pub abysmal: T,
}

impl<T: Copy> TierTable<T> {
    pub fn get(&self, tier: fte_types::QualityTier) -> T {
        use fte_types::QualityTier::*;
        match tier {
            Legendary => self.legendary,
            Exceptional => self.exceptional,
            VeryGood => self.very_good,
            Good => self.good,
            Average => self.average,
            Poor => self.poor,
            VeryPoor => self.very_poor,
            Abysmal => self.abysmal,
        }
    }
}

/// Floor value plus a linear per-point-of-roll adjustment within the
/// tier, as used throughout §4.4.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LinearTierValue {
    pub floor: f64,
    pub per_point: f64,
}

impl LinearTierValue {
    pub fn at(&self, roll: i32, tier_floor_roll: i32) -> f64 {
        let steps = (roll - tier_floor_roll).max(0) as f64;
        self.floor + steps * self.per_point
    }
}

/// §4.4.2 accuracy magnitude distribution, normalized so the probability
/// mass shifts from the widest error bucket toward "exact" as the roll
/// rises within a tier.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AccuracyDistribution {
    pub exact: f64,
    pub plus_minus_1: f64,
    pub plus_minus_2: f64,
    pub plus_minus_3: f64,
    /// Added to `exact` (and subtracted from the widest nonzero bucket)
    /// per point of roll above the tier floor.
    pub per_point_toward_exact: f64,
    /// Probability the error direction is biased low rather than
    /// symmetric (Poor/VeryPoor/Abysmal per §4.4.2).
    pub under_bias_prob: f64,
    /// Probability the "high-appears-low" inversion fires before
    /// magnitude sampling.
    pub inversion_prob: f64,
}

/// §4.4.3 phantom pass configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PhantomConfig {
    pub base_rate: LinearTierValue,
    pub adjacency_bonus: f64,
}

/// §4.4.5 stronghold perception configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StrongholdConfig {
    pub correct_id_prob: LinearTierValue,
    pub false_stronghold_prob: f64,
}

/// §4.4.6 DC-modifier discovery configuration for one modifier magnitude.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DcDiscoveryBand {
    pub exact_prob: f64,
    pub direction_only_prob: f64,
    pub direction_incorrect_prob: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DcDiscoveryConfig {
    pub magnitude_1: DcDiscoveryBand,
    pub magnitude_2: DcDiscoveryBand,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub detection_base: TierTable<f64>,
    pub detection_influence_bonus: TierTable<f64>,
    pub detection_per_point: TierTable<f64>,
    pub accuracy: TierTable<AccuracyDistribution>,
    pub phantom: TierTable<PhantomConfig>,
    pub phantom_count_weights: [f64; 3],
    pub phantom_value_weights: [f64; 5],
    pub stronghold: TierTable<StrongholdConfig>,
    pub dc_discovery: TierTable<DcDiscoveryConfig>,
}

/// Configuration error type.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

fn check_prob(name: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ParseError(format!(
            "{} must be a probability in [0,1], got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_dc(name: &str, value: i32) -> Result<(), ConfigError> {
    if !(5..=30).contains(&value) {
        return Err(ConfigError::ParseError(format!(
            "{} must be a DC in [5,30], got {}",
            name, value
        )));
    }
    Ok(())
}

impl DecayConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_prob("decay.per_point_loss_prob", self.per_point_loss_prob)?;
        check_prob("decay.saturation_9_prob", self.saturation_9_prob)?;
        check_prob("decay.saturation_10_prob", self.saturation_10_prob)
    }
}

impl ActionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_dc("action.base_dc", self.base_dc)?;
        check_prob("action.gain_crit_success_double_prob", self.gain_crit_success_double_prob)?;
        check_prob("action.gain_crit_fail_loss_prob", self.gain_crit_fail_loss_prob)?;
        check_prob("action.take_success_apply_prob", self.take_success_apply_prob)?;
        check_prob(
            "action.take_crit_success_double_both_prob",
            self.take_crit_success_double_both_prob,
        )?;
        check_prob(
            "action.take_crit_success_double_self_only_prob",
            self.take_crit_success_double_self_only_prob,
        )?;
        check_prob("action.take_crit_fail_self_loss_prob", self.take_crit_fail_self_loss_prob)?;
        check_prob("action.take_crit_fail_target_gain_prob", self.take_crit_fail_target_gain_prob)?;
        check_prob(
            "action.initiate_conflict_success_trigger_prob",
            self.initiate_conflict_success_trigger_prob,
        )?;
        check_prob(
            "action.initiate_conflict_crit_success_trigger_prob",
            self.initiate_conflict_crit_success_trigger_prob,
        )
    }
}

impl ConflictConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_prob("conflict.relationship_unfriendly_prob", self.relationship_unfriendly_prob)?;
        check_prob("conflict.relationship_hostile_prob", self.relationship_hostile_prob)?;
        check_prob(
            "conflict.adjacent_join_prob_per_mobility",
            self.adjacent_join_prob_per_mobility,
        )
    }
}

impl TierTable<f64> {
    fn validate(&self, label: &str) -> Result<(), ConfigError> {
        for (tier, value) in [
            ("legendary", self.legendary),
            ("exceptional", self.exceptional),
            ("very_good", self.very_good),
            ("good", self.good),
            ("average", self.average),
            ("poor", self.poor),
            ("very_poor", self.very_poor),
            ("abysmal", self.abysmal),
        ] {
            check_prob(&format!("{}.{}", label, tier), value)?;
        }
        Ok(())
    }
}

impl AccuracyDistribution {
    fn validate(&self, label: &str) -> Result<(), ConfigError> {
        check_prob(&format!("{}.exact", label), self.exact)?;
        check_prob(&format!("{}.plus_minus_1", label), self.plus_minus_1)?;
        check_prob(&format!("{}.plus_minus_2", label), self.plus_minus_2)?;
        check_prob(&format!("{}.plus_minus_3", label), self.plus_minus_3)?;
        check_prob(&format!("{}.under_bias_prob", label), self.under_bias_prob)?;
        check_prob(&format!("{}.inversion_prob", label), self.inversion_prob)
    }
}

impl StrongholdConfig {
    fn validate(&self, label: &str) -> Result<(), ConfigError> {
        check_prob(&format!("{}.false_stronghold_prob", label), self.false_stronghold_prob)
    }
}

impl DcDiscoveryBand {
    fn validate(&self, label: &str) -> Result<(), ConfigError> {
        check_prob(&format!("{}.exact_prob", label), self.exact_prob)?;
        check_prob(&format!("{}.direction_only_prob", label), self.direction_only_prob)?;
        check_prob(&format!("{}.direction_incorrect_prob", label), self.direction_incorrect_prob)
    }
}

impl MonitoringConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.detection_base.validate("monitoring.detection_base")?;
        self.detection_influence_bonus.validate("monitoring.detection_influence_bonus")?;
        self.detection_per_point.validate("monitoring.detection_per_point")?;
        for weight in self.phantom_count_weights {
            check_prob("monitoring.phantom_count_weights", weight)?;
        }
        for weight in self.phantom_value_weights {
            check_prob("monitoring.phantom_value_weights", weight)?;
        }
        for (label, accuracy) in [
            ("monitoring.accuracy.legendary", self.accuracy.legendary),
            ("monitoring.accuracy.exceptional", self.accuracy.exceptional),
            ("monitoring.accuracy.very_good", self.accuracy.very_good),
            ("monitoring.accuracy.good", self.accuracy.good),
            ("monitoring.accuracy.average", self.accuracy.average),
            ("monitoring.accuracy.poor", self.accuracy.poor),
            ("monitoring.accuracy.very_poor", self.accuracy.very_poor),
            ("monitoring.accuracy.abysmal", self.accuracy.abysmal),
        ] {
            accuracy.validate(label)?;
        }
        for (label, stronghold) in [
            ("monitoring.stronghold.legendary", self.stronghold.legendary),
            ("monitoring.stronghold.exceptional", self.stronghold.exceptional),
            ("monitoring.stronghold.very_good", self.stronghold.very_good),
            ("monitoring.stronghold.good", self.stronghold.good),
            ("monitoring.stronghold.average", self.stronghold.average),
            ("monitoring.stronghold.poor", self.stronghold.poor),
            ("monitoring.stronghold.very_poor", self.stronghold.very_poor),
            ("monitoring.stronghold.abysmal", self.stronghold.abysmal),
        ] {
            stronghold.validate(label)?;
        }
        for (label, dc) in [
            ("monitoring.dc_discovery.legendary", self.dc_discovery.legendary),
            ("monitoring.dc_discovery.exceptional", self.dc_discovery.exceptional),
            ("monitoring.dc_discovery.very_good", self.dc_discovery.very_good),
            ("monitoring.dc_discovery.good", self.dc_discovery.good),
            ("monitoring.dc_discovery.average", self.dc_discovery.average),
            ("monitoring.dc_discovery.poor", self.dc_discovery.poor),
            ("monitoring.dc_discovery.very_poor", self.dc_discovery.very_poor),
            ("monitoring.dc_discovery.abysmal", self.dc_discovery.abysmal),
        ] {
            dc.magnitude_1.validate(&format!("{}.magnitude_1", label))?;
            dc.magnitude_2.validate(&format!("{}.magnitude_2", label))?;
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Range-checks every probability against `[0,1]` and every literal
    /// DC against `[5,30]`, the bounds spec.md fixes for these tables.
    fn validate(&self) -> Result<(), ConfigError> {
        self.decay.validate()?;
        self.action.validate()?;
        self.conflict.validate()?;
        self.monitoring.validate()
    }

    /// Load configuration from a TOML file, range-checked against the
    /// spec's bounds.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: EngineConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default path, or use the spec's
    /// literal defaults if no file is present.
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_TUNING_PATH).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load tuning.toml, using defaults");
            Self::default()
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decay: DecayConfig {
                stronghold_threshold: 5,
                base_threshold: 2,
                per_point_loss_prob: 0.05,
                saturation_9_prob: 0.10,
                saturation_10_prob: 0.35,
            },
            action: ActionConfig {
                base_dc: 11,
                influence_band_modifier: [3, 1, -1, -1, 0, 0, 1, 2, 3, 4],
                stronghold_dc_delta: -2,
                take_dc_delta: 3,
                take_relationship_modifier: [-2, -1, 0, 1, 2],
                gain_crit_success_double_prob: 0.80,
                gain_crit_fail_loss_prob: 0.50,
                take_success_apply_prob: 0.80,
                take_crit_success_double_both_prob: 0.40,
                take_crit_success_double_self_only_prob: 0.40,
                take_crit_fail_self_loss_prob: 0.40,
                take_crit_fail_target_gain_prob: 0.50,
                initiate_conflict_success_trigger_prob: 0.70,
                initiate_conflict_crit_success_trigger_prob: 0.95,
            },
            penalty: PenaltyConfig {
                agent_penalty_hostile: -4,
                agent_penalty_unfriendly: -2,
                squadron_penalty_hostile: -2,
                squadron_penalty_unfriendly: -1,
                mobility_slots: [
                    (0, 0, 0),
                    (1, 0, 0),
                    (0, 0, 1),
                    (1, 1, 0),
                    (0, 0, 2),
                    (1, 0, 2),
                ],
            },
            conflict: ConflictConfig {
                relationship_unfriendly_prob: 0.10,
                relationship_hostile_prob: 0.40,
                adjacent_join_prob_per_mobility: 0.10,
            },
            monitoring: MonitoringConfig {
                detection_base: TierTable {
                    legendary: 0.95,
                    exceptional: 0.90,
                    very_good: 0.82,
                    good: 0.73,
                    average: 0.55,
                    poor: 0.35,
                    very_poor: 0.15,
                    abysmal: 0.05,
                },
                detection_influence_bonus: TierTable {
                    legendary: 0.010,
                    exceptional: 0.012,
                    very_good: 0.015,
                    good: 0.020,
                    average: 0.025,
                    poor: 0.030,
                    very_poor: 0.030,
                    abysmal: 0.020,
                },
                detection_per_point: TierTable {
                    legendary: 0.005,
                    exceptional: 0.010,
                    very_good: 0.015,
                    good: 0.020,
                    average: 0.025,
                    poor: 0.030,
                    very_poor: 0.030,
                    abysmal: 0.010,
                },
                accuracy: TierTable {
                    legendary: AccuracyDistribution {
                        exact: 0.85,
                        plus_minus_1: 0.15,
                        plus_minus_2: 0.0,
                        plus_minus_3: 0.0,
                        per_point_toward_exact: 0.005,
                        under_bias_prob: 0.5,
                        inversion_prob: 0.0,
                    },
                    exceptional: AccuracyDistribution {
                        exact: 0.70,
                        plus_minus_1: 0.25,
                        plus_minus_2: 0.05,
                        plus_minus_3: 0.0,
                        per_point_toward_exact: 0.01,
                        under_bias_prob: 0.5,
                        inversion_prob: 0.0,
                    },
                    very_good: AccuracyDistribution {
                        exact: 0.60,
                        plus_minus_1: 0.30,
                        plus_minus_2: 0.10,
                        plus_minus_3: 0.0,
                        per_point_toward_exact: 0.01,
                        under_bias_prob: 0.5,
                        inversion_prob: 0.0,
                    },
                    good: AccuracyDistribution {
                        exact: 0.45,
                        plus_minus_1: 0.45,
                        plus_minus_2: 0.10,
                        plus_minus_3: 0.0,
                        per_point_toward_exact: 0.01,
                        under_bias_prob: 0.5,
                        inversion_prob: 0.0,
                    },
                    average: AccuracyDistribution {
                        exact: 0.30,
                        plus_minus_1: 0.40,
                        plus_minus_2: 0.20,
                        plus_minus_3: 0.10,
                        per_point_toward_exact: 0.015,
                        under_bias_prob: 0.5,
                        inversion_prob: 0.0,
                    },
                    poor: AccuracyDistribution {
                        exact: 0.15,
                        plus_minus_1: 0.30,
                        plus_minus_2: 0.30,
                        plus_minus_3: 0.25,
                        per_point_toward_exact: 0.01,
                        under_bias_prob: 0.65,
                        inversion_prob: 0.15,
                    },
                    very_poor: AccuracyDistribution {
                        exact: 0.05,
                        plus_minus_1: 0.20,
                        plus_minus_2: 0.35,
                        plus_minus_3: 0.40,
                        per_point_toward_exact: 0.01,
                        under_bias_prob: 0.75,
                        inversion_prob: 0.30,
                    },
                    abysmal: AccuracyDistribution {
                        exact: 0.0,
                        plus_minus_1: 0.10,
                        plus_minus_2: 0.30,
                        plus_minus_3: 0.60,
                        per_point_toward_exact: 0.0,
                        under_bias_prob: 0.85,
                        inversion_prob: 0.50,
                    },
                },
                phantom: TierTable {
                    legendary: PhantomConfig {
                        base_rate: LinearTierValue {
                            floor: 0.02,
                            per_point: -0.001,
                        },
                        adjacency_bonus: 0.0,
                    },
                    exceptional: PhantomConfig {
                        base_rate: LinearTierValue {
                            floor: 0.04,
                            per_point: -0.002,
                        },
                        adjacency_bonus: 0.0,
                    },
                    very_good: PhantomConfig {
                        base_rate: LinearTierValue {
                            floor: 0.08,
                            per_point: -0.004,
                        },
                        adjacency_bonus: 1.0,
                    },
                    good: PhantomConfig {
                        base_rate: LinearTierValue {
                            floor: 0.12,
                            per_point: -0.006,
                        },
                        adjacency_bonus: 3.0,
                    },
                    average: PhantomConfig {
                        base_rate: LinearTierValue {
                            floor: 0.18,
                            per_point: -0.008,
                        },
                        adjacency_bonus: 2.0,
                    },
                    poor: PhantomConfig {
                        base_rate: LinearTierValue {
                            floor: 0.25,
                            per_point: -0.01,
                        },
                        adjacency_bonus: 1.5,
                    },
                    very_poor: PhantomConfig {
                        base_rate: LinearTierValue {
                            floor: 0.32,
                            per_point: -0.01,
                        },
                        adjacency_bonus: 1.1,
                    },
                    abysmal: PhantomConfig {
                        base_rate: LinearTierValue {
                            floor: 0.40,
                            per_point: 0.0,
                        },
                        adjacency_bonus: 0.0,
                    },
                },
                phantom_count_weights: [0.70, 0.25, 0.05],
                phantom_value_weights: [0.45, 0.30, 0.15, 0.07, 0.03],
                stronghold: TierTable {
                    legendary: StrongholdConfig {
                        correct_id_prob: LinearTierValue {
                            floor: 0.98,
                            per_point: 0.001,
                        },
                        false_stronghold_prob: 0.05,
                    },
                    exceptional: StrongholdConfig {
                        correct_id_prob: LinearTierValue {
                            floor: 0.92,
                            per_point: 0.002,
                        },
                        false_stronghold_prob: 0.08,
                    },
                    very_good: StrongholdConfig {
                        correct_id_prob: LinearTierValue {
                            floor: 0.85,
                            per_point: 0.003,
                        },
                        false_stronghold_prob: 0.12,
                    },
                    good: StrongholdConfig {
                        correct_id_prob: LinearTierValue {
                            floor: 0.75,
                            per_point: 0.004,
                        },
                        false_stronghold_prob: 0.18,
                    },
                    average: StrongholdConfig {
                        correct_id_prob: LinearTierValue {
                            floor: 0.60,
                            per_point: 0.005,
                        },
                        false_stronghold_prob: 0.25,
                    },
                    poor: StrongholdConfig {
                        correct_id_prob: LinearTierValue {
                            floor: 0.40,
                            per_point: 0.006,
                        },
                        false_stronghold_prob: 0.35,
                    },
                    very_poor: StrongholdConfig {
                        correct_id_prob: LinearTierValue {
                            floor: 0.25,
                            per_point: 0.006,
                        },
                        false_stronghold_prob: 0.45,
                    },
                    abysmal: StrongholdConfig {
                        correct_id_prob: LinearTierValue {
                            floor: 0.10,
                            per_point: 0.0,
                        },
                        false_stronghold_prob: 0.55,
                    },
                },
                dc_discovery: TierTable {
                    legendary: DcDiscoveryConfig {
                        magnitude_1: DcDiscoveryBand {
                            exact_prob: 0.80,
                            direction_only_prob: 0.15,
                            direction_incorrect_prob: 0.02,
                        },
                        magnitude_2: DcDiscoveryBand {
                            exact_prob: 0.95,
                            direction_only_prob: 0.05,
                            direction_incorrect_prob: 0.02,
                        },
                    },
                    exceptional: DcDiscoveryConfig {
                        magnitude_1: DcDiscoveryBand {
                            exact_prob: 0.65,
                            direction_only_prob: 0.25,
                            direction_incorrect_prob: 0.05,
                        },
                        magnitude_2: DcDiscoveryBand {
                            exact_prob: 0.85,
                            direction_only_prob: 0.12,
                            direction_incorrect_prob: 0.05,
                        },
                    },
                    very_good: DcDiscoveryConfig {
                        magnitude_1: DcDiscoveryBand {
                            exact_prob: 0.50,
                            direction_only_prob: 0.30,
                            direction_incorrect_prob: 0.10,
                        },
                        magnitude_2: DcDiscoveryBand {
                            exact_prob: 0.70,
                            direction_only_prob: 0.22,
                            direction_incorrect_prob: 0.10,
                        },
                    },
                    good: DcDiscoveryConfig {
                        magnitude_1: DcDiscoveryBand {
                            exact_prob: 0.35,
                            direction_only_prob: 0.35,
                            direction_incorrect_prob: 0.15,
                        },
                        magnitude_2: DcDiscoveryBand {
                            exact_prob: 0.55,
                            direction_only_prob: 0.30,
                            direction_incorrect_prob: 0.15,
                        },
                    },
                    average: DcDiscoveryConfig {
                        magnitude_1: DcDiscoveryBand {
                            exact_prob: 0.20,
                            direction_only_prob: 0.35,
                            direction_incorrect_prob: 0.25,
                        },
                        magnitude_2: DcDiscoveryBand {
                            exact_prob: 0.35,
                            direction_only_prob: 0.35,
                            direction_incorrect_prob: 0.25,
                        },
                    },
                    poor: DcDiscoveryConfig {
                        magnitude_1: DcDiscoveryBand {
                            exact_prob: 0.08,
                            direction_only_prob: 0.30,
                            direction_incorrect_prob: 0.35,
                        },
                        magnitude_2: DcDiscoveryBand {
                            exact_prob: 0.15,
                            direction_only_prob: 0.35,
                            direction_incorrect_prob: 0.35,
                        },
                    },
                    very_poor: DcDiscoveryConfig {
                        magnitude_1: DcDiscoveryBand {
                            exact_prob: 0.02,
                            direction_only_prob: 0.20,
                            direction_incorrect_prob: 0.45,
                        },
                        magnitude_2: DcDiscoveryBand {
                            exact_prob: 0.05,
                            direction_only_prob: 0.30,
                            direction_incorrect_prob: 0.45,
                        },
                    },
                    abysmal: DcDiscoveryConfig {
                        magnitude_1: DcDiscoveryBand {
                            exact_prob: 0.0,
                            direction_only_prob: 0.10,
                            direction_incorrect_prob: 0.50,
                        },
                        magnitude_2: DcDiscoveryBand {
                            exact_prob: 0.0,
                            direction_only_prob: 0.20,
                            direction_incorrect_prob: 0.50,
                        },
                    },
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_literals() {
        let config = EngineConfig::default();
        assert_eq!(config.decay.stronghold_threshold, 5);
        assert_eq!(config.decay.base_threshold, 2);
        assert_eq!(config.action.base_dc, 11);
        assert_eq!(config.action.influence_band_modifier[0], 3);
        assert_eq!(config.action.take_dc_delta, 3);
        assert_eq!(config.penalty.mobility_slots[3], (1, 1, 0));
    }

    #[test]
    fn good_tier_detection_matches_worked_example() {
        // §8 S5: roll 17, influence 1, Good tier => 0.75 + 2*0.02 = 0.79
        let config = EngineConfig::default();
        let base = config.monitoring.detection_base.good;
        let bonus = config.monitoring.detection_influence_bonus.good;
        let per_point = config.monitoring.detection_per_point.good;
        let floor_prob = base + bonus * 1.0;
        let prob = floor_prob + per_point * (17 - 15) as f64;
        assert!((prob - 0.79).abs() < 1e-9);
    }

    #[test]
    fn default_config_passes_validation() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_probability() {
        let mut config = EngineConfig::default();
        config.decay.per_point_loss_prob = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_dc() {
        let mut config = EngineConfig::default();
        config.action.base_dc = 3;
        assert!(matches!(config.validate(), Err(ConfigError::ParseError(_))));
    }
}
