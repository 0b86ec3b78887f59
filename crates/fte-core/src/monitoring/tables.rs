//! Pure sampling helpers for the monitoring tables (§4.4). Kept apart
//! from [`super::MonitoringEngine`]'s orchestration so each probability
//! table has one obvious place to read and tune.

use crate::config::{AccuracyDistribution, DcDiscoveryBand, MonitoringConfig};
use crate::rng::Rng;
use fte_types::{DcDiscovery, QualityTier};

/// `QualityTier::floor()` returns `i32::MIN` for Abysmal, which has no
/// natural per-point reference point (it's unbounded below, "r<=0"). 0
/// is a safe stand-in: every Abysmal roll is <=0, so the interpolation
/// below always clamps to its floor value regardless.
pub fn tier_floor_roll(tier: QualityTier) -> i32 {
    match tier {
        QualityTier::Abysmal => 0,
        other => other.floor(),
    }
}

/// §4.4.1: detection probability for a present faction at influence
/// `v`, linearly scaled within `tier` by the roll's distance from the
/// tier floor.
pub fn detection_probability(config: &MonitoringConfig, tier: QualityTier, roll: i32, v: u8) -> f64 {
    let base = config.detection_base.get(tier);
    let bonus = config.detection_influence_bonus.get(tier) * v as f64;
    let per_point = config.detection_per_point.get(tier);
    let steps = (roll - tier_floor_roll(tier)).max(0) as f64;
    (base + bonus + per_point * steps).clamp(0.0, 1.0)
}

/// §4.4.2: one sampled accuracy error, signed (positive = perceived
/// higher than real). Returns 0 for "exact".
pub fn sample_accuracy_error(dist: &AccuracyDistribution, tier: QualityTier, roll: i32, rng: &mut Rng) -> i32 {
    if rng.bool(dist.inversion_prob) {
        // "high-appears-low": the true value is reported as though it
        // were the mirrored low reading, i.e. a large negative error.
        return -3;
    }
    let steps = (roll - tier_floor_roll(tier)).max(0) as f64;
    let shift = dist.per_point_toward_exact * steps;
    let mut buckets = [dist.exact, dist.plus_minus_1, dist.plus_minus_2, dist.plus_minus_3];
    let mut remaining = shift;
    for widest in (1..=3).rev() {
        if remaining <= 0.0 {
            break;
        }
        let take = remaining.min(buckets[widest]);
        buckets[widest] -= take;
        buckets[0] += take;
        remaining -= take;
    }
    let magnitude = rng.choose(&buckets) as i32;
    apply_direction(magnitude, dist, rng)
}

fn apply_direction(magnitude: i32, dist: &AccuracyDistribution, rng: &mut Rng) -> i32 {
    if magnitude == 0 {
        return 0;
    }
    let under = rng.bool(dist.under_bias_prob);
    if under {
        -magnitude
    } else {
        magnitude
    }
}

/// §4.4.3: whether a phantom fires for this tier/roll, and if so how
/// many slots to fill.
pub fn sample_phantom_count(config: &MonitoringConfig, tier: QualityTier, roll: i32, rng: &mut Rng) -> u32 {
    let phantom = config.phantom.get(tier);
    let prob = phantom.base_rate.at(roll, tier_floor_roll(tier)).clamp(0.0, 1.0);
    if !rng.bool(prob) {
        return 0;
    }
    let idx = rng.choose(&config.phantom_count_weights);
    idx as u32 + 1
}

/// §4.4.3: samples one phantom perceived-influence value from the
/// tier-independent value-weight table (1..=5).
pub fn sample_phantom_value(config: &MonitoringConfig, rng: &mut Rng) -> u8 {
    rng.choose(&config.phantom_value_weights) as u8 + 1
}

/// §4.4.6: one DC-modifier discovery outcome for a given absolute
/// modifier magnitude (1 or 2; magnitude 0 is never hidden).
pub fn sample_dc_discovery(band: &DcDiscoveryBand, modifier: i8, rng: &mut Rng) -> DcDiscovery {
    let roll = rng.unit();
    if roll < band.exact_prob {
        return DcDiscovery::Exact { modifier };
    }
    if roll < band.exact_prob + band.direction_only_prob {
        let mut positive = modifier > 0;
        if rng.bool(band.direction_incorrect_prob) {
            positive = !positive;
        }
        return DcDiscovery::DirectionOnly { positive };
    }
    DcDiscovery::Nothing
}
