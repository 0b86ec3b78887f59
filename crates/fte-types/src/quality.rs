//! Monitoring roll quality tiers.

use serde::{Deserialize, Serialize};

/// The quality band a monitoring roll falls into. Drives which
/// detection/accuracy/phantom tables `MonitoringEngine` reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Abysmal,
    VeryPoor,
    Poor,
    Average,
    Good,
    VeryGood,
    Exceptional,
    Legendary,
}

impl QualityTier {
    /// Maps a roll (which may be negative or exceed 30) to its tier.
    pub fn from_roll(roll: i32) -> Self {
        match roll {
            r if r >= 30 => QualityTier::Legendary,
            25..=29 => QualityTier::Exceptional,
            20..=24 => QualityTier::VeryGood,
            15..=19 => QualityTier::Good,
            10..=14 => QualityTier::Average,
            5..=9 => QualityTier::Poor,
            1..=4 => QualityTier::VeryPoor,
            _ => QualityTier::Abysmal,
        }
    }

    /// The floor roll value for this tier, used for linear interpolation
    /// of tier-scaled probabilities.
    pub fn floor(self) -> i32 {
        match self {
            QualityTier::Abysmal => i32::MIN,
            QualityTier::VeryPoor => 1,
            QualityTier::Poor => 5,
            QualityTier::Average => 10,
            QualityTier::Good => 15,
            QualityTier::VeryGood => 20,
            QualityTier::Exceptional => 25,
            QualityTier::Legendary => 30,
        }
    }

    /// Base confidence score (10 down to 1) for this tier, per §4.4.7.
    pub fn base_confidence(self) -> u8 {
        match self {
            QualityTier::Legendary => 10,
            QualityTier::Exceptional => 9,
            QualityTier::VeryGood => 8,
            QualityTier::Good => 7,
            QualityTier::Average => 5,
            QualityTier::Poor => 3,
            QualityTier::VeryPoor => 2,
            QualityTier::Abysmal => 1,
        }
    }

    pub const ALL: [QualityTier; 8] = [
        QualityTier::Abysmal,
        QualityTier::VeryPoor,
        QualityTier::Poor,
        QualityTier::Average,
        QualityTier::Good,
        QualityTier::VeryGood,
        QualityTier::Exceptional,
        QualityTier::Legendary,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        assert_eq!(QualityTier::from_roll(30), QualityTier::Legendary);
        assert_eq!(QualityTier::from_roll(29), QualityTier::Exceptional);
        assert_eq!(QualityTier::from_roll(25), QualityTier::Exceptional);
        assert_eq!(QualityTier::from_roll(24), QualityTier::VeryGood);
        assert_eq!(QualityTier::from_roll(15), QualityTier::Good);
        assert_eq!(QualityTier::from_roll(10), QualityTier::Average);
        assert_eq!(QualityTier::from_roll(5), QualityTier::Poor);
        assert_eq!(QualityTier::from_roll(1), QualityTier::VeryPoor);
        assert_eq!(QualityTier::from_roll(0), QualityTier::Abysmal);
        assert_eq!(QualityTier::from_roll(-5), QualityTier::Abysmal);
        assert_eq!(QualityTier::from_roll(99), QualityTier::Legendary);
    }

    #[test]
    fn ordering_is_monotonic_in_roll() {
        assert!(QualityTier::from_roll(20) > QualityTier::from_roll(19));
        assert!(QualityTier::from_roll(14) < QualityTier::from_roll(15));
    }
}
