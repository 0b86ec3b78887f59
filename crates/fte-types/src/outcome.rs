//! Action outcome tiers.

use serde::{Deserialize, Serialize};

/// The outcome band a post-penalty roll falls into relative to a DC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeTier {
    CritFail,
    Fail,
    Success,
    CritSuccess,
}

impl OutcomeTier {
    /// Classifies `roll` against `dc` per §4.5:
    /// CritFail: roll <= dc-10; Fail: dc-10 < roll < dc;
    /// Success: dc <= roll < dc+10; CritSuccess: roll >= dc+10.
    pub fn from_roll_and_dc(roll: i32, dc: i32) -> Self {
        if roll <= dc - 10 {
            OutcomeTier::CritFail
        } else if roll < dc {
            OutcomeTier::Fail
        } else if roll < dc + 10 {
            OutcomeTier::Success
        } else {
            OutcomeTier::CritSuccess
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, OutcomeTier::Success | OutcomeTier::CritSuccess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        let dc = 11;
        assert_eq!(OutcomeTier::from_roll_and_dc(1, dc), OutcomeTier::CritFail);
        assert_eq!(OutcomeTier::from_roll_and_dc(2, dc), OutcomeTier::Fail);
        assert_eq!(OutcomeTier::from_roll_and_dc(10, dc), OutcomeTier::Fail);
        assert_eq!(OutcomeTier::from_roll_and_dc(11, dc), OutcomeTier::Success);
        assert_eq!(OutcomeTier::from_roll_and_dc(20, dc), OutcomeTier::Success);
        assert_eq!(OutcomeTier::from_roll_and_dc(21, dc), OutcomeTier::CritSuccess);
    }

    #[test]
    fn monotonic_in_roll() {
        let dc = 15;
        let mut prev = OutcomeTier::CritFail;
        for roll in (-5..40).step_by(1) {
            let tier = OutcomeTier::from_roll_and_dc(roll, dc);
            assert!(tier >= prev, "tier regressed at roll {}", roll);
            prev = tier;
        }
    }
}
