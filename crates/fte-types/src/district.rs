//! Districts: the locations whose influence pools factions contest.

use crate::ids::{DistrictId, FactionId, RumorId};
use crate::piece::{Aptitude, Attribute, Skill};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Which attribute/skill (for agents) or aptitude (for squadrons) backs a
/// district's preferred check for monitoring or for influence actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferredAction {
    pub attribute: Attribute,
    pub skill: Skill,
    pub aptitude: Aptitude,
}

impl PreferredAction {
    pub fn new(attribute: Attribute, skill: Skill, aptitude: Aptitude) -> Self {
        Self {
            attribute,
            skill,
            aptitude,
        }
    }
}

/// A rumor available for discovery in a district.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rumor {
    pub id: RumorId,
    pub dc: u32,
    pub newspaper_weight: u32,
}

impl Rumor {
    pub fn new(id: RumorId, dc: u32, newspaper_weight: u32) -> Self {
        Self {
            id,
            dc,
            newspaper_weight,
        }
    }
}

/// A location with its own influence pool, attributes, adjacency, and rumors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub id: DistrictId,
    pub commerce: u8,
    pub muster: u8,
    pub aristocratic: u8,
    pub adjacent: BTreeSet<DistrictId>,
    pub influence: BTreeMap<FactionId, u8>,
    pub likeability: BTreeMap<FactionId, i8>,
    pub stronghold: BTreeSet<FactionId>,
    pub weekly_dc_modifier: i8,
    pub rumors: Vec<Rumor>,
    pub monitoring: PreferredAction,
    pub influence_action: PreferredAction,
}

impl District {
    pub fn new(
        id: DistrictId,
        commerce: u8,
        muster: u8,
        aristocratic: u8,
        monitoring: PreferredAction,
        influence_action: PreferredAction,
    ) -> Self {
        Self {
            id,
            commerce,
            muster,
            aristocratic,
            adjacent: BTreeSet::new(),
            influence: BTreeMap::new(),
            likeability: BTreeMap::new(),
            stronghold: BTreeSet::new(),
            weekly_dc_modifier: 0,
            rumors: Vec::new(),
            monitoring,
            influence_action,
        }
    }

    pub fn with_adjacent(mut self, adjacent: impl IntoIterator<Item = DistrictId>) -> Self {
        self.adjacent.extend(adjacent);
        self
    }

    /// Sum of all faction influence values in this district.
    pub fn total_influence(&self) -> u32 {
        self.influence.values().map(|&v| v as u32).sum()
    }

    /// The uncommitted pool: 10 minus the sum of all faction influences.
    pub fn pool(&self) -> u32 {
        10u32.saturating_sub(self.total_influence())
    }

    pub fn influence_of(&self, faction: FactionId) -> u8 {
        self.influence.get(&faction).copied().unwrap_or(0)
    }

    pub fn likeability_of(&self, faction: FactionId) -> i8 {
        self.likeability.get(&faction).copied().unwrap_or(0)
    }

    pub fn has_stronghold(&self, faction: FactionId) -> bool {
        self.stronghold.contains(&faction)
    }

    pub fn is_adjacent_to(&self, other: DistrictId) -> bool {
        self.adjacent.contains(&other)
    }

    /// Factions with any recorded influence in this district, ascending.
    pub fn present_factions(&self) -> impl Iterator<Item = FactionId> + '_ {
        self.influence.keys().copied()
    }

    /// Local invariant: every stronghold faction has at least 1 influence,
    /// every influence value is in [0,10], and the total does not exceed 10.
    pub fn check_local_invariants(&self) -> Result<(), String> {
        if self.total_influence() > 10 {
            return Err(format!(
                "district {} total influence {} exceeds 10",
                self.id,
                self.total_influence()
            ));
        }
        for (&faction, &value) in &self.influence {
            if value > 10 {
                return Err(format!(
                    "district {} faction {} influence {} out of [0,10]",
                    self.id, faction, value
                ));
            }
        }
        for &faction in &self.stronghold {
            if self.influence_of(faction) < 1 {
                return Err(format!(
                    "district {} faction {} has a stronghold with 0 influence",
                    self.id, faction
                ));
            }
        }
        Ok(())
    }
}
