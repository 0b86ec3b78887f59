//! Factions: relationships, support, and what each faction believes it
//! knows about the world.

use crate::ids::{DistrictId, FactionId, RumorId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A faction-to-faction disposition, symmetric by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i8)]
pub enum Relationship {
    Hostile = -2,
    Unfriendly = -1,
    Neutral = 0,
    Friendly = 1,
    Allied = 2,
}

impl Relationship {
    pub fn value(self) -> i8 {
        self as i8
    }

    pub fn from_value(value: i8) -> Option<Self> {
        match value {
            -2 => Some(Relationship::Hostile),
            -1 => Some(Relationship::Unfriendly),
            0 => Some(Relationship::Neutral),
            1 => Some(Relationship::Friendly),
            2 => Some(Relationship::Allied),
            _ => None,
        }
    }

    pub fn is_hostile(self) -> bool {
        self.value() < 0
    }
}

/// A single faction's perceived value for another faction in a district,
/// along with the turn it was last refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceivedEntry {
    pub value: u8,
    pub last_updated_turn: u64,
}

/// A faction in the world: identity, standing bonus, and what it knows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub monitoring_bonus: i32,
    relationships: BTreeMap<FactionId, Relationship>,
    support: BTreeSet<FactionId>,
    pub known_rumors: BTreeSet<RumorId>,
    perceived_world: BTreeMap<DistrictId, BTreeMap<FactionId, PerceivedEntry>>,
}

impl Faction {
    pub fn new(id: FactionId, monitoring_bonus: i32) -> Self {
        Self {
            id,
            monitoring_bonus,
            relationships: BTreeMap::new(),
            support: BTreeSet::new(),
            known_rumors: BTreeSet::new(),
            perceived_world: BTreeMap::new(),
        }
    }

    pub fn relationship_with(&self, other: FactionId) -> Relationship {
        self.relationships
            .get(&other)
            .copied()
            .unwrap_or(Relationship::Neutral)
    }

    /// Set this faction's relationship with `other`. Callers are
    /// responsible for mirroring the same call on `other`'s record so the
    /// storage stays symmetric, as `WorldView` does.
    pub fn set_relationship(&mut self, other: FactionId, relationship: Relationship) {
        self.relationships.insert(other, relationship);
    }

    pub fn supports(&self, other: FactionId) -> bool {
        self.support.contains(&other)
    }

    /// Sets the support flag toward `other`. Invalid unless the
    /// relationship with `other` is already `Allied`; returns `false` and
    /// leaves state unchanged otherwise.
    pub fn set_support(&mut self, other: FactionId, support: bool) -> bool {
        if support && self.relationship_with(other) != Relationship::Allied {
            return false;
        }
        if support {
            self.support.insert(other);
        } else {
            self.support.remove(&other);
        }
        true
    }

    pub fn knows_rumor(&self, rumor: RumorId) -> bool {
        self.known_rumors.contains(&rumor)
    }

    pub fn add_known_rumor(&mut self, rumor: RumorId) {
        self.known_rumors.insert(rumor);
    }

    pub fn perceived(&self, district: DistrictId, faction: FactionId) -> Option<PerceivedEntry> {
        self.perceived_world.get(&district)?.get(&faction).copied()
    }

    pub fn perceived_in_district(
        &self,
        district: DistrictId,
    ) -> Option<&BTreeMap<FactionId, PerceivedEntry>> {
        self.perceived_world.get(&district)
    }

    pub fn update_perceived(
        &mut self,
        district: DistrictId,
        faction: FactionId,
        value: u8,
        turn: u64,
    ) {
        self.perceived_world
            .entry(district)
            .or_default()
            .insert(faction, PerceivedEntry {
                value,
                last_updated_turn: turn,
            });
    }

    /// Replaces the entire perceived picture for a district (used when a
    /// fresh monitoring report supersedes prior knowledge).
    pub fn replace_perceived_district(
        &mut self,
        district: DistrictId,
        entries: BTreeMap<FactionId, PerceivedEntry>,
    ) {
        self.perceived_world.insert(district, entries);
    }
}
