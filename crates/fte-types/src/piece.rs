//! Pieces: agents and squadrons, and the stats used to roll their checks.

use crate::ids::{DistrictId, FactionId, PieceId};
use serde::{Deserialize, Serialize};

/// An agent's five attributes, each rated 0–5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Might,
    Finesse,
    Wits,
    Presence,
    Resolve,
}

impl Attribute {
    pub const ALL: [Attribute; 5] = [
        Attribute::Might,
        Attribute::Finesse,
        Attribute::Wits,
        Attribute::Presence,
        Attribute::Resolve,
    ];
}

/// An agent's seven skills, each rated 0–5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Stealth,
    Persuasion,
    Insight,
    Deception,
    Combat,
    Lore,
    Streetwise,
}

impl Skill {
    pub const ALL: [Skill; 7] = [
        Skill::Stealth,
        Skill::Persuasion,
        Skill::Insight,
        Skill::Deception,
        Skill::Combat,
        Skill::Lore,
        Skill::Streetwise,
    ];
}

/// A squadron's eight aptitudes, each rated -3..=5, defaulting to -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aptitude {
    Monitoring,
    Skirmish,
    Subterfuge,
    Logistics,
    Discipline,
    Intimidation,
    Diplomacy,
    Sabotage,
}

impl Aptitude {
    pub const ALL: [Aptitude; 8] = [
        Aptitude::Monitoring,
        Aptitude::Skirmish,
        Aptitude::Subterfuge,
        Aptitude::Logistics,
        Aptitude::Discipline,
        Aptitude::Intimidation,
        Aptitude::Diplomacy,
        Aptitude::Sabotage,
    ];
}

/// Which kind of check backs an influence/freeform/conflict action.
///
/// Agents check attribute+skill; squadrons check a single aptitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckKind {
    AttributeSkill { attribute: Attribute, skill: Skill },
    Aptitude { aptitude: Aptitude },
}

/// Stats for an agent piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub might: u8,
    pub finesse: u8,
    pub wits: u8,
    pub presence: u8,
    pub resolve: u8,
    pub stealth: u8,
    pub persuasion: u8,
    pub insight: u8,
    pub deception: u8,
    pub combat: u8,
    pub lore: u8,
    pub streetwise: u8,
}

impl Agent {
    pub fn attribute(&self, attribute: Attribute) -> u8 {
        match attribute {
            Attribute::Might => self.might,
            Attribute::Finesse => self.finesse,
            Attribute::Wits => self.wits,
            Attribute::Presence => self.presence,
            Attribute::Resolve => self.resolve,
        }
    }

    pub fn skill(&self, skill: Skill) -> u8 {
        match skill {
            Skill::Stealth => self.stealth,
            Skill::Persuasion => self.persuasion,
            Skill::Insight => self.insight,
            Skill::Deception => self.deception,
            Skill::Combat => self.combat,
            Skill::Lore => self.lore,
            Skill::Streetwise => self.streetwise,
        }
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            might: 0,
            finesse: 0,
            wits: 0,
            presence: 0,
            resolve: 0,
            stealth: 0,
            persuasion: 0,
            insight: 0,
            deception: 0,
            combat: 0,
            lore: 0,
            streetwise: 0,
        }
    }
}

/// Stats for a squadron piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Squadron {
    pub mobility: u8,
    pub monitoring: i8,
    pub skirmish: i8,
    pub subterfuge: i8,
    pub logistics: i8,
    pub discipline: i8,
    pub intimidation: i8,
    pub diplomacy: i8,
    pub sabotage: i8,
}

impl Squadron {
    pub fn aptitude(&self, aptitude: Aptitude) -> i8 {
        match aptitude {
            Aptitude::Monitoring => self.monitoring,
            Aptitude::Skirmish => self.skirmish,
            Aptitude::Subterfuge => self.subterfuge,
            Aptitude::Logistics => self.logistics,
            Aptitude::Discipline => self.discipline,
            Aptitude::Intimidation => self.intimidation,
            Aptitude::Diplomacy => self.diplomacy,
            Aptitude::Sabotage => self.sabotage,
        }
    }
}

impl Default for Squadron {
    fn default() -> Self {
        Self {
            mobility: 0,
            monitoring: -1,
            skirmish: -1,
            subterfuge: -1,
            logistics: -1,
            discipline: -1,
            intimidation: -1,
            diplomacy: -1,
            sabotage: -1,
        }
    }
}

/// The agent/squadron split. Carries the stats specific to each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PieceKind {
    Agent(Agent),
    Squadron(Squadron),
}

impl PieceKind {
    pub fn is_agent(&self) -> bool {
        matches!(self, PieceKind::Agent(_))
    }

    pub fn is_squadron(&self) -> bool {
        matches!(self, PieceKind::Squadron(_))
    }

    pub fn as_agent(&self) -> Option<&Agent> {
        match self {
            PieceKind::Agent(a) => Some(a),
            PieceKind::Squadron(_) => None,
        }
    }

    pub fn as_squadron(&self) -> Option<&Squadron> {
        match self {
            PieceKind::Squadron(s) => Some(s),
            PieceKind::Agent(_) => None,
        }
    }

    pub fn mobility(&self) -> u8 {
        match self {
            PieceKind::Agent(_) => 0,
            PieceKind::Squadron(s) => s.mobility,
        }
    }
}

/// A deployable piece belonging to a faction: an agent or a squadron.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    pub faction: FactionId,
    pub kind: PieceKind,
    pub district: Option<DistrictId>,
}

impl Piece {
    pub fn new_agent(id: PieceId, faction: FactionId, agent: Agent) -> Self {
        Self {
            id,
            faction,
            kind: PieceKind::Agent(agent),
            district: None,
        }
    }

    pub fn new_squadron(id: PieceId, faction: FactionId, squadron: Squadron) -> Self {
        Self {
            id,
            faction,
            kind: PieceKind::Squadron(squadron),
            district: None,
        }
    }

    pub fn with_district(mut self, district: DistrictId) -> Self {
        self.district = Some(district);
        self
    }

    pub fn is_agent(&self) -> bool {
        self.kind.is_agent()
    }

    pub fn is_squadron(&self) -> bool {
        self.kind.is_squadron()
    }
}
