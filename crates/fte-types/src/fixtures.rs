//! Sample data fixtures for testing.
//!
//! This module provides ready-made districts, factions, and pieces for
//! other crates to build turns against. Enable the `test-fixtures`
//! feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // fte-types = { path = "../fte-types", features = ["test-fixtures"] }
//!
//! use fte_types::fixtures;
//!
//! let district = fixtures::sample_district();
//! let (f1, f2) = fixtures::sample_factions();
//! ```

use crate::district::{District, PreferredAction, Rumor};
use crate::faction::Faction;
use crate::ids::{DistrictId, FactionId, PieceId, RumorId};
use crate::piece::{Agent, Aptitude, Attribute, Piece, Skill, Squadron};

/// A two-faction district with influence 0 for both, total pool 10.
pub fn sample_district() -> District {
    let monitoring = PreferredAction::new(Attribute::Wits, Skill::Insight, Aptitude::Monitoring);
    let influence_action =
        PreferredAction::new(Attribute::Presence, Skill::Persuasion, Aptitude::Diplomacy);
    District::new(DistrictId(1), 5, 5, 5, monitoring, influence_action)
        .with_adjacent([DistrictId(2)])
}

/// A second district adjacent to `sample_district`, for conflict-adjacency
/// tests.
pub fn sample_adjacent_district() -> District {
    let monitoring = PreferredAction::new(Attribute::Wits, Skill::Insight, Aptitude::Monitoring);
    let influence_action =
        PreferredAction::new(Attribute::Presence, Skill::Persuasion, Aptitude::Diplomacy);
    District::new(DistrictId(2), 3, 3, 3, monitoring, influence_action)
        .with_adjacent([DistrictId(1)])
}

/// Two factions, neutral toward one another, with no relationship history.
pub fn sample_factions() -> (Faction, Faction) {
    (
        Faction::new(FactionId(1), 0),
        Faction::new(FactionId(2), 0),
    )
}

/// A competent agent piece (3s and 2s across the board) for faction 1.
pub fn sample_agent(id: u64, faction: FactionId) -> Piece {
    let agent = Agent {
        might: 2,
        finesse: 3,
        wits: 3,
        presence: 2,
        resolve: 2,
        stealth: 2,
        persuasion: 3,
        insight: 3,
        deception: 1,
        combat: 2,
        lore: 1,
        streetwise: 2,
    };
    Piece::new_agent(PieceId(id), faction, agent)
}

/// A middling squadron piece with mobility 3.
pub fn sample_squadron(id: u64, faction: FactionId) -> Piece {
    let squadron = Squadron {
        mobility: 3,
        monitoring: 1,
        skirmish: 2,
        subterfuge: 0,
        logistics: 1,
        discipline: 1,
        intimidation: 0,
        diplomacy: 1,
        sabotage: -1,
    };
    Piece::new_squadron(PieceId(id), faction, squadron)
}

/// A single cheap-to-discover rumor.
pub fn sample_rumor() -> Rumor {
    Rumor::new(RumorId(1), 10, 1)
}
