//! Shared domain and wire types for the faction turn engine.
//!
//! This crate has no behavior beyond constructors, validation predicates,
//! and serialization. The engine itself (rolling dice, enforcing
//! invariants, orchestrating phases) lives in `fte-core`.

pub mod ids;
pub mod piece;
pub mod district;
pub mod faction;
pub mod assignment;
pub mod quality;
pub mod outcome;
pub mod conflict;
pub mod transition;

#[cfg(feature = "test-fixtures")]
pub mod fixtures;

pub use ids::{DistrictId, FactionId, PieceId, RumorId};
pub use piece::{Agent, Aptitude, Attribute, CheckKind, Piece, PieceKind, Skill, Squadron};
pub use district::{District, PreferredAction, Rumor};
pub use faction::{Faction, Relationship};
pub use assignment::{Assignment, Task};
pub use quality::QualityTier;
pub use outcome::OutcomeTier;
pub use conflict::{
    Adjudication, Conflict, ConflictId, ConflictKind, ConflictStatus, FactionParticipant,
    FactionRole, PieceParticipant, PieceParticipation,
};
pub use transition::{
    ActionOutcome, ActionRoll, DcDiscovery, DecayCause, DecayEvent, LogEntry, MonitoringReport,
    PauseBundle, PerceivedFaction, PhaseError, RumorDcUpdate, TurnTransition, WeeklyDcUpdate,
};
