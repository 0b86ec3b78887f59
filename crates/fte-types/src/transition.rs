//! The artifacts produced by a turn: decay, rolls, conflicts, outcomes,
//! monitoring reports, DC updates, and the pause/resume wire types.

use crate::assignment::Task;
use crate::conflict::Conflict;
use crate::ids::{DistrictId, FactionId, PieceId, RumorId};
use crate::outcome::OutcomeTier;
use crate::quality::QualityTier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Why a faction lost a point of influence during phase 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayCause {
    StrongholdProtected,
    BaseThreshold,
    Saturation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayEvent {
    pub district: DistrictId,
    pub faction: FactionId,
    pub amount: i32,
    pub cause: DecayCause,
}

/// A recorded phase-5 roll: the raw roll, the enemy-piece penalty and any
/// draw-adjudication penalty folded in, and the tentative outcome tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRoll {
    pub piece: PieceId,
    pub faction: FactionId,
    pub district: DistrictId,
    pub task: Task,
    pub raw_roll: i32,
    pub penalty: i32,
    pub post_penalty_roll: i32,
    pub dc: Option<i32>,
    pub tier: OutcomeTier,
}

/// A phase-7 mutation record: what a piece's action actually did to the
/// world once contention and adjudication were applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub piece: PieceId,
    pub faction: FactionId,
    pub district: DistrictId,
    pub tier: OutcomeTier,
    pub self_delta: i32,
    pub target: Option<FactionId>,
    pub target_delta: i32,
    pub pool_exhausted: bool,
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyDcUpdate {
    pub district: DistrictId,
    pub old_modifier: i8,
    pub new_modifier: i8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RumorDcUpdate {
    pub district: DistrictId,
    pub rumor: RumorId,
    pub old_dc: u32,
    pub new_dc: u32,
}

/// One faction's perceived entry for another faction, real or phantom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceivedFaction {
    pub faction: FactionId,
    pub value: u8,
    pub phantom: bool,
}

/// What the weekly DC modifier discovery pass yielded, per §4.4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DcDiscovery {
    Exact { modifier: i8 },
    DirectionOnly { positive: bool },
    Nothing,
}

/// A district intelligence report: the union of every monitoring source
/// a faction ran in a district this turn, combined into one picture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringReport {
    pub district: DistrictId,
    pub observer: FactionId,
    pub turn: u64,
    pub tier: QualityTier,
    pub highest_roll: i32,
    pub perceived: Vec<PerceivedFaction>,
    pub correctly_identified_strongholds: BTreeSet<FactionId>,
    pub false_strongholds: BTreeSet<FactionId>,
    pub dc_discovery: DcDiscovery,
    pub confidence: u8,
}

impl MonitoringReport {
    pub fn total_perceived(&self) -> u32 {
        self.perceived.iter().map(|p| p.value as u32).sum()
    }

    pub fn real_factions(&self) -> BTreeSet<FactionId> {
        self.perceived
            .iter()
            .filter(|p| !p.phantom)
            .map(|p| p.faction)
            .collect()
    }

    pub fn phantom_factions(&self) -> BTreeSet<FactionId> {
        self.perceived
            .iter()
            .filter(|p| p.phantom)
            .map(|p| p.faction)
            .collect()
    }
}

/// A non-fatal inconsistency encountered mid-phase; recorded rather than
/// aborting the turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseError {
    pub phase: u8,
    pub message: String,
}

/// One entry in `WorldView`'s pending mutation log, tagged the same way
/// as the engine's other wire-shaped data so a `Store` can apply or
/// discard them atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LogEntry {
    InfluenceSet {
        district: DistrictId,
        faction: FactionId,
        old_value: u8,
        new_value: u8,
    },
    KnownRumorAdded {
        faction: FactionId,
        rumor: RumorId,
    },
    PerceivedUpdated {
        faction: FactionId,
        district: DistrictId,
        target: FactionId,
        value: u8,
        turn: u64,
    },
    WeeklyDcSet {
        district: DistrictId,
        old_value: i8,
        new_value: i8,
    },
    RumorDcSet {
        district: DistrictId,
        rumor: RumorId,
        old_value: u32,
        new_value: u32,
    },
}

/// The conflict list handed to the Orchestrator when the driver pauses
/// between phases 5 and 6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauseBundle {
    pub conflicts: Vec<Conflict>,
}

/// Everything one complete `begin`/`resume` cycle produces, in
/// document order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TurnTransition {
    pub decay_events: Vec<DecayEvent>,
    pub action_rolls: Vec<ActionRoll>,
    pub conflicts: Vec<Conflict>,
    pub action_outcomes: Vec<ActionOutcome>,
    pub weekly_dc_updates: Vec<WeeklyDcUpdate>,
    pub monitoring_reports: Vec<MonitoringReport>,
    pub rumor_dc_updates: Vec<RumorDcUpdate>,
    pub phase_errors: Vec<PhaseError>,
    pub new_turn_number: u64,
}
