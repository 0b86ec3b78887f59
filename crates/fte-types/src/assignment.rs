//! Assignments: binding a piece to a district and a task for the turn.

use crate::ids::{DistrictId, FactionId, PieceId};
use crate::piece::CheckKind;
use serde::{Deserialize, Serialize};

/// What a piece is assigned to do this turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum Task {
    Monitor,
    InfluenceGain,
    InfluenceTake {
        target: FactionId,
    },
    InitiateConflict {
        target: FactionId,
        dc: u32,
        check: CheckKind,
        description: String,
    },
    Freeform {
        dc: u32,
        check: CheckKind,
        description: String,
        target: Option<FactionId>,
    },
}

impl Task {
    pub fn label(&self) -> &'static str {
        match self {
            Task::Monitor => "monitor",
            Task::InfluenceGain => "influence_gain",
            Task::InfluenceTake { .. } => "influence_take",
            Task::InitiateConflict { .. } => "initiate_conflict",
            Task::Freeform { .. } => "freeform",
        }
    }

    pub fn target(&self) -> Option<FactionId> {
        match self {
            Task::InfluenceTake { target } => Some(*target),
            Task::InitiateConflict { target, .. } => Some(*target),
            Task::Freeform { target, .. } => *target,
            Task::Monitor | Task::InfluenceGain => None,
        }
    }
}

/// A piece identity bound to a (district, task) for the turn, with a
/// manual GM modifier in [-10, 10].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub piece: PieceId,
    pub district: DistrictId,
    pub task: Task,
    pub manual_modifier: i8,
}

impl Assignment {
    pub fn new(piece: PieceId, district: DistrictId, task: Task, manual_modifier: i8) -> Self {
        Self {
            piece,
            district,
            task,
            manual_modifier: manual_modifier.clamp(-10, 10),
        }
    }
}
