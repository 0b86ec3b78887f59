//! Conflicts: the pause/resume boundary between the engine and the
//! Orchestrator.

use crate::ids::{DistrictId, FactionId, PieceId};
use crate::outcome::OutcomeTier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Unique identifier for a conflict, scoped to a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConflictId(pub u64);

impl fmt::Display for ConflictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of the four detection rules produced this conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Manual,
    Relationship,
    Target,
    Adjacent,
}

/// A faction's role in a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactionRole {
    Initiator,
    Target,
    Ally,
    Adjacent,
}

/// How a piece participates in a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceParticipation {
    Direct,
    Adjacent,
    AllySupport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStatus {
    Pending,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionParticipant {
    pub faction: FactionId,
    pub role: FactionRole,
}

/// A piece's recorded stake in a conflict: who they are, how they're
/// enrolled, and (once phase 5 has run) their roll and tentative tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceParticipant {
    pub piece: PieceId,
    pub faction: FactionId,
    pub participation: PieceParticipation,
    pub roll: Option<i32>,
    pub tier: Option<OutcomeTier>,
    pub intended_action: String,
}

/// The Orchestrator's verdict on a conflict: a partition of the enrolled
/// factions into winners, losers, and drawers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjudication {
    pub conflict_id: ConflictId,
    pub winners: BTreeSet<FactionId>,
    pub losers: BTreeSet<FactionId>,
    pub drawers: BTreeSet<FactionId>,
    pub notes: String,
}

impl Adjudication {
    /// Checks that winners/losers/drawers are pairwise disjoint and that
    /// their union is exactly `enrolled`.
    pub fn partitions(&self, enrolled: &BTreeSet<FactionId>) -> bool {
        let w_l: BTreeSet<_> = self.winners.intersection(&self.losers).collect();
        let w_d: BTreeSet<_> = self.winners.intersection(&self.drawers).collect();
        let l_d: BTreeSet<_> = self.losers.intersection(&self.drawers).collect();
        if !w_l.is_empty() || !w_d.is_empty() || !l_d.is_empty() {
            return false;
        }
        let union: BTreeSet<FactionId> = self
            .winners
            .iter()
            .chain(self.losers.iter())
            .chain(self.drawers.iter())
            .copied()
            .collect();
        &union == enrolled
    }
}

/// A detected conflict: participants, rolls, and (once adjudicated) the
/// resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub id: ConflictId,
    pub kind: ConflictKind,
    pub district: DistrictId,
    pub factions: Vec<FactionParticipant>,
    pub pieces: Vec<PieceParticipant>,
    pub status: ConflictStatus,
    pub adjudication: Option<Adjudication>,
}

impl Conflict {
    pub fn new(id: ConflictId, kind: ConflictKind, district: DistrictId) -> Self {
        Self {
            id,
            kind,
            district,
            factions: Vec::new(),
            pieces: Vec::new(),
            status: ConflictStatus::Pending,
            adjudication: None,
        }
    }

    pub fn enrolled_factions(&self) -> BTreeSet<FactionId> {
        self.factions.iter().map(|f| f.faction).collect()
    }

    pub fn enrolled_pieces(&self) -> BTreeSet<PieceId> {
        self.pieces.iter().map(|p| p.piece).collect()
    }

    pub fn is_piece_enrolled(&self, piece: PieceId) -> bool {
        self.pieces.iter().any(|p| p.piece == piece)
    }

    pub fn is_faction_enrolled(&self, faction: FactionId) -> bool {
        self.factions.iter().any(|f| f.faction == faction)
    }
}
