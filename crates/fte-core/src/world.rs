//! The bulk-loaded working set a turn runs against (§4.2).
//!
//! Mutators apply immediately — phase 7 must see phase 2's decay, phase 9
//! must see phase 7's influence changes — and also append a [`LogEntry`]
//! describing the change. `commit()` drains that log for the `Store`;
//! `discard()` reverts to the last [`WorldView::snapshot`] taken, which is
//! how `TurnDriver::reset()` un-does an in-progress turn.

use crate::error::{EngineError, EngineResult};
use fte_types::{District, Faction, LogEntry, Piece};
use fte_types::{DistrictId, FactionId, PieceId, RumorId};
use std::collections::BTreeMap;

/// A full copy of the mutable world state, taken so an in-progress turn
/// can be abandoned cleanly.
#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    districts: BTreeMap<DistrictId, District>,
    factions: BTreeMap<FactionId, Faction>,
    pieces: BTreeMap<PieceId, Piece>,
    turn: u64,
}

/// In-memory snapshot of districts, factions, and pieces, with
/// invariant-checked mutators and a pending change log.
#[derive(Debug, Clone)]
pub struct WorldView {
    districts: BTreeMap<DistrictId, District>,
    factions: BTreeMap<FactionId, Faction>,
    pieces: BTreeMap<PieceId, Piece>,
    turn: u64,
    log: Vec<LogEntry>,
}

impl WorldView {
    pub fn new(
        districts: impl IntoIterator<Item = District>,
        factions: impl IntoIterator<Item = Faction>,
        pieces: impl IntoIterator<Item = Piece>,
        turn: u64,
    ) -> Self {
        Self {
            districts: districts.into_iter().map(|d| (d.id, d)).collect(),
            factions: factions.into_iter().map(|f| (f.id, f)).collect(),
            pieces: pieces.into_iter().map(|p| (p.id, p)).collect(),
            turn,
            log: Vec::new(),
        }
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn district(&self, id: DistrictId) -> Option<&District> {
        self.districts.get(&id)
    }

    pub fn faction(&self, id: FactionId) -> Option<&Faction> {
        self.factions.get(&id)
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(&id)
    }

    /// Ascending by identity — the iteration order the spec's ordering
    /// rule (§5) requires for every phase.
    pub fn districts(&self) -> impl Iterator<Item = &District> {
        self.districts.values()
    }

    pub fn factions(&self) -> impl Iterator<Item = &Faction> {
        self.factions.values()
    }

    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.values()
    }

    pub fn pieces_in_district(&self, district: DistrictId) -> impl Iterator<Item = &Piece> {
        self.pieces
            .values()
            .filter(move |p| p.district == Some(district))
    }

    /// Sets a district's influence for a faction, validating the
    /// district-local total-≤-10 and stronghold-≥-1 invariants before
    /// applying anything.
    pub fn set_influence(
        &mut self,
        district: DistrictId,
        faction: FactionId,
        new_value: u8,
    ) -> EngineResult<()> {
        let d = self.districts.get(&district).ok_or_else(|| {
            EngineError::InvariantViolation(format!("unknown district {}", district))
        })?;
        let old_value = d.influence_of(faction);
        let other_total = d.total_influence() - old_value as u32;
        if other_total + new_value as u32 > 10 {
            return Err(EngineError::InvariantViolation(format!(
                "district {} faction {} influence {} would push total above 10",
                district, faction, new_value
            )));
        }
        if d.has_stronghold(faction) && new_value < 1 {
            return Err(EngineError::InvariantViolation(format!(
                "district {} faction {} holds a stronghold but would drop to 0 influence",
                district, faction
            )));
        }
        let d = self.districts.get_mut(&district).expect("checked above");
        if new_value == 0 {
            d.influence.remove(&faction);
        } else {
            d.influence.insert(faction, new_value);
        }
        self.log.push(LogEntry::InfluenceSet {
            district,
            faction,
            old_value,
            new_value,
        });
        Ok(())
    }

    /// Applies a signed delta to a district/faction's influence, clamped
    /// to `[0, 10]`. Returns the amount actually applied (may be less
    /// than `amount` if clamped).
    pub fn apply_decay(
        &mut self,
        district: DistrictId,
        faction: FactionId,
        amount: i32,
    ) -> EngineResult<i32> {
        let d = self.districts.get(&district).ok_or_else(|| {
            EngineError::InvariantViolation(format!("unknown district {}", district))
        })?;
        let old_value = d.influence_of(faction) as i32;
        let new_value = (old_value + amount).clamp(0, 10) as u8;
        let applied = new_value as i32 - old_value;
        self.set_influence(district, faction, new_value)?;
        Ok(applied)
    }

    pub fn add_known_rumor(&mut self, faction: FactionId, rumor: RumorId) -> EngineResult<()> {
        let f = self.factions.get_mut(&faction).ok_or_else(|| {
            EngineError::InvariantViolation(format!("unknown faction {}", faction))
        })?;
        if f.known_rumors.insert(rumor) {
            self.log.push(LogEntry::KnownRumorAdded { faction, rumor });
        }
        Ok(())
    }

    pub fn update_perceived(
        &mut self,
        faction: FactionId,
        district: DistrictId,
        target: FactionId,
        value: u8,
        turn: u64,
    ) -> EngineResult<()> {
        let f = self.factions.get_mut(&faction).ok_or_else(|| {
            EngineError::InvariantViolation(format!("unknown faction {}", faction))
        })?;
        f.update_perceived(district, target, value, turn);
        self.log.push(LogEntry::PerceivedUpdated {
            faction,
            district,
            target,
            value,
            turn,
        });
        Ok(())
    }

    /// Sets a district's weekly DC modifier, clamped to `[-2, 2]`.
    pub fn set_weekly_dc(&mut self, district: DistrictId, new_value: i8) -> EngineResult<()> {
        let new_value = new_value.clamp(-2, 2);
        let d = self.districts.get_mut(&district).ok_or_else(|| {
            EngineError::InvariantViolation(format!("unknown district {}", district))
        })?;
        let old_value = d.weekly_dc_modifier;
        d.weekly_dc_modifier = new_value;
        self.log.push(LogEntry::WeeklyDcSet {
            district,
            old_value,
            new_value,
        });
        Ok(())
    }

    /// Sets a rumor's DC within a district, floored at 0 (phase 11).
    pub fn set_rumor_dc(
        &mut self,
        district: DistrictId,
        rumor: RumorId,
        new_value: u32,
    ) -> EngineResult<()> {
        let d = self.districts.get_mut(&district).ok_or_else(|| {
            EngineError::InvariantViolation(format!("unknown district {}", district))
        })?;
        let entry = d
            .rumors
            .iter_mut()
            .find(|r| r.id == rumor)
            .ok_or_else(|| {
                EngineError::InvariantViolation(format!(
                    "unknown rumor {} in district {}",
                    rumor, district
                ))
            })?;
        let old_value = entry.dc;
        entry.dc = new_value;
        self.log.push(LogEntry::RumorDcSet {
            district,
            rumor,
            old_value,
            new_value,
        });
        Ok(())
    }

    /// Checks every district's local invariants (§3).
    pub fn check_invariants(&self) -> EngineResult<()> {
        for d in self.districts.values() {
            d.check_local_invariants()
                .map_err(EngineError::InvariantViolation)?;
        }
        Ok(())
    }

    /// Captures the current state for later `discard()`. `TurnDriver`
    /// takes one of these at the end of phase 1.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            districts: self.districts.clone(),
            factions: self.factions.clone(),
            pieces: self.pieces.clone(),
            turn: self.turn,
        }
    }

    /// Reverts to `snapshot` and drops every pending log entry
    /// accumulated since — the `reset()` recovery path (§4.2, §7).
    pub fn discard(&mut self, snapshot: WorldSnapshot) {
        self.districts = snapshot.districts;
        self.factions = snapshot.factions;
        self.pieces = snapshot.pieces;
        self.turn = snapshot.turn;
        self.log.clear();
    }

    /// Drains the pending log of every mutation applied since the last
    /// `commit()`, for the `Store` to persist.
    pub fn commit(&mut self) -> Vec<LogEntry> {
        std::mem::take(&mut self.log)
    }

    /// Phase 12: increments the turn counter, returning the new value.
    pub fn advance_turn(&mut self) -> u64 {
        self.turn += 1;
        self.turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fte_types::fixtures;

    fn world() -> WorldView {
        let (f1, f2) = fixtures::sample_factions();
        WorldView::new(
            [fixtures::sample_district(), fixtures::sample_adjacent_district()],
            [f1, f2],
            [],
            1,
        )
    }

    #[test]
    fn set_influence_rejects_overflow() {
        let mut w = world();
        let d = DistrictId(1);
        w.set_influence(d, FactionId(1), 7).unwrap();
        let err = w.set_influence(d, FactionId(2), 5).unwrap_err();
        assert!(matches!(err, EngineError::InvariantViolation(_)));
    }

    #[test]
    fn apply_decay_clamps_at_zero() {
        let mut w = world();
        let d = DistrictId(1);
        w.set_influence(d, FactionId(1), 1).unwrap();
        let applied = w.apply_decay(d, FactionId(1), -5).unwrap();
        assert_eq!(applied, -1);
        assert_eq!(w.district(d).unwrap().influence_of(FactionId(1)), 0);
    }

    #[test]
    fn commit_drains_log() {
        let mut w = world();
        w.set_influence(DistrictId(1), FactionId(1), 2).unwrap();
        let log = w.commit();
        assert_eq!(log.len(), 1);
        assert!(w.commit().is_empty());
    }

    #[test]
    fn discard_reverts_to_snapshot() {
        let mut w = world();
        let snap = w.snapshot();
        w.set_influence(DistrictId(1), FactionId(1), 4).unwrap();
        w.discard(snap);
        assert_eq!(w.district(DistrictId(1)).unwrap().influence_of(FactionId(1)), 0);
    }
}
