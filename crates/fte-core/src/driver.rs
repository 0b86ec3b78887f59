//! `TurnDriver`: the twelve-phase pipeline and the begin/resume/reset
//! state machine that brackets it (§4.8, §5, §6).

use crate::action::ActionResolver;
use crate::config::EngineConfig;
use crate::conflict::ConflictEngine;
use crate::decay::DecayEngine;
use crate::error::{EngineError, EngineResult};
use crate::monitoring::MonitoringEngine;
use crate::penalty::PenaltyTracker;
use crate::world::{WorldSnapshot, WorldView};
use fte_types::{
    ActionRoll, Adjudication, Assignment, CheckKind, Conflict, ConflictId, ConflictStatus,
    DecayEvent, PauseBundle, PhaseError, PieceKind, RumorDcUpdate, Task, TurnTransition,
    WeeklyDcUpdate,
};

/// What `begin` hands back: either the turn ran straight through (no
/// conflict needed adjudication) or it stopped at the phase 5/6 boundary.
pub enum BeginOutcome {
    Paused(PauseBundle),
    Completed(Box<TurnTransition>),
}

/// State carried across the pause. Exists only between a `begin`/`resume`
/// pair that actually suspended.
struct PendingTurn {
    seed: u64,
    config: EngineConfig,
    assignments: Vec<Assignment>,
    decay_events: Vec<DecayEvent>,
    rolls: Vec<ActionRoll>,
    conflicts: Vec<Conflict>,
}

/// Owns the one `WorldView` a turn runs against and the state needed to
/// resume or abandon an in-progress turn (§5: "WorldView is the only
/// mutable state and is owned exclusively by the driver between `begin`
/// and `complete`").
pub struct TurnDriver {
    world: WorldView,
    snapshot: Option<WorldSnapshot>,
    pending: Option<PendingTurn>,
}

impl TurnDriver {
    pub fn new(world: WorldView) -> Self {
        Self { world, snapshot: None, pending: None }
    }

    pub fn world(&self) -> &WorldView {
        &self.world
    }

    /// Drains the mutation log accumulated since the last call, for the
    /// `Store` to persist alongside the returned `TurnTransition`.
    pub fn commit_log(&mut self) -> Vec<fte_types::LogEntry> {
        self.world.commit()
    }

    /// Phases 1-5, then either the full remainder of the pipeline (no
    /// conflict is left pending) or a pause handed back to the caller.
    ///
    /// Panics if a turn is already in progress; the driver is a
    /// single-turn state machine and the caller must `resume` or `reset`
    /// before calling `begin` again.
    pub fn begin(
        &mut self,
        assignments: Vec<Assignment>,
        seed: u64,
        config: EngineConfig,
    ) -> EngineResult<BeginOutcome> {
        assert!(self.pending.is_none(), "begin called with a turn already in progress");

        // Phase 1: preparation.
        let pre_turn_snapshot = self.world.snapshot();

        // Phase 2: influence decay.
        let decay_events = match DecayEngine::run(&mut self.world, &config.decay, seed) {
            Ok(events) => events,
            Err(e) => {
                self.world.discard(pre_turn_snapshot);
                return Err(e);
            }
        };

        // Phase 3: assignment intake.
        if let Err(e) = Self::validate_assignments(&self.world, &assignments) {
            self.world.discard(pre_turn_snapshot);
            return Err(e);
        }

        // Phase 4: conflict detection.
        let mut conflicts = ConflictEngine::detect(&self.world, &assignments, &config.conflict, seed);

        // Phase 5: action rolls.
        let penalties = PenaltyTracker::compute(&self.world, &config.penalty, seed);
        let rolls = ActionResolver::roll(&self.world, &assignments, &penalties, &config.action, seed);
        ConflictEngine::attach_rolls(&mut conflicts, &rolls);
        ConflictEngine::auto_resolve_manual(&mut conflicts, &self.world, &config.action, seed, self.world.turn());

        self.snapshot = Some(pre_turn_snapshot);

        let still_pending: Vec<ConflictId> = conflicts
            .iter()
            .filter(|c| c.status == ConflictStatus::Pending)
            .map(|c| c.id)
            .collect();

        if still_pending.is_empty() {
            let transition = self.continue_from_phase6(assignments, seed, config, conflicts, decay_events, rolls)?;
            Ok(BeginOutcome::Completed(Box::new(transition)))
        } else {
            let bundle = PauseBundle { conflicts: conflicts.clone() };
            self.pending = Some(PendingTurn { seed, config, assignments, decay_events, rolls, conflicts });
            Ok(BeginOutcome::Paused(bundle))
        }
    }

    /// Phases 6-12, driven by the Orchestrator's adjudications for every
    /// conflict that was still `Pending` when `begin` paused.
    ///
    /// Panics if called with no turn awaiting resume.
    pub fn resume(&mut self, adjudications: Vec<Adjudication>) -> EngineResult<TurnTransition> {
        let pending = self.pending.take().expect("resume called with no turn awaiting adjudication");
        let PendingTurn { seed, config, assignments, decay_events, rolls, mut conflicts } = pending;

        for adjudication in adjudications {
            let Some(conflict) = conflicts.iter_mut().find(|c| c.id == adjudication.conflict_id) else {
                continue;
            };
            if let Err(e) = ConflictEngine::apply_adjudication(conflict, adjudication) {
                // Fatal on resume (§7); the paused state is left intact so
                // the Orchestrator can retry with a corrected adjudication
                // or call reset().
                self.pending = Some(PendingTurn { seed, config, assignments, decay_events, rolls, conflicts });
                return Err(e);
            }
        }

        self.continue_from_phase6(assignments, seed, config, conflicts, decay_events, rolls)
    }

    /// Abandons an in-progress turn, restoring the world to its state
    /// before phase 2 ran (§4.8, §5 "Cancellation").
    pub fn reset(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.world.discard(snapshot);
        }
        self.pending = None;
    }

    /// Phases 6 (already applied by the caller) through 12. Shared by the
    /// no-pause path in `begin` (adjudications is empty; every conflict
    /// auto-resolved or none existed) and `resume`.
    fn continue_from_phase6(
        &mut self,
        assignments: Vec<Assignment>,
        seed: u64,
        config: EngineConfig,
        conflicts: Vec<Conflict>,
        decay_events: Vec<DecayEvent>,
        rolls: Vec<ActionRoll>,
    ) -> EngineResult<TurnTransition> {
        let mut phase_errors = Vec::new();
        let turn = self.world.turn();

        // Phase 7: action resolution. Non-fatal past phase 5: record and
        // carry on with no outcomes rather than abort the turn.
        let action_outcomes = match ActionResolver::resolve(&mut self.world, &rolls, &conflicts, &config.action, seed) {
            Ok(outcomes) => outcomes,
            Err(e) => {
                phase_errors.push(PhaseError { phase: 7, message: e.to_string() });
                Vec::new()
            }
        };

        // Phase 8: random-walk weekly DC update, one Bernoulli-style
        // trinary draw per district.
        let mut weekly_dc_updates = Vec::new();
        let district_ids: Vec<_> = self.world.districts().map(|d| d.id).collect();
        for district_id in district_ids {
            let old_modifier = self
                .world
                .district(district_id)
                .map(|d| d.weekly_dc_modifier)
                .unwrap_or(0);
            let mut rng = crate::rng::Rng::substream(
                seed,
                turn,
                "weekly_dc",
                crate::rng::SubstreamKey::new().district(district_id.0),
            );
            let delta = rng.range(-1, 1) as i8;
            let new_modifier = (old_modifier + delta).clamp(-2, 2);
            if let Err(e) = self.world.set_weekly_dc(district_id, new_modifier) {
                phase_errors.push(PhaseError { phase: 8, message: e.to_string() });
                continue;
            }
            weekly_dc_updates.push(WeeklyDcUpdate { district: district_id, old_modifier, new_modifier });
        }

        // Phases 9 & 10: agent/squadron monitoring, then faction passive
        // monitoring, merged into one report per (observer, district).
        let active = MonitoringEngine::active_sources(&self.world, &assignments, seed);
        let passive = MonitoringEngine::passive_sources(&self.world, seed);
        let monitoring_reports = MonitoringEngine::build_reports(&active, &passive, &self.world, &config.monitoring, seed);
        for report in &monitoring_reports {
            for perceived in &report.perceived {
                if let Err(e) = self.world.update_perceived(report.observer, report.district, perceived.faction, perceived.value, turn) {
                    phase_errors.push(PhaseError { phase: 9, message: e.to_string() });
                }
            }
        }

        // Phase 11: rumor DC decay, skipping any rumor a faction already
        // knows.
        let mut rumor_dc_updates = Vec::new();
        let known: std::collections::BTreeSet<fte_types::RumorId> =
            self.world.factions().flat_map(|f| f.known_rumors.iter().copied()).collect();
        let district_ids: Vec<_> = self.world.districts().map(|d| d.id).collect();
        for district_id in district_ids {
            let Some(district) = self.world.district(district_id) else { continue };
            let mut rumor_ids: Vec<_> = district.rumors.iter().map(|r| r.id).collect();
            rumor_ids.sort();
            for rumor_id in rumor_ids {
                if known.contains(&rumor_id) {
                    continue;
                }
                let old_dc = self
                    .world
                    .district(district_id)
                    .and_then(|d| d.rumors.iter().find(|r| r.id == rumor_id))
                    .map(|r| r.dc)
                    .unwrap_or(0);
                let new_dc = old_dc.saturating_sub(1);
                if new_dc == old_dc {
                    continue;
                }
                if let Err(e) = self.world.set_rumor_dc(district_id, rumor_id, new_dc) {
                    phase_errors.push(PhaseError { phase: 11, message: e.to_string() });
                    continue;
                }
                rumor_dc_updates.push(RumorDcUpdate { district: district_id, rumor: rumor_id, old_dc, new_dc });
            }
        }

        // Phase 12: turn completion.
        let new_turn_number = self.world.advance_turn();
        self.snapshot = None;

        Ok(TurnTransition {
            decay_events,
            action_rolls: rolls,
            conflicts,
            action_outcomes,
            weekly_dc_updates,
            monitoring_reports,
            rumor_dc_updates,
            phase_errors,
            new_turn_number,
        })
    }

    /// Phase 3: unknown ids, DC range [5,30] for manual tasks, and
    /// check-kind/piece-kind agreement for freeform and initiate-conflict.
    fn validate_assignments(world: &WorldView, assignments: &[Assignment]) -> EngineResult<()> {
        for a in assignments {
            let Some(piece) = world.piece(a.piece) else {
                return Err(EngineError::AssignmentInvalid(format!("unknown piece {}", a.piece)));
            };
            if world.district(a.district).is_none() {
                return Err(EngineError::AssignmentInvalid(format!("unknown district {}", a.district)));
            }
            if piece.district != Some(a.district) {
                return Err(EngineError::AssignmentInvalid(format!(
                    "piece {} is not present in district {}",
                    a.piece, a.district
                )));
            }
            match &a.task {
                Task::InitiateConflict { dc, check, .. } | Task::Freeform { dc, check, .. } => {
                    if !(5..=30).contains(dc) {
                        return Err(EngineError::AssignmentInvalid(format!(
                            "task dc {} for piece {} out of [5,30]",
                            dc, a.piece
                        )));
                    }
                    let matches_kind = matches!(
                        (check, &piece.kind),
                        (CheckKind::AttributeSkill { .. }, PieceKind::Agent(_))
                            | (CheckKind::Aptitude { .. }, PieceKind::Squadron(_))
                    );
                    if !matches_kind {
                        return Err(EngineError::AssignmentInvalid(format!(
                            "piece {} check kind does not match its piece kind",
                            a.piece
                        )));
                    }
                }
                Task::Monitor | Task::InfluenceGain | Task::InfluenceTake { .. } => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fte_types::{fixtures, DistrictId, FactionId, PieceId};

    fn world() -> WorldView {
        let (f1, f2) = fixtures::sample_factions();
        WorldView::new(
            [fixtures::sample_district(), fixtures::sample_adjacent_district()],
            [f1, f2],
            [fixtures::sample_agent(1, FactionId(1)).with_district(DistrictId(1))],
            1,
        )
    }

    #[test]
    fn begin_with_no_conflicts_completes_without_pausing() {
        let mut driver = TurnDriver::new(world());
        let assignments = vec![Assignment::new(PieceId(1), DistrictId(1), Task::InfluenceGain, 0)];
        let outcome = driver.begin(assignments, 1, EngineConfig::default()).unwrap();
        assert!(matches!(outcome, BeginOutcome::Completed(_)));
    }

    #[test]
    fn reset_restores_pre_turn_state() {
        let mut driver = TurnDriver::new(world());
        let pre_turn_snapshot = driver.world.snapshot();
        driver.world.set_influence(DistrictId(1), FactionId(1), 4).unwrap();
        driver.snapshot = Some(pre_turn_snapshot);
        driver.reset();
        assert_eq!(driver.world().turn(), 1);
        assert_eq!(driver.world().district(DistrictId(1)).unwrap().influence_of(FactionId(1)), 0);
    }

    #[test]
    fn validate_assignments_rejects_piece_outside_its_district() {
        let world = world();
        let assignments = vec![Assignment::new(PieceId(1), DistrictId(2), Task::InfluenceGain, 0)];
        let err = TurnDriver::validate_assignments(&world, &assignments).unwrap_err();
        assert!(matches!(err, EngineError::AssignmentInvalid(_)));
    }

    #[test]
    fn validate_assignments_rejects_dc_out_of_range() {
        let world = world();
        let assignments = vec![Assignment::new(
            PieceId(1),
            DistrictId(1),
            Task::Freeform {
                dc: 3,
                check: CheckKind::AttributeSkill {
                    attribute: fte_types::Attribute::Might,
                    skill: fte_types::Skill::Combat,
                },
                description: "bribe".into(),
                target: None,
            },
            0,
        )];
        let err = TurnDriver::validate_assignments(&world, &assignments).unwrap_err();
        assert!(matches!(err, EngineError::AssignmentInvalid(_)));
    }
}
