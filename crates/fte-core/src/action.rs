//! Phases 5 & 7: roll formation, DC computation, outcome tables, and
//! contested-pool resolution (§4.5).

use crate::config::ActionConfig;
use crate::error::EngineResult;
use crate::rng::{Rng, SubstreamKey};
use crate::world::WorldView;
use fte_types::{
    ActionOutcome, ActionRoll, Assignment, CheckKind, Conflict, District, DistrictId, FactionId,
    OutcomeTier, Piece, PieceKind, PieceParticipation, PreferredAction, Relationship, Task,
};
use std::collections::BTreeMap;

const PHASE_TAG: &str = "action";
const EFFECT_TAG: &str = "action_effect";
const CONTENTION_TAG: &str = "contention";

pub struct ActionResolver;

/// A roll with its conflict-adjudication adjustment folded in, ready for
/// outcome-table application.
struct Resolved<'a> {
    roll: &'a ActionRoll,
    final_roll: i32,
    tier: OutcomeTier,
}

enum PieceVerdict {
    Win,
    Loss,
    Draw,
    Voided,
}

impl ActionResolver {
    /// Phase 5: rolls and tentative outcome tiers for every non-Monitor
    /// assignment, in ascending piece-id order. Does not mutate the world.
    pub fn roll(
        world: &WorldView,
        assignments: &[Assignment],
        penalties: &crate::penalty::PenaltyTracker,
        config: &ActionConfig,
        seed: u64,
    ) -> Vec<ActionRoll> {
        let turn = world.turn();
        let mut ordered: Vec<&Assignment> = assignments
            .iter()
            .filter(|a| !matches!(a.task, Task::Monitor))
            .collect();
        ordered.sort_by_key(|a| a.piece.0);

        let mut rolls = Vec::with_capacity(ordered.len());
        for a in ordered {
            let Some(piece) = world.piece(a.piece) else {
                continue;
            };
            let Some(district) = world.district(a.district) else {
                continue;
            };

            let stat_value = match &a.task {
                Task::InfluenceGain | Task::InfluenceTake { .. } => {
                    Self::check_value_from_preferred(piece, district.influence_action)
                }
                Task::InitiateConflict { check, .. } | Task::Freeform { check, .. } => {
                    Self::check_value_from_kind(piece, *check)
                }
                Task::Monitor => 0,
            };

            let mut rng = Rng::substream(seed, turn, PHASE_TAG, SubstreamKey::new().piece(piece.id.0));
            let raw_roll = rng.d20() + stat_value + a.manual_modifier as i32;
            let penalty = penalties.penalty_for(piece.id);
            let post_penalty_roll = raw_roll + penalty;

            let dc = match &a.task {
                Task::InfluenceGain => Some(Self::gain_dc(config, district, piece.faction)),
                Task::InfluenceTake { target } => {
                    Some(Self::take_dc(config, world, district, piece.faction, *target))
                }
                Task::InitiateConflict { dc, .. } | Task::Freeform { dc, .. } => Some(*dc as i32),
                Task::Monitor => None,
            };
            let tier = OutcomeTier::from_roll_and_dc(post_penalty_roll, dc.unwrap_or(11));

            rolls.push(ActionRoll {
                piece: piece.id,
                faction: piece.faction,
                district: a.district,
                task: a.task.clone(),
                raw_roll,
                penalty,
                post_penalty_roll,
                dc,
                tier,
            });
        }
        rolls
    }

    fn check_value_from_preferred(piece: &Piece, preferred: PreferredAction) -> i32 {
        match &piece.kind {
            PieceKind::Agent(a) => {
                a.attribute(preferred.attribute) as i32 + a.skill(preferred.skill) as i32
            }
            PieceKind::Squadron(s) => s.aptitude(preferred.aptitude) as i32,
        }
    }

    fn check_value_from_kind(piece: &Piece, check: CheckKind) -> i32 {
        match (check, &piece.kind) {
            (CheckKind::AttributeSkill { attribute, skill }, PieceKind::Agent(a)) => {
                a.attribute(attribute) as i32 + a.skill(skill) as i32
            }
            (CheckKind::Aptitude { aptitude }, PieceKind::Squadron(s)) => {
                s.aptitude(aptitude) as i32
            }
            // Mismatched check/piece kind is rejected at assignment intake
            // (phase 3); a roll reaching here with one is scored 0 rather
            // than panicking.
            _ => 0,
        }
    }

    fn gain_dc(config: &ActionConfig, district: &District, faction: FactionId) -> i32 {
        let likeability = district.likeability_of(faction) as i32;
        let band = district.influence_of(faction).min(9) as usize;
        let mut dc = config.base_dc - likeability + config.influence_band_modifier[band];
        if district.has_stronghold(faction) {
            dc += config.stronghold_dc_delta;
        }
        dc += district.weekly_dc_modifier as i32;
        dc
    }

    fn take_dc(
        config: &ActionConfig,
        world: &WorldView,
        district: &District,
        faction: FactionId,
        target: FactionId,
    ) -> i32 {
        let gain = Self::gain_dc(config, district, faction);
        let rel = world
            .faction(faction)
            .map_or(Relationship::Neutral, |f| f.relationship_with(target));
        let idx = (rel.value() + 2) as usize;
        gain + config.take_dc_delta + config.take_relationship_modifier[idx]
    }

    /// Phase 7: applies influence mutations for every action roll,
    /// honoring conflict adjudications, multi-gain contention, and take
    /// contention. Returns the outcome list in the same order mutations
    /// were applied.
    pub fn resolve(
        world: &mut WorldView,
        rolls: &[ActionRoll],
        conflicts: &[Conflict],
        config: &ActionConfig,
        seed: u64,
    ) -> EngineResult<Vec<ActionOutcome>> {
        let turn = world.turn();
        let mut verdicts: BTreeMap<_, PieceVerdict> = BTreeMap::new();
        for c in conflicts {
            let Some(adj) = &c.adjudication else { continue };
            for p in &c.pieces {
                let verdict = if p.participation == PieceParticipation::AllySupport {
                    PieceVerdict::Voided
                } else if adj.winners.contains(&p.faction) {
                    PieceVerdict::Win
                } else if adj.losers.contains(&p.faction) {
                    PieceVerdict::Loss
                } else if adj.drawers.contains(&p.faction) {
                    PieceVerdict::Draw
                } else {
                    PieceVerdict::Win
                };
                verdicts.insert(p.piece, verdict);
            }
        }

        let mut resolved: Vec<Resolved> = Vec::with_capacity(rolls.len());
        for r in rolls {
            match verdicts.get(&r.piece) {
                Some(PieceVerdict::Voided) => continue,
                Some(PieceVerdict::Loss) => resolved.push(Resolved {
                    roll: r,
                    final_roll: r.post_penalty_roll,
                    tier: OutcomeTier::Fail,
                }),
                Some(PieceVerdict::Draw) => {
                    let adjusted = r.post_penalty_roll - 2;
                    let tier = OutcomeTier::from_roll_and_dc(adjusted, r.dc.unwrap_or(11));
                    resolved.push(Resolved { roll: r, final_roll: adjusted, tier });
                }
                Some(PieceVerdict::Win) | None => resolved.push(Resolved {
                    roll: r,
                    final_roll: r.post_penalty_roll,
                    tier: r.tier,
                }),
            }
        }

        let mut outcomes = Vec::new();

        let mut gain_by_district: BTreeMap<DistrictId, Vec<&Resolved>> = BTreeMap::new();
        for res in &resolved {
            if matches!(res.roll.task, Task::InfluenceGain) && res.tier.is_success() {
                gain_by_district.entry(res.roll.district).or_default().push(res);
            }
        }
        for (district, mut contenders) in gain_by_district {
            Self::order_contenders(&mut contenders, seed, turn, district, 0);
            for res in contenders {
                let pool = world.district(district).map(|d| d.pool()).unwrap_or(0);
                let (delta, note, exhausted) = Self::gain_success_effect(res, config, pool, seed, turn);
                Self::apply_delta(world, district, res.roll.faction, delta)?;
                outcomes.push(ActionOutcome {
                    piece: res.roll.piece,
                    faction: res.roll.faction,
                    district,
                    tier: res.tier,
                    self_delta: delta,
                    target: None,
                    target_delta: 0,
                    pool_exhausted: exhausted,
                    note,
                });
            }
        }

        for res in &resolved {
            if matches!(res.roll.task, Task::InfluenceGain) && !res.tier.is_success() {
                let (delta, note) = Self::gain_failure_effect(res, world, config, seed, turn);
                Self::apply_delta(world, res.roll.district, res.roll.faction, delta)?;
                outcomes.push(ActionOutcome {
                    piece: res.roll.piece,
                    faction: res.roll.faction,
                    district: res.roll.district,
                    tier: res.tier,
                    self_delta: delta,
                    target: None,
                    target_delta: 0,
                    pool_exhausted: false,
                    note,
                });
            }
        }

        let mut take_by_target: BTreeMap<(DistrictId, FactionId), Vec<&Resolved>> = BTreeMap::new();
        let mut take_independent: Vec<&Resolved> = Vec::new();
        for res in &resolved {
            if let Task::InfluenceTake { target } = res.roll.task {
                if res.tier.is_success() {
                    take_by_target.entry((res.roll.district, target)).or_default().push(res);
                } else {
                    take_independent.push(res);
                }
            }
        }
        for ((district, target), mut contenders) in take_by_target {
            Self::order_contenders(&mut contenders, seed, turn, district, 1);
            for res in contenders {
                let target_current = world.district(district).map(|d| d.influence_of(target)).unwrap_or(0);
                if target_current == 0 {
                    outcomes.push(ActionOutcome {
                        piece: res.roll.piece,
                        faction: res.roll.faction,
                        district,
                        tier: res.tier,
                        self_delta: 0,
                        target: Some(target),
                        target_delta: 0,
                        pool_exhausted: true,
                        note: "target influence already exhausted by an earlier take".into(),
                    });
                    continue;
                }
                let pool = world.district(district).map(|d| d.pool()).unwrap_or(0);
                let (self_delta, target_delta, note) =
                    Self::take_success_effect(res, config, pool, seed, turn);
                Self::apply_delta(world, district, res.roll.faction, self_delta)?;
                Self::apply_delta(world, district, target, target_delta)?;
                outcomes.push(ActionOutcome {
                    piece: res.roll.piece,
                    faction: res.roll.faction,
                    district,
                    tier: res.tier,
                    self_delta,
                    target: Some(target),
                    target_delta,
                    pool_exhausted: false,
                    note,
                });
            }
        }
        for res in take_independent {
            if let Task::InfluenceTake { target } = res.roll.task {
                let (self_delta, target_delta, note) =
                    Self::take_failure_effect(res, world, config, seed, turn);
                Self::apply_delta(world, res.roll.district, res.roll.faction, self_delta)?;
                Self::apply_delta(world, res.roll.district, target, target_delta)?;
                outcomes.push(ActionOutcome {
                    piece: res.roll.piece,
                    faction: res.roll.faction,
                    district: res.roll.district,
                    tier: res.tier,
                    self_delta,
                    target: Some(target),
                    target_delta,
                    pool_exhausted: false,
                    note,
                });
            }
        }

        for res in &resolved {
            if let Task::Freeform { target, .. } = res.roll.task {
                outcomes.push(ActionOutcome {
                    piece: res.roll.piece,
                    faction: res.roll.faction,
                    district: res.roll.district,
                    tier: res.tier,
                    self_delta: 0,
                    target,
                    target_delta: 0,
                    pool_exhausted: false,
                    note: "freeform action: outcome tier only, no engine-applied mutation".into(),
                });
            }
        }

        Ok(outcomes)
    }

    fn apply_delta(
        world: &mut WorldView,
        district: DistrictId,
        faction: FactionId,
        delta: i32,
    ) -> EngineResult<()> {
        if delta == 0 {
            return Ok(());
        }
        let d = world.district(district);
        let current = d.map(|d| d.influence_of(faction)).unwrap_or(0) as i32;
        let floor = if d.is_some_and(|d| d.has_stronghold(faction)) { 1 } else { 0 };
        let new_value = (current + delta).clamp(floor, 10) as u8;
        world.set_influence(district, faction, new_value)
    }

    /// Orders contenders by tier (CritSuccess first), then roll
    /// descending, then a per-(district, piece) random tiebreak — keyed
    /// by identity, not draw sequence, so an unrelated contender joining
    /// or leaving never perturbs this ordering.
    fn order_contenders(contenders: &mut [&Resolved], seed: u64, turn: u64, district: DistrictId, salt: u64) {
        contenders.sort_by(|a, b| {
            b.tier
                .cmp(&a.tier)
                .then(b.final_roll.cmp(&a.final_roll))
                .then_with(|| {
                    let ka = Self::tiebreak_key(seed, turn, district, a.roll.piece.0, salt);
                    let kb = Self::tiebreak_key(seed, turn, district, b.roll.piece.0, salt);
                    ka.partial_cmp(&kb).unwrap()
                })
        });
    }

    fn tiebreak_key(seed: u64, turn: u64, district: DistrictId, piece: u64, salt: u64) -> f64 {
        let mut rng = Rng::substream(
            seed,
            turn,
            CONTENTION_TAG,
            SubstreamKey::new().district(district.0).piece(piece).salt(salt),
        );
        rng.unit()
    }

    fn gain_success_effect(
        res: &Resolved,
        config: &ActionConfig,
        pool: u32,
        seed: u64,
        turn: u64,
    ) -> (i32, String, bool) {
        match res.tier {
            OutcomeTier::Success => {
                if pool >= 1 {
                    (1, "influence gain: success".into(), false)
                } else {
                    (0, "pool exhausted before this success could draw".into(), true)
                }
            }
            OutcomeTier::CritSuccess => {
                let mut rng = Rng::substream(
                    seed,
                    turn,
                    EFFECT_TAG,
                    SubstreamKey::new().piece(res.roll.piece.0),
                );
                if rng.bool(config.gain_crit_success_double_prob) {
                    if pool >= 2 {
                        (2, "influence gain: critical success, double".into(), false)
                    } else if pool >= 1 {
                        (1, "influence gain: critical success, pool-limited to +1".into(), false)
                    } else {
                        (0, "pool exhausted before this critical success could draw".into(), true)
                    }
                } else if pool >= 1 {
                    (1, "influence gain: critical success, single".into(), false)
                } else {
                    (0, "pool exhausted before this critical success could draw".into(), true)
                }
            }
            _ => (0, String::new(), false),
        }
    }

    fn gain_failure_effect(
        res: &Resolved,
        world: &WorldView,
        config: &ActionConfig,
        seed: u64,
        turn: u64,
    ) -> (i32, String) {
        if res.tier != OutcomeTier::CritFail {
            return (0, "influence gain: fail, no effect".into());
        }
        let current = world.district(res.roll.district).map(|d| d.influence_of(res.roll.faction)).unwrap_or(0);
        if current == 0 {
            return (0, "critical failure with no influence to lose".into());
        }
        let mut rng = Rng::substream(seed, turn, EFFECT_TAG, SubstreamKey::new().piece(res.roll.piece.0));
        if rng.bool(config.gain_crit_fail_loss_prob) {
            (-1, "influence gain: critical failure, self-loss".into())
        } else {
            (0, "influence gain: critical failure, no effect".into())
        }
    }

    fn take_success_effect(
        res: &Resolved,
        config: &ActionConfig,
        pool: u32,
        seed: u64,
        turn: u64,
    ) -> (i32, i32, String) {
        let mut rng = Rng::substream(seed, turn, EFFECT_TAG, SubstreamKey::new().piece(res.roll.piece.0));
        match res.tier {
            OutcomeTier::Success => {
                if rng.bool(config.take_success_apply_prob) {
                    (1, -1, "influence take: success".into())
                } else {
                    (0, 0, "influence take: success roll did not convert".into())
                }
            }
            OutcomeTier::CritSuccess => {
                let remainder = (1.0
                    - config.take_crit_success_double_both_prob
                    - config.take_crit_success_double_self_only_prob)
                    .max(0.0);
                let branch = rng.choose(&[
                    config.take_crit_success_double_both_prob,
                    config.take_crit_success_double_self_only_prob,
                    remainder,
                ]);
                match branch {
                    0 => (2, -2, "influence take: critical success, double both".into()),
                    1 => {
                        if pool >= 2 {
                            (2, -1, "influence take: critical success, double self".into())
                        } else {
                            (1, -1, "influence take: critical success, pool-limited self".into())
                        }
                    }
                    _ => (1, -1, "influence take: critical success, single".into()),
                }
            }
            _ => (0, 0, String::new()),
        }
    }

    fn take_failure_effect(
        res: &Resolved,
        world: &WorldView,
        config: &ActionConfig,
        seed: u64,
        turn: u64,
    ) -> (i32, i32, String) {
        if res.tier != OutcomeTier::CritFail {
            return (0, 0, "influence take: fail, no effect".into());
        }
        let self_current = world.district(res.roll.district).map(|d| d.influence_of(res.roll.faction)).unwrap_or(0);
        let mut rng = Rng::substream(seed, turn, EFFECT_TAG, SubstreamKey::new().piece(res.roll.piece.0));
        if self_current == 0 || !rng.bool(config.take_crit_fail_self_loss_prob) {
            return (0, 0, "influence take: critical failure, no effect".into());
        }
        let pool = world.district(res.roll.district).map(|d| d.pool()).unwrap_or(0);
        if pool >= 1 && rng.bool(config.take_crit_fail_target_gain_prob) {
            (-1, 1, "influence take: critical failure, self-loss and target gain".into())
        } else {
            (-1, 0, "influence take: critical failure, self-loss only".into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::penalty::PenaltyTracker;
    use fte_types::{fixtures, Assignment, FactionId, PieceId};

    fn sample_world() -> WorldView {
        let (f1, f2) = fixtures::sample_factions();
        WorldView::new(
            [fixtures::sample_district(), fixtures::sample_adjacent_district()],
            [f1, f2],
            [fixtures::sample_agent(1, FactionId(1))
                .with_district(fte_types::DistrictId(1))],
            1,
        )
    }

    #[test]
    fn gain_dc_at_zero_influence_and_likeability() {
        let world = sample_world();
        let config = crate::config::EngineConfig::default().action;
        let district = world.district(fte_types::DistrictId(1)).unwrap();
        let dc = ActionResolver::gain_dc(&config, district, FactionId(1));
        // likeability 0 (fixture default) + band modifier at influence 0 (+3).
        assert_eq!(dc, 14);
    }

    #[test]
    fn roll_phase_skips_monitor_tasks() {
        let world = sample_world();
        let penalties = PenaltyTracker::compute(&world, &crate::config::EngineConfig::default().penalty, 1);
        let assignments = vec![Assignment::new(
            PieceId(1),
            fte_types::DistrictId(1),
            Task::Monitor,
            0,
        )];
        let config = crate::config::EngineConfig::default().action;
        let rolls = ActionResolver::roll(&world, &assignments, &penalties, &config, 1);
        assert!(rolls.is_empty());
    }

    #[test]
    fn roll_phase_computes_gain_dc_and_tier() {
        let world = sample_world();
        let penalties = PenaltyTracker::compute(&world, &crate::config::EngineConfig::default().penalty, 1);
        let assignments = vec![Assignment::new(
            PieceId(1),
            fte_types::DistrictId(1),
            Task::InfluenceGain,
            0,
        )];
        let config = crate::config::EngineConfig::default().action;
        let rolls = ActionResolver::roll(&world, &assignments, &penalties, &config, 1);
        assert_eq!(rolls.len(), 1);
        assert!(rolls[0].dc.is_some());
    }
}
