//! Phases 4, 6, 7: conflict detection, ally-support enrollment, and
//! adjudication application (§4.7).

use crate::config::{ActionConfig, ConflictConfig};
use crate::error::{EngineError, EngineResult};
use crate::rng::{Rng, SubstreamKey};
use crate::world::WorldView;
use fte_types::{
    ActionRoll, Adjudication, Assignment, Conflict, ConflictId, ConflictKind, ConflictStatus,
    DistrictId, FactionId, FactionParticipant, FactionRole, OutcomeTier, PieceId,
    PieceParticipant, PieceParticipation, Task,
};
use std::collections::BTreeSet;

const PHASE_TAG: &str = "conflict";

pub struct ConflictEngine;

impl ConflictEngine {
    /// Phase 4: builds every conflict and its participant list. Rolls are
    /// filled in separately once phase 5 has run (see [`Self::attach_rolls`]).
    pub fn detect(world: &WorldView, assignments: &[Assignment], config: &ConflictConfig, seed: u64) -> Vec<Conflict> {
        let turn = world.turn();
        let mut enrolled: BTreeSet<PieceId> = BTreeSet::new();
        let mut conflicts: Vec<Conflict> = Vec::new();
        let mut next_id = 1u64;

        // Kind 1: manual, one per InitiateConflict assignment, in
        // ascending piece-id order.
        let mut manual: Vec<&Assignment> = assignments
            .iter()
            .filter(|a| matches!(a.task, Task::InitiateConflict { .. }))
            .collect();
        manual.sort_by_key(|a| a.piece.0);
        for a in manual {
            let Task::InitiateConflict { target, .. } = &a.task else { unreachable!() };
            if enrolled.contains(&a.piece) {
                continue;
            }
            let Some(initiator) = world.piece(a.piece) else { continue };
            let available_targets: Vec<PieceId> = world
                .pieces_in_district(a.district)
                .filter(|p| p.faction == *target && !enrolled.contains(&p.id))
                .map(|p| p.id)
                .collect();
            if available_targets.is_empty() {
                continue;
            }
            let mut conflict = Conflict::new(ConflictId(next_id), ConflictKind::Manual, a.district);
            next_id += 1;
            conflict.factions.push(FactionParticipant { faction: initiator.faction, role: FactionRole::Initiator });
            conflict.factions.push(FactionParticipant { faction: *target, role: FactionRole::Target });
            conflict.pieces.push(Self::participant(initiator.id, initiator.faction, PieceParticipation::Direct));
            enrolled.insert(initiator.id);
            for pid in available_targets {
                let p = world.piece(pid).expect("piece looked up above");
                conflict.pieces.push(Self::participant(p.id, p.faction, PieceParticipation::Direct));
                enrolled.insert(p.id);
            }
            Self::enroll_ally_support(world, &mut conflict, &mut enrolled);
            conflicts.push(conflict);
        }

        // Kind 2: relationship, by (district, faction-pair) ascending.
        let mut district_ids: Vec<DistrictId> = world.districts().map(|d| d.id).collect();
        district_ids.sort();
        for district_id in &district_ids {
            let mut present: Vec<FactionId> = world
                .pieces_in_district(*district_id)
                .map(|p| p.faction)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            present.sort();
            for i in 0..present.len() {
                for j in (i + 1)..present.len() {
                    let (a_faction, b_faction) = (present[i], present[j]);
                    let rel = world
                        .faction(a_faction)
                        .map_or(fte_types::Relationship::Neutral, |f| f.relationship_with(b_faction));
                    let prob = match rel {
                        fte_types::Relationship::Unfriendly => Some(config.relationship_unfriendly_prob),
                        fte_types::Relationship::Hostile => Some(config.relationship_hostile_prob),
                        _ => None,
                    };
                    let Some(prob) = prob else { continue };
                    let available_a: Vec<PieceId> = world
                        .pieces_in_district(*district_id)
                        .filter(|p| p.faction == a_faction && !enrolled.contains(&p.id))
                        .map(|p| p.id)
                        .collect();
                    let available_b: Vec<PieceId> = world
                        .pieces_in_district(*district_id)
                        .filter(|p| p.faction == b_faction && !enrolled.contains(&p.id))
                        .map(|p| p.id)
                        .collect();
                    if available_a.is_empty() || available_b.is_empty() {
                        continue;
                    }
                    let mut rng = Rng::substream(
                        seed,
                        turn,
                        PHASE_TAG,
                        SubstreamKey::new().district(district_id.0).faction(a_faction.0).salt(b_faction.0),
                    );
                    if !rng.bool(prob) {
                        continue;
                    }
                    let mut conflict = Conflict::new(ConflictId(next_id), ConflictKind::Relationship, *district_id);
                    next_id += 1;
                    conflict.factions.push(FactionParticipant { faction: a_faction, role: FactionRole::Initiator });
                    conflict.factions.push(FactionParticipant { faction: b_faction, role: FactionRole::Target });
                    for pid in available_a.into_iter().chain(available_b) {
                        let p = world.piece(pid).expect("piece looked up above");
                        conflict.pieces.push(Self::participant(p.id, p.faction, PieceParticipation::Direct));
                        enrolled.insert(p.id);
                    }
                    Self::enroll_ally_support(world, &mut conflict, &mut enrolled);
                    conflicts.push(conflict);
                }
            }
        }

        // Kind 3: target, two or more distinct factions taking from the
        // same third faction in the same district.
        let mut take_groups: std::collections::BTreeMap<(DistrictId, FactionId), Vec<PieceId>> = Default::default();
        for a in assignments {
            if let Task::InfluenceTake { target } = &a.task {
                if !enrolled.contains(&a.piece) {
                    take_groups.entry((a.district, *target)).or_default().push(a.piece);
                }
            }
        }
        for ((district_id, _victim), mut pieces) in take_groups {
            pieces.sort();
            let distinct_factions: BTreeSet<FactionId> = pieces
                .iter()
                .filter_map(|id| world.piece(*id))
                .map(|p| p.faction)
                .collect();
            if distinct_factions.len() < 2 {
                continue;
            }
            let pieces: Vec<PieceId> = pieces.into_iter().filter(|id| !enrolled.contains(id)).collect();
            if pieces.len() < 2 {
                continue;
            }
            let mut conflict = Conflict::new(ConflictId(next_id), ConflictKind::Target, district_id);
            next_id += 1;
            for faction in &distinct_factions {
                conflict.factions.push(FactionParticipant { faction: *faction, role: FactionRole::Initiator });
            }
            for pid in pieces {
                let p = world.piece(pid).expect("piece looked up above");
                conflict.pieces.push(Self::participant(p.id, p.faction, PieceParticipation::Direct));
                enrolled.insert(p.id);
            }
            Self::enroll_ally_support(world, &mut conflict, &mut enrolled);
            conflicts.push(conflict);
        }

        // Kind 4: adjacent squadrons joining an active conflict whose
        // faction already has a piece enrolled, rolling mobility-scaled.
        let mut adjacent_joins: Vec<(usize, PieceId, FactionId)> = Vec::new();
        for (idx, conflict) in conflicts.iter().enumerate() {
            let enrolled_factions = conflict.enrolled_factions();
            let mut squadrons: Vec<_> = world
                .pieces()
                .filter(|p| p.is_squadron() && enrolled_factions.contains(&p.faction) && !enrolled.contains(&p.id))
                .filter(|p| p.district.is_some_and(|d| d != conflict.district && world.district(conflict.district).is_some_and(|home| home.is_adjacent_to(d))))
                .collect();
            squadrons.sort_by_key(|p| p.id.0);
            for sq in squadrons {
                let mobility = sq.kind.mobility() as f64;
                let mut rng = Rng::substream(
                    seed,
                    turn,
                    PHASE_TAG,
                    SubstreamKey::new().district(conflict.district.0).piece(sq.id.0).salt(4),
                );
                if rng.bool(mobility * config.adjacent_join_prob_per_mobility) {
                    adjacent_joins.push((idx, sq.id, sq.faction));
                }
            }
        }
        for (idx, piece, faction) in adjacent_joins {
            if enrolled.contains(&piece) {
                continue;
            }
            conflicts[idx].pieces.push(Self::participant(piece, faction, PieceParticipation::Adjacent));
            enrolled.insert(piece);
        }

        conflicts
    }

    fn participant(piece: PieceId, faction: FactionId, participation: PieceParticipation) -> PieceParticipant {
        PieceParticipant { piece, faction, participation, roll: None, tier: None, intended_action: String::new() }
    }

    /// Enrolls, as `ally-support`, every faction's pieces in the conflict's
    /// district where that faction supports an already-enrolled faction.
    fn enroll_ally_support(world: &WorldView, conflict: &mut Conflict, enrolled: &mut BTreeSet<PieceId>) {
        let enrolled_factions = conflict.enrolled_factions();
        let mut allies: BTreeSet<FactionId> = BTreeSet::new();
        for faction in world.factions() {
            if enrolled_factions.contains(&faction.id) {
                continue;
            }
            if enrolled_factions.iter().any(|&target| faction.supports(target)) {
                allies.insert(faction.id);
            }
        }
        for ally in allies {
            conflict.factions.push(FactionParticipant { faction: ally, role: FactionRole::Ally });
            let pieces: Vec<PieceId> = world
                .pieces_in_district(conflict.district)
                .filter(|p| p.faction == ally && !enrolled.contains(&p.id))
                .map(|p| p.id)
                .collect();
            for pid in pieces {
                conflict.pieces.push(Self::participant(pid, ally, PieceParticipation::AllySupport));
                enrolled.insert(pid);
            }
        }
    }

    /// Fills in each conflict participant's roll, tier, and intended
    /// action label from phase 5's rolls.
    pub fn attach_rolls(conflicts: &mut [Conflict], rolls: &[ActionRoll]) {
        for conflict in conflicts {
            for participant in &mut conflict.pieces {
                if let Some(r) = rolls.iter().find(|r| r.piece == participant.piece) {
                    participant.roll = Some(r.post_penalty_roll);
                    participant.tier = Some(r.tier);
                    participant.intended_action = r.task.label().to_string();
                }
            }
        }
    }

    /// Resolves the open question around the InitiateConflict roll's
    /// 0.70/0.95 post-tier probabilities: conflict creation in phase 4 is
    /// unconditional, and these probabilities instead decide whether a
    /// manual conflict needs the Orchestrator's adjudication at all. If
    /// the initiator's phase-5 roll is Success or CritSuccess, a
    /// Bernoulli draw at the matching probability may auto-adjudicate the
    /// conflict (initiator wins, target loses) before the pause, sparing
    /// a clean win from a manual review. A miss leaves the conflict
    /// pending as normal.
    ///
    /// Call after [`Self::attach_rolls`] and before the pause bundle is
    /// assembled.
    pub fn auto_resolve_manual(conflicts: &mut [Conflict], world: &WorldView, config: &ActionConfig, seed: u64, turn: u64) {
        for conflict in conflicts {
            if conflict.kind != ConflictKind::Manual || conflict.status != ConflictStatus::Pending {
                continue;
            }
            let Some(initiator) = conflict
                .factions
                .iter()
                .find(|f| f.role == FactionRole::Initiator)
            else {
                continue;
            };
            let Some(piece) = conflict
                .pieces
                .iter()
                .find(|p| p.faction == initiator.faction && p.participation == PieceParticipation::Direct)
            else {
                continue;
            };
            let Some(tier) = piece.tier else { continue };
            let prob = match tier {
                OutcomeTier::Success => config.initiate_conflict_success_trigger_prob,
                OutcomeTier::CritSuccess => config.initiate_conflict_crit_success_trigger_prob,
                _ => continue,
            };
            let mut rng = Rng::substream(
                seed,
                turn,
                PHASE_TAG,
                SubstreamKey::new().district(conflict.district.0).piece(piece.piece.0).salt(5),
            );
            if !rng.bool(prob) {
                continue;
            }
            let target_faction = conflict.factions.iter().find(|f| f.role == FactionRole::Target).map(|f| f.faction);
            let Some(target_faction) = target_faction else { continue };
            let mut winners = BTreeSet::new();
            winners.insert(initiator.faction);
            let mut losers = BTreeSet::new();
            losers.insert(target_faction);
            for f in &conflict.factions {
                if f.role != FactionRole::Ally {
                    continue;
                }
                let supports_initiator = world.faction(f.faction).is_some_and(|fac| fac.supports(initiator.faction));
                if supports_initiator {
                    winners.insert(f.faction);
                } else {
                    losers.insert(f.faction);
                }
            }
            conflict.adjudication = Some(Adjudication {
                conflict_id: conflict.id,
                winners,
                losers,
                drawers: BTreeSet::new(),
                notes: "auto-resolved: clean initiator success".into(),
            });
            conflict.status = ConflictStatus::Resolved;
        }
    }

    /// Phase 6: validates an adjudication against its conflict's enrolled
    /// factions and records it, marking the conflict resolved.
    pub fn apply_adjudication(conflict: &mut Conflict, adjudication: Adjudication) -> EngineResult<()> {
        let enrolled = conflict.enrolled_factions();
        if !adjudication.partitions(&enrolled) {
            return Err(EngineError::AdjudicationInvalid(format!(
                "adjudication for conflict {} does not partition its enrolled factions",
                conflict.id
            )));
        }
        conflict.adjudication = Some(adjudication);
        conflict.status = ConflictStatus::Resolved;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use fte_types::{fixtures, Assignment, DistrictId, FactionId, PieceId};

    #[test]
    fn manual_conflict_requires_available_target_piece() {
        let (f1, f2) = fixtures::sample_factions();
        let initiator = fixtures::sample_agent(1, FactionId(1)).with_district(DistrictId(1));
        let world = WorldView::new(
            [fixtures::sample_district(), fixtures::sample_adjacent_district()],
            [f1, f2],
            [initiator],
            1,
        );
        let assignments = vec![Assignment::new(
            PieceId(1),
            DistrictId(1),
            Task::InitiateConflict {
                target: FactionId(2),
                dc: 15,
                check: fte_types::CheckKind::AttributeSkill {
                    attribute: fte_types::Attribute::Might,
                    skill: fte_types::Skill::Combat,
                },
                description: "duel".into(),
            },
            0,
        )];
        let conflicts = ConflictEngine::detect(&world, &assignments, &EngineConfig::default().conflict, 1);
        assert!(conflicts.is_empty());
    }

    #[test]
    fn manual_conflict_enrolls_target_pieces() {
        let (f1, f2) = fixtures::sample_factions();
        let initiator = fixtures::sample_agent(1, FactionId(1)).with_district(DistrictId(1));
        let defender = fixtures::sample_agent(2, FactionId(2)).with_district(DistrictId(1));
        let world = WorldView::new(
            [fixtures::sample_district(), fixtures::sample_adjacent_district()],
            [f1, f2],
            [initiator, defender],
            1,
        );
        let assignments = vec![Assignment::new(
            PieceId(1),
            DistrictId(1),
            Task::InitiateConflict {
                target: FactionId(2),
                dc: 15,
                check: fte_types::CheckKind::AttributeSkill {
                    attribute: fte_types::Attribute::Might,
                    skill: fte_types::Skill::Combat,
                },
                description: "duel".into(),
            },
            0,
        )];
        let conflicts = ConflictEngine::detect(&world, &assignments, &EngineConfig::default().conflict, 1);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].is_piece_enrolled(PieceId(1)));
        assert!(conflicts[0].is_piece_enrolled(PieceId(2)));
    }

    #[test]
    fn auto_resolve_leaves_non_success_conflicts_pending() {
        let (f1, f2) = fixtures::sample_factions();
        let mut conflict = Conflict::new(ConflictId(1), ConflictKind::Manual, DistrictId(1));
        conflict.factions.push(FactionParticipant { faction: FactionId(1), role: FactionRole::Initiator });
        conflict.factions.push(FactionParticipant { faction: FactionId(2), role: FactionRole::Target });
        conflict.pieces.push(PieceParticipant {
            piece: PieceId(1),
            faction: FactionId(1),
            participation: PieceParticipation::Direct,
            roll: Some(5),
            tier: Some(OutcomeTier::Fail),
            intended_action: "initiate_conflict".into(),
        });
        let world = WorldView::new(
            [fixtures::sample_district(), fixtures::sample_adjacent_district()],
            [f1, f2],
            [],
            1,
        );
        let config = EngineConfig::default().action;
        let mut conflicts = vec![conflict];
        ConflictEngine::auto_resolve_manual(&mut conflicts, &world, &config, 1, 1);
        assert_eq!(conflicts[0].status, ConflictStatus::Pending);
    }
}
