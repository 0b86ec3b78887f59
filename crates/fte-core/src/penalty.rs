//! Phase 3 (compute) / phases 5 & 7 (consume): enemy-piece penalties
//! against targets in the same or an adjacent district (§4.6).
//!
//! Computed once per turn and held constant through the rest of the
//! pipeline — a later phase never re-derives penalties mid-resolution.

use crate::config::PenaltyConfig;
use crate::rng::{Rng, SubstreamKey};
use crate::world::WorldView;
use fte_types::{Piece, PieceId, Relationship};
use std::collections::BTreeMap;

const PHASE_TAG: &str = "penalty";

pub struct PenaltyTracker {
    penalties: BTreeMap<PieceId, i32>,
}

impl PenaltyTracker {
    /// Computes every penalty for the turn in one pass, in ascending
    /// piece-id order for both the agent and squadron rules.
    pub fn compute(world: &WorldView, config: &PenaltyConfig, seed: u64) -> Self {
        let mut penalties: BTreeMap<PieceId, i32> = BTreeMap::new();
        let turn = world.turn();

        for piece in world.pieces().filter(|p| p.is_agent()) {
            let Some(district) = piece.district else { continue };
            let faction = world
                .faction(piece.faction)
                .expect("assigned piece references a known faction");

            let mut candidates: Vec<&Piece> = world
                .pieces_in_district(district)
                .filter(|t| t.faction != piece.faction)
                .filter(|t| faction.relationship_with(t.faction).is_hostile())
                .collect();
            if candidates.is_empty() {
                continue;
            }
            let best_tier = candidates
                .iter()
                .map(|t| faction.relationship_with(t.faction).value())
                .min()
                .expect("non-empty candidates");
            candidates.retain(|t| faction.relationship_with(t.faction).value() == best_tier);

            let agent_candidates: Vec<&Piece> =
                candidates.iter().filter(|t| t.is_agent()).copied().collect();
            let pool: &[&Piece] = if !agent_candidates.is_empty() {
                &agent_candidates
            } else {
                &candidates
            };

            let mut rng = Rng::substream(
                seed,
                turn,
                PHASE_TAG,
                SubstreamKey::new().piece(piece.id.0),
            );
            let chosen = *rng.pick_uniform(pool).expect("non-empty pool");
            let amount = if best_tier == Relationship::Hostile.value() {
                config.agent_penalty_hostile
            } else {
                config.agent_penalty_unfriendly
            };
            *penalties.entry(chosen.id).or_insert(0) += amount;
        }

        for piece in world.pieces().filter(|p| p.is_squadron()) {
            let Some(district) = piece.district else { continue };
            let mobility = piece.kind.mobility() as usize;
            let Some(&(same_slots, adjacent_slots, either_slots)) =
                config.mobility_slots.get(mobility)
            else {
                continue;
            };
            if same_slots == 0 && adjacent_slots == 0 && either_slots == 0 {
                continue;
            }
            let faction = world
                .faction(piece.faction)
                .expect("assigned piece references a known faction");
            let home = world.district(district).expect("assigned piece references a known district");

            // Squadron-before-agent priority (reverse of the agent rule);
            // ties broken by ascending piece id, which the spec's "then
            // random" tie-break never actually reaches once id is in the
            // key, since ids are unique.
            let sort_key = |t: &&Piece| {
                (
                    faction.relationship_with(t.faction).value(),
                    if t.is_squadron() { 0u8 } else { 1u8 },
                    t.id.0,
                )
            };

            let mut same: Vec<&Piece> = world
                .pieces_in_district(district)
                .filter(|t| t.faction != piece.faction)
                .filter(|t| faction.relationship_with(t.faction).is_hostile())
                .collect();
            same.sort_by_key(sort_key);

            let mut adjacent: Vec<&Piece> = world
                .pieces()
                .filter(|t| t.faction != piece.faction)
                .filter(|t| t.district.is_some_and(|d| home.is_adjacent_to(d)))
                .filter(|t| faction.relationship_with(t.faction).is_hostile())
                .collect();
            adjacent.sort_by_key(sort_key);

            let mut chosen_ids = std::collections::BTreeSet::new();
            let mut selections: Vec<&Piece> = Vec::new();
            for t in same.iter().take(same_slots as usize) {
                chosen_ids.insert(t.id);
                selections.push(t);
            }
            for t in adjacent.iter().take(adjacent_slots as usize) {
                if chosen_ids.insert(t.id) {
                    selections.push(t);
                }
            }
            if either_slots > 0 {
                let mut rest: Vec<&Piece> = same
                    .iter()
                    .chain(adjacent.iter())
                    .filter(|t| !chosen_ids.contains(&t.id))
                    .copied()
                    .collect();
                rest.sort_by_key(sort_key);
                rest.dedup_by_key(|t| t.id);
                for t in rest.into_iter().take(either_slots as usize) {
                    chosen_ids.insert(t.id);
                    selections.push(t);
                }
            }

            for t in selections {
                let tier = faction.relationship_with(t.faction).value();
                let amount = if tier == Relationship::Hostile.value() {
                    config.squadron_penalty_hostile
                } else {
                    config.squadron_penalty_unfriendly
                };
                *penalties.entry(t.id).or_insert(0) += amount;
            }
        }

        Self { penalties }
    }

    pub fn penalty_for(&self, piece: PieceId) -> i32 {
        self.penalties.get(&piece).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use fte_types::{fixtures, DistrictId, FactionId, PieceId, Relationship};

    #[test]
    fn neutral_factions_apply_no_penalty() {
        let (f1, f2) = fixtures::sample_factions();
        let p1 = fixtures::sample_agent(1, FactionId(1)).with_district(DistrictId(1));
        let p2 = fixtures::sample_agent(2, FactionId(2)).with_district(DistrictId(1));
        let world = WorldView::new(
            [fixtures::sample_district(), fixtures::sample_adjacent_district()],
            [f1, f2],
            [p1, p2],
            1,
        );
        let tracker = PenaltyTracker::compute(&world, &EngineConfig::default().penalty, 1);
        assert_eq!(tracker.penalty_for(PieceId(2)), 0);
    }

    #[test]
    fn hostile_agent_penalizes_single_target() {
        let (mut f1, f2) = fixtures::sample_factions();
        f1.set_relationship(FactionId(2), Relationship::Hostile);
        let p1 = fixtures::sample_agent(1, FactionId(1)).with_district(DistrictId(1));
        let p2 = fixtures::sample_agent(2, FactionId(2)).with_district(DistrictId(1));
        let world = WorldView::new(
            [fixtures::sample_district(), fixtures::sample_adjacent_district()],
            [f1, f2],
            [p1, p2],
            1,
        );
        let tracker = PenaltyTracker::compute(&world, &EngineConfig::default().penalty, 1);
        assert_eq!(tracker.penalty_for(PieceId(2)), -4);
    }
}
