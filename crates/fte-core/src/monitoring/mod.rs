//! Phases 9 & 10: the seven-tier (eight, including Abysmal) monitoring
//! pipeline — detection, accuracy error, phantoms, total adjustment,
//! stronghold perception, DC-modifier discovery, and confidence (§4.4).

mod tables;

use crate::config::MonitoringConfig;
use crate::rng::{Rng, SubstreamKey};
use crate::world::WorldView;
use fte_types::{
    Assignment, DcDiscovery, DistrictId, FactionId, MonitoringReport, PerceivedFaction, PieceKind,
    QualityTier, Task,
};
use std::collections::{BTreeMap, BTreeSet};

const ACTIVE_TAG: &str = "monitor_active";
const PASSIVE_TAG: &str = "monitor_passive";
const DETECT_TAG: &str = "monitor_detect";

pub struct MonitoringEngine;

/// One roll contributing to a (observer, district) report.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Source {
    faction: FactionId,
    district: DistrictId,
    roll: i32,
}

impl MonitoringEngine {
    /// Phase 9: agent primary, squadron primary, and squadron secondary
    /// monitoring rolls, in ascending piece-id order.
    pub(crate) fn active_sources(world: &WorldView, assignments: &[Assignment], seed: u64) -> Vec<Source> {
        let turn = world.turn();
        let mut pieces: Vec<_> = world.pieces().collect();
        pieces.sort_by_key(|p| p.id.0);

        let mut sources = Vec::new();
        for piece in pieces {
            let Some(district_id) = piece.district else { continue };
            let Some(district) = world.district(district_id) else { continue };
            let assignment = assignments.iter().find(|a| a.piece == piece.id);
            let mut rng = Rng::substream(seed, turn, ACTIVE_TAG, SubstreamKey::new().piece(piece.id.0));

            let roll = match (&piece.kind, assignment.map(|a| &a.task)) {
                (PieceKind::Agent(a), Some(Task::Monitor)) => {
                    let manual = assignment.map(|a| a.manual_modifier as i32).unwrap_or(0);
                    rng.d20()
                        + a.attribute(district.monitoring.attribute) as i32
                        + a.skill(district.monitoring.skill) as i32
                        + manual
                }
                (PieceKind::Squadron(s), Some(Task::Monitor)) => {
                    let manual = assignment.map(|a| a.manual_modifier as i32).unwrap_or(0);
                    rng.d20() + s.aptitude(district.monitoring.aptitude) as i32 + manual
                }
                (PieceKind::Squadron(s), _) => {
                    let roll = rng.d20().min(rng.d20());
                    roll + s.aptitude(district.monitoring.aptitude) as i32
                }
                _ => continue,
            };
            sources.push(Source { faction: piece.faction, district: district_id, roll });
        }
        sources
    }

    /// Phase 10: one faction-passive roll per (faction, district) where
    /// the faction holds influence >= 4, run after active monitoring.
    pub(crate) fn passive_sources(world: &WorldView, seed: u64) -> Vec<Source> {
        let turn = world.turn();
        let mut sources = Vec::new();
        for district in world.districts() {
            for faction in district.present_factions() {
                let v = district.influence_of(faction);
                if v < 4 {
                    continue;
                }
                let bonus = world.faction(faction).map_or(0, |f| f.monitoring_bonus);
                let mut rng = Rng::substream(
                    seed,
                    turn,
                    PASSIVE_TAG,
                    SubstreamKey::new().district(district.id.0).faction(faction.0),
                );
                let roll = rng.d20() + (v / 2) as i32 + bonus;
                sources.push(Source { faction, district: district.id, roll });
            }
        }
        sources
    }

    /// Builds one report per (observer, district) pair with at least one
    /// source, running the full detection/accuracy/phantom/adjustment/
    /// stronghold/dc/confidence pipeline.
    pub(crate) fn build_reports(
        active: &[Source],
        passive: &[Source],
        world: &WorldView,
        config: &MonitoringConfig,
        seed: u64,
    ) -> Vec<MonitoringReport> {
        let turn = world.turn();
        let mut grouped: BTreeMap<(DistrictId, FactionId), Vec<i32>> = BTreeMap::new();
        for s in active.iter().chain(passive.iter()) {
            grouped.entry((s.district, s.faction)).or_default().push(s.roll);
        }

        let mut reports = Vec::with_capacity(grouped.len());
        for ((district_id, observer), rolls) in grouped {
            let Some(district) = world.district(district_id) else { continue };
            let highest_roll = *rolls.iter().max().expect("non-empty group");
            let tier = QualityTier::from_roll(highest_roll);

            let mut detected: BTreeMap<FactionId, u8> = BTreeMap::new();
            for (idx, &roll) in rolls.iter().enumerate() {
                let source_tier = QualityTier::from_roll(roll);
                let accuracy = config.accuracy.get(source_tier);
                for present in district.present_factions() {
                    if present == observer || detected.contains_key(&present) {
                        continue;
                    }
                    let v = district.influence_of(present);
                    let prob = tables::detection_probability(config, source_tier, roll, v);
                    let mut drng = Rng::substream(
                        seed,
                        turn,
                        DETECT_TAG,
                        SubstreamKey::new().district(district_id.0).faction(present.0).piece(observer.0).salt(idx as u64),
                    );
                    if drng.unit() > prob {
                        continue;
                    }
                    let error = tables::sample_accuracy_error(&accuracy, source_tier, roll, &mut drng);
                    let perceived = (v as i32 + error).clamp(1, 10) as u8;
                    detected.insert(present, perceived);
                }
            }

            let mut rng = Rng::substream(
                seed,
                turn,
                DETECT_TAG,
                SubstreamKey::new().district(district_id.0).faction(observer.0).salt(99),
            );

            let phantom_count = tables::sample_phantom_count(config, tier, highest_roll, &mut rng);
            let not_present: Vec<FactionId> = world
                .factions()
                .map(|f| f.id)
                .filter(|&f| f != observer && district.influence_of(f) == 0)
                .collect();
            let mut phantoms: BTreeMap<FactionId, u8> = BTreeMap::new();
            if phantom_count > 0 && !not_present.is_empty() {
                let phantom_cfg = config.phantom.get(tier);
                let weights: Vec<f64> = not_present
                    .iter()
                    .map(|&f| {
                        let adjacent_present = district
                            .adjacent
                            .iter()
                            .filter_map(|&d| world.district(d))
                            .any(|d| d.influence_of(f) > 0);
                        1.0 + if adjacent_present { phantom_cfg.adjacency_bonus } else { 0.0 }
                    })
                    .collect();
                for _ in 0..phantom_count {
                    if weights.iter().all(|&w| w <= 0.0) {
                        break;
                    }
                    let idx = rng.choose(&weights);
                    let faction = not_present[idx];
                    if phantoms.contains_key(&faction) {
                        continue;
                    }
                    let value = tables::sample_phantom_value(config, &mut rng);
                    phantoms.insert(faction, value);
                }
            }

            Self::adjust_total(&mut detected, &mut phantoms, &mut rng);

            let mut correctly_identified_strongholds = BTreeSet::new();
            let mut false_strongholds = BTreeSet::new();
            let stronghold_cfg = config.stronghold.get(tier);
            for &stronghold_faction in &district.stronghold {
                if !detected.contains_key(&stronghold_faction) {
                    continue;
                }
                let prob = stronghold_cfg.correct_id_prob.at(highest_roll, tables::tier_floor_roll(tier));
                if rng.unit() <= prob.clamp(0.0, 1.0) {
                    correctly_identified_strongholds.insert(stronghold_faction);
                } else if rng.bool(stronghold_cfg.false_stronghold_prob) {
                    let candidates: Vec<FactionId> = detected
                        .keys()
                        .copied()
                        .filter(|f| !district.has_stronghold(*f))
                        .collect();
                    if let Some(&chosen) = rng.pick_uniform(&candidates) {
                        false_strongholds.insert(chosen);
                    }
                }
            }

            let modifier = district.weekly_dc_modifier;
            let dc_discovery = if modifier == 0 {
                DcDiscovery::Nothing
            } else {
                let dc_cfg = config.dc_discovery.get(tier);
                let band = if modifier.abs() >= 2 { dc_cfg.magnitude_2 } else { dc_cfg.magnitude_1 };
                tables::sample_dc_discovery(&band, modifier, &mut rng)
            };

            let mut perceived: Vec<PerceivedFaction> = detected
                .iter()
                .map(|(&faction, &value)| PerceivedFaction { faction, value, phantom: false })
                .chain(phantoms.iter().map(|(&faction, &value)| PerceivedFaction { faction, value, phantom: true }))
                .collect();
            perceived.sort_by_key(|p| p.faction.0);

            reports.push(MonitoringReport {
                district: district_id,
                observer,
                turn,
                tier,
                highest_roll,
                perceived,
                correctly_identified_strongholds,
                false_strongholds,
                dc_discovery,
                confidence: tier.base_confidence(),
            });
        }
        reports
    }

    /// §4.4.4: caps the report's total perceived influence at 10 by
    /// uniformly decrementing any detected (real or phantom) faction
    /// still above its floor of 1. Only once every detected entry is
    /// pinned at that floor and the sum still exceeds 10 does it fall
    /// back to dropping phantom entries outright (lowest value, then
    /// uniform) — real entries are never removed.
    fn adjust_total(real: &mut BTreeMap<FactionId, u8>, phantoms: &mut BTreeMap<FactionId, u8>, rng: &mut Rng) {
        loop {
            let total: u32 = real.values().chain(phantoms.values()).map(|&v| v as u32).sum();
            if total <= 10 {
                return;
            }
            let mut above_floor: Vec<FactionId> =
                real.iter().filter(|(_, &v)| v > 1).map(|(&f, _)| f).collect();
            above_floor.extend(phantoms.iter().filter(|(_, &v)| v > 1).map(|(&f, _)| f));
            if let Some(&chosen) = rng.pick_uniform(&above_floor) {
                if let Some(v) = real.get_mut(&chosen) {
                    *v -= 1;
                } else if let Some(v) = phantoms.get_mut(&chosen) {
                    *v -= 1;
                }
                continue;
            }
            let Some(&lowest) = phantoms.values().min() else { return };
            let at_lowest: Vec<FactionId> =
                phantoms.iter().filter(|(_, &v)| v == lowest).map(|(&f, _)| f).collect();
            match rng.pick_uniform(&at_lowest) {
                Some(&chosen) => {
                    phantoms.remove(&chosen);
                }
                None => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use fte_types::fixtures;

    fn world() -> WorldView {
        let (f1, f2) = fixtures::sample_factions();
        let mut district = fixtures::sample_district();
        district.influence.insert(FactionId(1), 3);
        WorldView::new([district, fixtures::sample_adjacent_district()], [f1, f2], [], 1)
    }

    #[test]
    fn report_total_never_exceeds_ten() {
        let world = world();
        let config = EngineConfig::default().monitoring;
        let sources = vec![Source { faction: FactionId(2), district: DistrictId(1), roll: 28 }];
        let reports = MonitoringEngine::build_reports(&sources, &[], &world, &config, 7);
        for r in &reports {
            let total: u32 = r.perceived.iter().map(|p| p.value as u32).sum();
            assert!(total <= 10);
        }
    }

    #[test]
    fn phantom_disjoint_from_real_presence() {
        let world = world();
        let config = EngineConfig::default().monitoring;
        let sources = vec![Source { faction: FactionId(2), district: DistrictId(1), roll: 15 }];
        let reports = MonitoringEngine::build_reports(&sources, &[], &world, &config, 3);
        for r in &reports {
            for p in r.perceived.iter().filter(|p| p.phantom) {
                assert_eq!(world.district(r.district).unwrap().influence_of(p.faction), 0);
            }
        }
    }

    #[test]
    fn passive_source_requires_influence_of_four() {
        let world = world();
        let sources = MonitoringEngine::passive_sources(&world, 1);
        assert!(sources.is_empty());
    }
}
