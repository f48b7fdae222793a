//! Social edges between citizens.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use tracing::{debug, warn};

use crate::error::{SimError, SimResult};
use crate::id::CitizenId;
use crate::model::{
    Citizen, LifeEvent, LifeEventKind, SimDate, SocialKind, SocialRelation, Trait, clamp_signed,
};
use crate::sim::registry::CitizenRegistry;

// --- Constants ---

/// No citizen gains new edges through bulk formation beyond this many.
pub const MAX_RELATIONS: usize = 20;
/// Candidates must be within this many years of age.
const MAX_AGE_GAP: u32 = 20;
/// Pairs must score above this to become friends.
const FRIENDSHIP_THRESHOLD: f64 = 30.0;
const SAME_PROFESSION_BONUS: f64 = 20.0;
const SAME_CLASS_BONUS: f64 = 15.0;
/// Candidates a citizen considers per formation pass.
const CANDIDATES_PER_PASS: usize = 5;

fn has_any_edge(registry: &CitizenRegistry, a: CitizenId, b: CitizenId) -> SimResult<bool> {
    let ca = registry.living(a)?;
    let cb = registry.living(b)?;
    Ok(ca.relation_to(b).is_some() || cb.relation_to(a).is_some())
}

fn link(
    registry: &mut CitizenRegistry,
    a: CitizenId,
    b: CitizenId,
    kind: SocialKind,
    strength: f64,
    date: SimDate,
) -> SimResult<()> {
    if a == b {
        return Err(SimError::Validation(format!(
            "citizen {a} cannot relate to themselves"
        )));
    }
    if has_any_edge(registry, a, b)? {
        warn!(%a, %b, %kind, "relationship already exists");
        return Err(SimError::RelationshipExists { a, b });
    }
    let strength = clamp_signed(strength);
    let event_kind = match kind {
        SocialKind::Enemy | SocialKind::Rival => LifeEventKind::MadeEnemy,
        _ => LifeEventKind::Befriended,
    };
    let cap = registry.settings().max_life_events;
    for (from, to) in [(a, b), (b, a)] {
        let other_name = registry.citizen(to)?.name().to_string();
        let citizen = registry.living_mut(from)?;
        citizen.relations.push(SocialRelation {
            kind,
            citizen_id: to,
            strength,
            since_year: date.year(),
        });
        citizen.record(
            LifeEvent::new(date, event_kind, format!("Became {kind} of {other_name}")),
            cap,
        );
    }
    debug!(%a, %b, %kind, strength, "relationship formed");
    Ok(())
}

/// Mutual friendship. Fails if either side already has any edge to the other.
pub fn create_friendship(
    registry: &mut CitizenRegistry,
    a: CitizenId,
    b: CitizenId,
    strength: f64,
    date: SimDate,
) -> SimResult<()> {
    link(registry, a, b, SocialKind::Friend, strength.abs(), date)
}

/// Mutual enmity. Fails if either side already has any edge to the other.
pub fn create_enmity(
    registry: &mut CitizenRegistry,
    a: CitizenId,
    b: CitizenId,
    strength: f64,
    date: SimDate,
) -> SimResult<()> {
    link(registry, a, b, SocialKind::Enemy, -strength.abs(), date)
}

/// Shift the strength of `from`'s edge to `to` and re-derive its kind from
/// the new value alone. Only that one direction changes.
pub fn update_relationship(
    registry: &mut CitizenRegistry,
    from: CitizenId,
    to: CitizenId,
    delta: f64,
) -> SimResult<SocialRelation> {
    let citizen = registry.living_mut(from)?;
    let edge = citizen
        .relations
        .iter_mut()
        .find(|r| r.citizen_id == to)
        .ok_or(SimError::RelationshipNotFound { from, to })?;
    edge.strength = clamp_signed(edge.strength + delta);
    edge.kind = SocialKind::from_strength(edge.strength);
    Ok(edge.clone())
}

/// How well two citizens would get along.
pub fn compatibility(a: &Citizen, b: &Citizen) -> f64 {
    let trait_gap: f64 = Trait::ALL
        .iter()
        .map(|t| (a.personality().get(*t) - b.personality().get(*t)).abs())
        .sum();
    let mut score = 100.0 - trait_gap / 3.0;
    if a.profession() == b.profession() {
        score += SAME_PROFESSION_BONUS;
    }
    if a.social_class() == b.social_class() {
        score += SAME_CLASS_BONUS;
    }
    score
}

/// Bulk friendship formation among neighbours of similar age.
/// Returns how many friendships formed.
pub fn generate_social_relations(
    registry: &mut CitizenRegistry,
    rng: &mut dyn RngCore,
    date: SimDate,
) -> usize {
    let mut formed = 0;
    for id in registry.alive_ids() {
        let Some(citizen) = registry.get(id) else {
            continue;
        };
        if !citizen.is_alive() || citizen.relations().len() >= MAX_RELATIONS {
            continue;
        }
        let mut candidates: Vec<CitizenId> = registry
            .in_region(citizen.region_id())
            .into_iter()
            .filter(|other| {
                other.id() != id
                    && other.age().abs_diff(citizen.age()) <= MAX_AGE_GAP
                    && other.relations().len() < MAX_RELATIONS
                    && citizen.relation_to(other.id()).is_none()
                    && other.relation_to(id).is_none()
            })
            .map(|other| other.id())
            .collect();
        candidates.shuffle(&mut *rng);
        candidates.truncate(CANDIDATES_PER_PASS);

        for other in candidates {
            let (Some(a), Some(b)) = (registry.get(id), registry.get(other)) else {
                continue;
            };
            if a.relations().len() >= MAX_RELATIONS || b.relations().len() >= MAX_RELATIONS {
                continue;
            }
            let score = compatibility(a, b);
            if score > FRIENDSHIP_THRESHOLD
                && rng.random_bool(0.5)
                && create_friendship(registry, id, other, score.min(100.0), date).is_ok()
            {
                formed += 1;
            }
        }
    }
    debug!(formed, "social relations generated");
    formed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::RegionId;
    use crate::model::{Gender, Profession};
    use crate::testutil::{date, populated_registry, seeded_rng, spawn};

    fn pair() -> (CitizenRegistry, CitizenId, CitizenId) {
        let mut registry = CitizenRegistry::new();
        let a = spawn(&mut registry, "Bertram Vogel", Gender::Male, 30, Profession::Farmer, RegionId(1));
        let b = spawn(&mut registry, "Elsbeth Keller", Gender::Female, 28, Profession::Farmer, RegionId(1));
        (registry, a, b)
    }

    #[test]
    fn friendship_is_mutual() {
        let (mut registry, a, b) = pair();
        create_friendship(&mut registry, a, b, 60.0, date(1450, 1)).unwrap();
        for (x, y) in [(a, b), (b, a)] {
            let edge = registry.citizen(x).unwrap().relation_to(y).unwrap().clone();
            assert_eq!(edge.kind, SocialKind::Friend);
            assert_eq!(edge.strength, 60.0);
            assert_eq!(edge.since_year, 1450);
        }
    }

    #[test]
    fn any_existing_edge_blocks_a_new_one() {
        let (mut registry, a, b) = pair();
        create_friendship(&mut registry, a, b, 60.0, date(1450, 1)).unwrap();
        assert_eq!(
            create_enmity(&mut registry, b, a, 60.0, date(1450, 2)),
            Err(SimError::RelationshipExists { a: b, b: a })
        );
        assert_eq!(registry.citizen(a).unwrap().relations().len(), 1);
    }

    #[test]
    fn enmity_has_negative_strength() {
        let (mut registry, a, b) = pair();
        create_enmity(&mut registry, a, b, 45.0, date(1450, 1)).unwrap();
        let edge = registry.citizen(a).unwrap().relation_to(b).unwrap();
        assert_eq!(edge.kind, SocialKind::Enemy);
        assert_eq!(edge.strength, -45.0);
    }

    #[test]
    fn update_clamps_and_reclassifies_one_side() {
        let (mut registry, a, b) = pair();
        create_friendship(&mut registry, a, b, 40.0, date(1450, 1)).unwrap();
        let edge = update_relationship(&mut registry, a, b, -20.0).unwrap();
        assert_eq!(edge.kind, SocialKind::Colleague);
        let edge = update_relationship(&mut registry, a, b, -500.0).unwrap();
        assert_eq!(edge.strength, -100.0);
        assert_eq!(edge.kind, SocialKind::Enemy);
        assert_eq!(
            registry.citizen(b).unwrap().relation_to(a).unwrap().kind,
            SocialKind::Friend
        );
        assert_eq!(
            update_relationship(&mut registry, a, CitizenId(99), 1.0).unwrap_err(),
            SimError::RelationshipNotFound { from: a, to: CitizenId(99) }
        );
    }

    #[test]
    fn self_relationships_are_rejected() {
        let (mut registry, a, _) = pair();
        assert!(matches!(
            create_friendship(&mut registry, a, a, 50.0, date(1450, 1)),
            Err(SimError::Validation(_))
        ));
    }

    #[test]
    fn compatibility_rewards_likeness() {
        let (mut registry, a, b) = pair();
        for t in Trait::ALL {
            registry.set_personality_trait(a, *t, 50.0).unwrap();
            registry.set_personality_trait(b, *t, 50.0).unwrap();
        }
        let score = compatibility(registry.citizen(a).unwrap(), registry.citizen(b).unwrap());
        assert_eq!(score, 135.0);
        registry.set_personality_trait(b, Trait::Courage, 80.0).unwrap();
        let score = compatibility(registry.citizen(a).unwrap(), registry.citizen(b).unwrap());
        assert_eq!(score, 125.0);
    }

    #[test]
    fn bulk_formation_respects_region_age_and_cap() {
        let mut registry = populated_registry(120, 9);
        let mut rng = seeded_rng(9);
        let mut total = 0;
        for year in 1450..1470 {
            total += generate_social_relations(&mut registry, &mut rng, date(year, 1));
        }
        assert!(total > 0);
        for c in registry.all() {
            assert!(c.relations().len() <= MAX_RELATIONS);
            for edge in c.relations() {
                let other = registry.citizen(edge.citizen_id).unwrap();
                assert_eq!(other.region_id(), c.region_id());
                assert!(other.age().abs_diff(c.age()) <= MAX_AGE_GAP);
                assert!(edge.strength > FRIENDSHIP_THRESHOLD && edge.strength <= 100.0);
            }
        }
    }
}
