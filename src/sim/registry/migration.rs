use rand::{Rng, RngCore};
use tracing::debug;

use super::CitizenRegistry;
use crate::error::{SimError, SimResult};
use crate::id::{CitizenId, RegionId};
use crate::model::{LifeEvent, LifeEventKind, SimDate, clamp_stat};

// --- Constants ---

/// Attractiveness of a region nobody has rated.
pub const DEFAULT_ATTRACTIVENESS: f64 = 50.0;

/// Below this mean need level a citizen wants to leave.
const POOR_NEEDS_THRESHOLD: f64 = 40.0;
/// Above this mean need level (and attractiveness) a citizen wants to stay.
const CONTENT_THRESHOLD: f64 = 60.0;
const UNATTRACTIVE_THRESHOLD: f64 = 40.0;

/// Caps of the randomized monthly desire deltas.
const POOR_NEEDS_PUSH: f64 = 10.0;
const UNATTRACTIVE_PUSH: f64 = 8.0;
const CONTENT_PULL: f64 = 10.0;
const YOUTH_PUSH: f64 = 5.0;
const FAMILY_TIE_PER_MEMBER: f64 = 2.0;
const FAMILY_TIE_MAX: f64 = 10.0;

const MOBILE_AGES: std::ops::RangeInclusive<u32> = 18..=35;

impl CitizenRegistry {
    pub fn region_attractiveness(&self, region: RegionId) -> f64 {
        self.region_attractiveness
            .get(&region)
            .copied()
            .unwrap_or(DEFAULT_ATTRACTIVENESS)
    }

    pub fn set_region_attractiveness(&mut self, region: RegionId, value: f64) {
        self.region_attractiveness.insert(region, clamp_stat(value));
    }

    /// Move a living citizen to another region.
    ///
    /// Spends `migration_step` of desire (floored at 0) and logs one
    /// `Migrated` event. Moving to the current region is a no-op.
    pub fn migrate_citizen(&mut self, id: CitizenId, to: RegionId, date: SimDate) -> SimResult<()> {
        let step = self.settings.migration_step;
        let cap = self.settings.max_life_events;
        let citizen = self.living_mut(id)?;
        let from = citizen.region_id;
        if from == to {
            return Ok(());
        }
        citizen.region_id = to;
        citizen.migration_desire = (citizen.migration_desire - step).max(0.0);
        citizen.record(
            LifeEvent::new(
                date,
                LifeEventKind::Migrated,
                format!("Moved from region {from} to region {to}"),
            ),
            cap,
        );

        if let Some(ids) = self.by_region.get_mut(&from) {
            ids.remove(&id);
        }
        self.by_region.entry(to).or_default().insert(id);
        debug!(citizen_id = %id, %from, %to, "citizen migrated");
        Ok(())
    }

    /// Re-evaluate how much a citizen wants to leave their region.
    /// Returns the new desire.
    pub fn update_migration_desire(
        &mut self,
        id: CitizenId,
        rng: &mut dyn RngCore,
    ) -> SimResult<f64> {
        let attractiveness = {
            let region = self.living(id)?.region_id;
            self.region_attractiveness(region)
        };
        let citizen = self.living_mut(id)?;
        let needs = citizen.needs.mean();

        let mut delta = 0.0;
        if needs < POOR_NEEDS_THRESHOLD {
            delta += rng.random_range(0.0..POOR_NEEDS_PUSH);
        }
        if attractiveness < UNATTRACTIVE_THRESHOLD {
            delta += rng.random_range(0.0..UNATTRACTIVE_PUSH);
        }
        if needs > CONTENT_THRESHOLD && attractiveness > CONTENT_THRESHOLD {
            delta -= rng.random_range(0.0..CONTENT_PULL);
        }
        if MOBILE_AGES.contains(&citizen.age) {
            delta += rng.random_range(0.0..YOUTH_PUSH);
        }
        let family_size = citizen.family.len() as f64;
        if family_size > 0.0 {
            delta -= (family_size * rng.random_range(0.0..FAMILY_TIE_PER_MEMBER)).min(FAMILY_TIE_MAX);
        }

        citizen.migration_desire = clamp_stat(citizen.migration_desire + delta);
        Ok(citizen.migration_desire)
    }

    /// Living citizens whose desire has reached `threshold`.
    pub fn migration_candidates(&self, threshold: f64) -> Vec<CitizenId> {
        self.alive()
            .filter(|c| c.migration_desire >= threshold)
            .map(|c| c.id)
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn set_migration_desire(&mut self, id: CitizenId, desire: f64) -> SimResult<()> {
        let citizen = self
            .citizens
            .get_mut(&id)
            .ok_or(SimError::CitizenNotFound(id))?;
        citizen.migration_desire = clamp_stat(desire);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Gender, Need, Profession};
    use crate::sim::registry::NewCitizen;
    use crate::testutil::{date, seeded_rng};

    fn one_citizen(age: u32) -> (CitizenRegistry, CitizenId) {
        let mut registry = CitizenRegistry::new();
        let mut rng = seeded_rng(11);
        let id = registry
            .create_citizen(
                NewCitizen::new("Tobias Keller", Gender::Male, age, Profession::Laborer, RegionId(1)),
                date(1450, 1),
                &mut rng,
            )
            .unwrap();
        (registry, id)
    }

    #[test]
    fn migrate_moves_index_and_spends_desire() {
        let (mut registry, id) = one_citizen(25);
        registry.set_migration_desire(id, 70.0).unwrap();
        let events_before = registry.citizen(id).unwrap().life_events().len();

        registry.migrate_citizen(id, RegionId(2), date(1450, 3)).unwrap();

        let c = registry.citizen(id).unwrap();
        assert_eq!(c.region_id(), RegionId(2));
        assert_eq!(c.origin_region_id(), RegionId(1));
        assert_eq!(c.migration_desire(), 20.0);
        assert_eq!(c.life_events().len(), events_before + 1);
        assert_eq!(c.life_events().last().unwrap().kind, LifeEventKind::Migrated);
        assert!(registry.in_region(RegionId(1)).is_empty());
        assert_eq!(registry.in_region(RegionId(2)).len(), 1);
    }

    #[test]
    fn migrate_floors_desire_at_zero() {
        let (mut registry, id) = one_citizen(25);
        registry.set_migration_desire(id, 30.0).unwrap();
        registry.migrate_citizen(id, RegionId(3), date(1450, 3)).unwrap();
        assert_eq!(registry.citizen(id).unwrap().migration_desire(), 0.0);
    }

    #[test]
    fn migrate_rejects_the_dead() {
        let (mut registry, id) = one_citizen(25);
        registry.mark_dead(id, date(1450, 2), "plague");
        assert_eq!(
            registry.migrate_citizen(id, RegionId(2), date(1450, 3)),
            Err(SimError::CitizenDeceased(id))
        );
    }

    #[test]
    fn hardship_raises_desire() {
        let (mut registry, id) = one_citizen(25);
        for need in Need::ALL {
            registry.set_need(id, *need, 5.0).unwrap();
        }
        registry.set_region_attractiveness(RegionId(1), 10.0);
        let mut rng = seeded_rng(3);
        let mut desire = 0.0;
        for _ in 0..20 {
            desire = registry.update_migration_desire(id, &mut rng).unwrap();
        }
        assert!(desire > 50.0, "desire was {desire}");
        assert!(desire <= 100.0);
    }

    #[test]
    fn contentment_lowers_desire() {
        let (mut registry, id) = one_citizen(50);
        for need in Need::ALL {
            registry.set_need(id, *need, 95.0).unwrap();
        }
        registry.set_region_attractiveness(RegionId(1), 90.0);
        registry.set_migration_desire(id, 60.0).unwrap();
        let mut rng = seeded_rng(4);
        for _ in 0..30 {
            registry.update_migration_desire(id, &mut rng).unwrap();
        }
        assert!(registry.citizen(id).unwrap().migration_desire() < 60.0);
    }

    #[test]
    fn unknown_regions_are_neutral() {
        let registry = CitizenRegistry::new();
        assert_eq!(registry.region_attractiveness(RegionId(9)), DEFAULT_ATTRACTIVENESS);
    }

    #[test]
    fn candidates_are_living_citizens_at_the_threshold() {
        let (mut registry, restless) = one_citizen(25);
        let mut rng = seeded_rng(12);
        let settled = registry
            .create_citizen(
                NewCitizen::new("Ursula Keller", Gender::Female, 30, Profession::Craftsman, RegionId(1)),
                date(1450, 1),
                &mut rng,
            )
            .unwrap();
        let departed = registry
            .create_citizen(
                NewCitizen::new("Konrad Keller", Gender::Male, 60, Profession::Laborer, RegionId(1)),
                date(1450, 1),
                &mut rng,
            )
            .unwrap();
        registry.set_migration_desire(restless, 80.0).unwrap();
        registry.set_migration_desire(settled, 10.0).unwrap();
        registry.set_migration_desire(departed, 90.0).unwrap();
        registry.mark_dead(departed, date(1450, 2), "old age");

        assert_eq!(registry.migration_candidates(80.0), vec![restless]);
        assert!(registry.migration_candidates(95.0).is_empty());
    }
}
