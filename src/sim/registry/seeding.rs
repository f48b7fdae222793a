use rand::{Rng, RngCore};
use tracing::info;

use super::{CitizenRegistry, NewCitizen};
use crate::error::{SimError, SimResult};
use crate::id::{CitizenId, FamilyId, RegionId};
use crate::model::{FamilyKind, Gender, LifeEventKind, Profession, SimDate, SocialClass};
use crate::sim::names::{generate_given_name, generate_surname};

/// Relative weight of each profession among seeded heads of household.
const PROFESSION_WEIGHTS: &[(Profession, u32)] = &[
    (Profession::Farmer, 35),
    (Profession::Laborer, 15),
    (Profession::Craftsman, 15),
    (Profession::Merchant, 10),
    (Profession::Soldier, 10),
    (Profession::Priest, 5),
    (Profession::Scholar, 5),
    (Profession::Noble, 5),
];

const MARRIAGE_CHANCE: f64 = 0.7;
const ROYAL_CHANCE: f64 = 0.1;
const MAX_CHILDREN: u32 = 4;
const MIN_PARENT_AGE_GAP: u32 = 16;

/// What `seed_population` created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedSummary {
    pub citizens: Vec<CitizenId>,
    pub families: usize,
}

fn pick_profession(rng: &mut dyn RngCore) -> Profession {
    let total: u32 = PROFESSION_WEIGHTS.iter().map(|(_, w)| w).sum();
    let mut roll = rng.random_range(0..total);
    for (profession, weight) in PROFESSION_WEIGHTS {
        if roll < *weight {
            return *profession;
        }
        roll -= weight;
    }
    Profession::Farmer
}

impl CitizenRegistry {
    /// Populate `num_regions` regions with `count` citizens grouped into
    /// households. Spouse and parent/child edges are written on both ends.
    pub fn seed_population(
        &mut self,
        count: u32,
        num_regions: u32,
        date: SimDate,
        rng: &mut dyn RngCore,
    ) -> SimResult<SeedSummary> {
        if num_regions == 0 {
            return Err(SimError::Validation("cannot seed zero regions".into()));
        }
        let mut summary = SeedSummary::default();
        while (summary.citizens.len() as u32) < count {
            let remaining = count - summary.citizens.len() as u32;
            let region = RegionId(u64::from(rng.random_range(1..=num_regions)));
            let household = self.seed_household(region, remaining, date, rng)?;
            summary.citizens.extend(household);
            summary.families += 1;
        }
        info!(
            citizens = summary.citizens.len(),
            families = summary.families,
            regions = num_regions,
            "population seeded"
        );
        Ok(summary)
    }

    fn seed_household(
        &mut self,
        region: RegionId,
        budget: u32,
        date: SimDate,
        rng: &mut dyn RngCore,
    ) -> SimResult<Vec<CitizenId>> {
        let family_id: FamilyId = self.family_ids.next_id();
        let surname = generate_surname(rng);
        let profession = pick_profession(rng);
        let class = match profession {
            Profession::Noble if rng.random_bool(ROYAL_CHANCE) => SocialClass::Royal,
            other => other.default_class(),
        };

        let mut members = Vec::new();
        let head_gender = if rng.random_bool(0.5) { Gender::Male } else { Gender::Female };
        let head_age = rng.random_range(20..50);
        let head = self.create_citizen(
            NewCitizen::new(
                format!("{} {surname}", generate_given_name(head_gender, rng)),
                head_gender,
                head_age,
                profession,
                region,
            )
            .in_family(family_id)
            .with_class(class),
            date,
            rng,
        )?;
        members.push(head);

        let mut youngest_parent = head_age;
        if members.len() < budget as usize && rng.random_bool(MARRIAGE_CHANCE) {
            let spouse_gender = match head_gender {
                Gender::Male => Gender::Female,
                Gender::Female => Gender::Male,
            };
            let spouse_age = (head_age + rng.random_range(0..=10)).saturating_sub(5).max(18);
            let spouse = self.create_citizen(
                NewCitizen::new(
                    format!("{} {surname}", generate_given_name(spouse_gender, rng)),
                    spouse_gender,
                    spouse_age,
                    pick_profession(rng),
                    region,
                )
                .in_family(family_id)
                .with_class(class),
                date,
                rng,
            )?;
            self.add_family_relation(head, FamilyKind::Spouse, spouse)?;
            self.add_family_relation(spouse, FamilyKind::Spouse, head)?;
            members.push(spouse);
            youngest_parent = youngest_parent.min(spouse_age);
        }
        let parents = members.clone();

        if youngest_parent > MIN_PARENT_AGE_GAP {
            let max_child_age = youngest_parent - MIN_PARENT_AGE_GAP;
            let children = rng.random_range(0..=MAX_CHILDREN);
            for _ in 0..children {
                if members.len() >= budget as usize {
                    break;
                }
                let gender = if rng.random_bool(0.5) { Gender::Male } else { Gender::Female };
                let child = self.create_citizen(
                    NewCitizen::new(
                        format!("{} {surname}", generate_given_name(gender, rng)),
                        gender,
                        rng.random_range(0..=max_child_age),
                        profession,
                        region,
                    )
                    .in_family(family_id)
                    .with_class(class),
                    date,
                    rng,
                )?;
                for parent in &parents {
                    self.add_family_relation(*parent, FamilyKind::Child, child)?;
                    self.add_family_relation(child, FamilyKind::Parent, *parent)?;
                }
                for sibling in &members[parents.len()..] {
                    self.add_family_relation(*sibling, FamilyKind::Sibling, child)?;
                    self.add_family_relation(child, FamilyKind::Sibling, *sibling)?;
                }
                members.push(child);
            }
        }
        Ok(members)
    }

    /// Create a newborn for `mother`, linked to both parents and to the
    /// mother's other children. The monthly tick never calls this; births
    /// there only produce a `BirthDue` signal.
    pub fn create_child(
        &mut self,
        mother: CitizenId,
        father: Option<CitizenId>,
        gender: Gender,
        date: SimDate,
        rng: &mut dyn RngCore,
    ) -> SimResult<CitizenId> {
        let (region, family_id, class, profession, surname, siblings) = {
            let m = self.living(mother)?;
            let surname = m.name.rsplit(' ').next().unwrap_or(&m.name).to_string();
            (
                m.region_id,
                m.family_id,
                m.social_class,
                m.profession,
                surname,
                m.children().collect::<Vec<_>>(),
            )
        };
        let profession = match father {
            Some(f) => self.citizen(f)?.profession,
            None => profession,
        };

        let child = self.create_citizen(
            NewCitizen::new(
                format!("{} {surname}", generate_given_name(gender, rng)),
                gender,
                0,
                profession,
                region,
            )
            .in_family(family_id)
            .with_class(class)
            .born_in_month(date.month()),
            date,
            rng,
        )?;

        for parent in std::iter::once(mother).chain(father) {
            self.add_family_relation(parent, FamilyKind::Child, child)?;
            self.add_family_relation(child, FamilyKind::Parent, parent)?;
        }
        for sibling in siblings {
            self.add_family_relation(sibling, FamilyKind::Sibling, child)?;
            self.add_family_relation(child, FamilyKind::Sibling, sibling)?;
        }
        let name = self.citizen(child)?.name.clone();
        self.record_event(mother, date, LifeEventKind::GaveBirth, format!("Gave birth to {name}"))?;
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{date, seeded_rng};

    #[test]
    fn seeds_exact_count_across_regions() {
        let mut registry = CitizenRegistry::new();
        let mut rng = seeded_rng(42);
        let summary = registry.seed_population(120, 3, date(1450, 1), &mut rng).unwrap();
        assert_eq!(summary.citizens.len(), 120);
        assert_eq!(registry.population(), 120);
        assert!(summary.families > 1);
        for c in registry.all() {
            assert!((1..=3).contains(&c.region_id().0));
        }
    }

    #[test]
    fn seeded_families_have_mirrored_edges() {
        let mut registry = CitizenRegistry::new();
        let mut rng = seeded_rng(7);
        registry.seed_population(80, 2, date(1450, 1), &mut rng).unwrap();
        for c in registry.all() {
            for edge in c.family() {
                let other = registry.citizen(edge.citizen_id).unwrap();
                let inverse = match edge.kind {
                    FamilyKind::Spouse => FamilyKind::Spouse,
                    FamilyKind::Child => FamilyKind::Parent,
                    FamilyKind::Parent => FamilyKind::Child,
                    FamilyKind::Sibling => FamilyKind::Sibling,
                    kind => panic!("unexpected seeded edge {kind}"),
                };
                assert!(
                    other
                        .family()
                        .iter()
                        .any(|e| e.kind == inverse && e.citizen_id == c.id()),
                    "missing inverse of {} edge {} -> {}",
                    edge.kind,
                    c.id(),
                    other.id()
                );
                assert_eq!(other.family_id(), c.family_id());
            }
        }
    }

    #[test]
    fn zero_regions_is_rejected() {
        let mut registry = CitizenRegistry::new();
        let mut rng = seeded_rng(1);
        assert!(registry.seed_population(10, 0, date(1450, 1), &mut rng).is_err());
    }

    #[test]
    fn create_child_links_parents_and_siblings() {
        let mut registry = CitizenRegistry::new();
        let mut rng = seeded_rng(5);
        let d = date(1450, 4);
        let mother = registry
            .create_citizen(
                NewCitizen::new("Gisela Schmid", Gender::Female, 26, Profession::Farmer, RegionId(2)),
                d,
                &mut rng,
            )
            .unwrap();
        let father = registry
            .create_citizen(
                NewCitizen::new("Conrad Schmid", Gender::Male, 28, Profession::Craftsman, RegionId(2)),
                d,
                &mut rng,
            )
            .unwrap();
        let first = registry
            .create_child(mother, Some(father), Gender::Male, d, &mut rng)
            .unwrap();
        let second = registry
            .create_child(mother, Some(father), Gender::Female, d, &mut rng)
            .unwrap();

        let baby = registry.citizen(second).unwrap();
        assert_eq!(baby.age(), 0);
        assert_eq!(baby.birth(), d);
        assert!(baby.name().ends_with("Schmid"));
        assert_eq!(baby.profession(), Profession::Craftsman);
        assert_eq!(baby.region_id(), RegionId(2));
        assert!(baby.family().iter().any(|e| e.kind == FamilyKind::Sibling && e.citizen_id == first));
        assert_eq!(registry.citizen(mother).unwrap().children().count(), 2);
        assert_eq!(registry.citizen(father).unwrap().children().count(), 2);
    }
}
