//! The citizen registry: sole owner of every citizen record and its indices.
//!
//! Other engines hold only ids and go through the registry for every read and
//! write, so a mutation is visible to all of them immediately.

mod migration;
mod seeding;

use std::collections::{BTreeMap, BTreeSet};

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::signal::{Signal, SignalKind};
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::id::{CitizenId, FamilyId, IdGenerator, PlayerId, RegionId};
use crate::model::citizen::PREGNANCY_MONTHS;
use crate::model::{
    Citizen, FamilyKind, FamilyRelation, Gender, HealthStatus, LifeEvent, LifeEventKind, Need,
    Needs, Personality, Pregnancy, Profession, SimDate, Skill, Skills, SocialClass, Trait,
    clamp_signed, clamp_stat,
};

pub use seeding::SeedSummary;

/// Age at which a citizen's health starts to fail on its own.
const FRAILTY_AGE: u32 = 60;

/// Input for `CitizenRegistry::create_citizen`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCitizen {
    pub name: String,
    pub gender: Gender,
    pub age: u32,
    pub profession: Profession,
    pub region_id: RegionId,
    /// Joins an existing family when set; otherwise a new family is founded.
    pub family_id: Option<FamilyId>,
    /// Defaults to the profession's class.
    pub social_class: Option<SocialClass>,
    /// 1–12. Random when unset.
    pub birth_month: Option<u32>,
}

impl NewCitizen {
    pub fn new(
        name: impl Into<String>,
        gender: Gender,
        age: u32,
        profession: Profession,
        region_id: RegionId,
    ) -> Self {
        Self {
            name: name.into(),
            gender,
            age,
            profession,
            region_id,
            family_id: None,
            social_class: None,
            birth_month: None,
        }
    }

    pub fn in_family(mut self, family_id: FamilyId) -> Self {
        self.family_id = Some(family_id);
        self
    }

    pub fn with_class(mut self, class: SocialClass) -> Self {
        self.social_class = Some(class);
        self
    }

    pub fn born_in_month(mut self, month: u32) -> Self {
        self.birth_month = Some(month);
        self
    }
}

/// Registry tunables, taken from `SimConfig`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistrySettings {
    pub max_need_decay: f64,
    pub migration_step: f64,
    pub max_life_events: usize,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self::from(&SimConfig::default())
    }
}

impl From<&SimConfig> for RegistrySettings {
    fn from(config: &SimConfig) -> Self {
        Self {
            max_need_decay: config.max_need_decay,
            migration_step: config.migration_step,
            max_life_events: config.max_life_events,
        }
    }
}

/// Serializable copy of the whole registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub citizens: Vec<Citizen>,
    pub region_attractiveness: Vec<(RegionId, f64)>,
    pub next_citizen_id: u64,
    pub next_family_id: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CitizenRegistry {
    citizens: BTreeMap<CitizenId, Citizen>,
    by_region: BTreeMap<RegionId, BTreeSet<CitizenId>>,
    by_family: BTreeMap<FamilyId, BTreeSet<CitizenId>>,
    region_attractiveness: BTreeMap<RegionId, f64>,
    citizen_ids: IdGenerator,
    family_ids: IdGenerator,
    settings: RegistrySettings,
}

impl CitizenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: RegistrySettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    pub fn new_family_id(&mut self) -> FamilyId {
        self.family_ids.next_id()
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create a citizen with randomized starting state and index it.
    pub fn create_citizen(
        &mut self,
        spec: NewCitizen,
        date: SimDate,
        rng: &mut dyn RngCore,
    ) -> SimResult<CitizenId> {
        if spec.name.trim().is_empty() {
            return Err(SimError::Validation("citizen name cannot be empty".into()));
        }
        if let Some(month) = spec.birth_month
            && !(1..=12).contains(&month)
        {
            return Err(SimError::Validation(format!(
                "birth month out of range: {month}"
            )));
        }
        let birth_month = spec.birth_month.unwrap_or_else(|| rng.random_range(1..=12));
        let had_birthday = birth_month <= date.month();
        let years_back = spec.age + u32::from(!had_birthday);
        if years_back > date.year() {
            return Err(SimError::Validation(format!(
                "age {} predates year 0 at {date}",
                spec.age
            )));
        }
        let birth = SimDate::new(date.year() - years_back, birth_month);

        let id: CitizenId = self.citizen_ids.next_id();
        let family_id = spec.family_id.unwrap_or_else(|| self.family_ids.next_id());
        let social_class = spec
            .social_class
            .unwrap_or_else(|| spec.profession.default_class());
        let income = spec.profession.income_at(0);

        let fertility = if (15..=49).contains(&spec.age) {
            rng.random_range(40.0..90.0)
        } else {
            rng.random_range(0.0..15.0)
        };

        let mut citizen = Citizen {
            id,
            name: spec.name,
            gender: spec.gender,
            age: spec.age,
            birth,
            death: None,
            alive: true,
            last_aged_year: birth.year() + spec.age,
            profession: spec.profession,
            profession_level: 0,
            income,
            wealth: income * rng.random_range(2.0..12.0),
            region_id: spec.region_id,
            home_id: None,
            origin_region_id: spec.region_id,
            migration_desire: 0.0,
            family_id,
            family: Vec::new(),
            relations: Vec::new(),
            reputation: clamp_signed(
                rng.random_range(-10.0..30.0) + social_class.prominence() * 0.2,
            ),
            social_class,
            health: HealthStatus {
                overall: rng.random_range(60.0..100.0),
                diseases: Vec::new(),
                immunity: rng.random_range(20.0..60.0),
                fertility,
                pregnancy: None,
                immune_to: BTreeSet::new(),
            },
            needs: Needs::new(std::array::from_fn(|_| rng.random_range(50.0..100.0))),
            happiness: 0.0,
            personality: Personality::new(std::array::from_fn(|_| rng.random_range(10.0..90.0))),
            skills: starting_skills(spec.profession, spec.age, rng),
            is_player_character: false,
            controlling_player: None,
            life_events: Vec::new(),
        };
        citizen.recompute_happiness();
        citizen.record(
            LifeEvent::new(
                birth,
                LifeEventKind::Born,
                format!("Born in region {}", spec.region_id),
            ),
            self.settings.max_life_events,
        );

        self.by_region.entry(spec.region_id).or_default().insert(id);
        self.by_family.entry(family_id).or_default().insert(id);
        self.citizens.insert(id, citizen);
        debug!(citizen_id = %id, region = %spec.region_id, "citizen created");
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub fn get(&self, id: CitizenId) -> Option<&Citizen> {
        self.citizens.get(&id)
    }

    pub fn citizen(&self, id: CitizenId) -> SimResult<&Citizen> {
        self.citizens.get(&id).ok_or(SimError::CitizenNotFound(id))
    }

    /// The citizen, provided it exists and is alive.
    pub fn living(&self, id: CitizenId) -> SimResult<&Citizen> {
        let citizen = self.citizen(id)?;
        if !citizen.alive {
            return Err(SimError::CitizenDeceased(id));
        }
        Ok(citizen)
    }

    pub(crate) fn get_mut(&mut self, id: CitizenId) -> Option<&mut Citizen> {
        self.citizens.get_mut(&id)
    }

    pub(crate) fn living_mut(&mut self, id: CitizenId) -> SimResult<&mut Citizen> {
        let citizen = self
            .citizens
            .get_mut(&id)
            .ok_or(SimError::CitizenNotFound(id))?;
        if !citizen.alive {
            return Err(SimError::CitizenDeceased(id));
        }
        Ok(citizen)
    }

    /// Every citizen ever created, dead ones included.
    pub fn all(&self) -> impl Iterator<Item = &Citizen> {
        self.citizens.values()
    }

    pub fn alive(&self) -> impl Iterator<Item = &Citizen> {
        self.citizens.values().filter(|c| c.alive)
    }

    pub fn alive_ids(&self) -> Vec<CitizenId> {
        self.alive().map(|c| c.id).collect()
    }

    /// Living citizens currently in the region.
    pub fn in_region(&self, region: RegionId) -> Vec<&Citizen> {
        self.by_region
            .get(&region)
            .into_iter()
            .flatten()
            .filter_map(|id| self.citizens.get(id))
            .filter(|c| c.alive)
            .collect()
    }

    /// All members of a family, the dead included.
    pub fn family_members(&self, family: FamilyId) -> Vec<&Citizen> {
        self.by_family
            .get(&family)
            .into_iter()
            .flatten()
            .filter_map(|id| self.citizens.get(id))
            .collect()
    }

    pub fn regions(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.by_region.keys().copied()
    }

    /// Number of living citizens.
    pub fn population(&self) -> usize {
        self.alive().count()
    }

    pub fn region_population(&self, region: RegionId) -> usize {
        self.in_region(region).len()
    }

    /// Number of citizens ever created.
    pub fn total_count(&self) -> usize {
        self.citizens.len()
    }

    // -----------------------------------------------------------------------
    // Player control
    // -----------------------------------------------------------------------

    pub fn assign_player_control(&mut self, id: CitizenId, player: PlayerId) -> SimResult<()> {
        let citizen = self.living_mut(id).inspect_err(|e| {
            warn!(citizen_id = %id, player = %player, error = %e, "player control rejected");
        })?;
        if let Some(other) = citizen.controlling_player
            && other != player
        {
            warn!(citizen_id = %id, player = %player, "citizen already controlled by {other}");
            return Err(SimError::AlreadyControlled {
                citizen: id,
                player: other,
            });
        }
        citizen.is_player_character = true;
        citizen.controlling_player = Some(player);
        Ok(())
    }

    /// Clear the player flags. Works on dead citizens too.
    pub fn remove_player_control(&mut self, id: CitizenId) -> SimResult<()> {
        let citizen = self
            .citizens
            .get_mut(&id)
            .ok_or(SimError::CitizenNotFound(id))?;
        citizen.is_player_character = false;
        citizen.controlling_player = None;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------------

    /// Add to wealth, flooring at zero. Returns the new wealth.
    pub fn adjust_wealth(&mut self, id: CitizenId, delta: f64) -> SimResult<f64> {
        let citizen = self.living_mut(id)?;
        citizen.wealth = (citizen.wealth + delta).max(0.0);
        Ok(citizen.wealth)
    }

    pub fn adjust_reputation(&mut self, id: CitizenId, delta: f64) -> SimResult<f64> {
        let citizen = self.living_mut(id)?;
        citizen.reputation = clamp_signed(citizen.reputation + delta);
        citizen.recompute_happiness();
        Ok(citizen.reputation)
    }

    pub fn set_need(&mut self, id: CitizenId, need: Need, value: f64) -> SimResult<()> {
        let citizen = self.living_mut(id)?;
        citizen.needs.set(need, value);
        citizen.recompute_happiness();
        Ok(())
    }

    pub fn adjust_need(&mut self, id: CitizenId, need: Need, delta: f64) -> SimResult<f64> {
        let citizen = self.living_mut(id)?;
        citizen.needs.adjust(need, delta);
        citizen.recompute_happiness();
        Ok(citizen.needs.get(need))
    }

    pub fn set_health(&mut self, id: CitizenId, overall: f64) -> SimResult<()> {
        let citizen = self.living_mut(id)?;
        citizen.health.overall = clamp_stat(overall);
        citizen.recompute_happiness();
        Ok(())
    }

    pub fn set_immunity(&mut self, id: CitizenId, immunity: f64) -> SimResult<()> {
        self.living_mut(id)?.health.immunity = clamp_stat(immunity);
        Ok(())
    }

    pub fn set_personality_trait(
        &mut self,
        id: CitizenId,
        which: Trait,
        value: f64,
    ) -> SimResult<()> {
        self.living_mut(id)?.personality.set(which, value);
        Ok(())
    }

    pub fn set_skill(&mut self, id: CitizenId, skill: Skill, value: f64) -> SimResult<()> {
        self.living_mut(id)?.skills.set(skill, value);
        Ok(())
    }

    pub fn set_home(&mut self, id: CitizenId, home: Option<u64>) -> SimResult<()> {
        self.living_mut(id)?.home_id = home;
        Ok(())
    }

    pub fn set_social_class(&mut self, id: CitizenId, class: SocialClass) -> SimResult<()> {
        self.living_mut(id)?.social_class = class;
        Ok(())
    }

    /// Add a directed family edge on `id` only. The inverse edge is the
    /// caller's business.
    pub fn add_family_relation(
        &mut self,
        id: CitizenId,
        kind: FamilyKind,
        other: CitizenId,
    ) -> SimResult<()> {
        if id == other {
            return Err(SimError::Validation(format!(
                "citizen {id} cannot be their own {kind}"
            )));
        }
        self.citizen(other)?;
        let citizen = self
            .citizens
            .get_mut(&id)
            .ok_or(SimError::CitizenNotFound(id))?;
        let edge = FamilyRelation {
            kind,
            citizen_id: other,
        };
        if !citizen.family.contains(&edge) {
            citizen.family.push(edge);
        }
        Ok(())
    }

    pub fn record_event(
        &mut self,
        id: CitizenId,
        date: SimDate,
        kind: LifeEventKind,
        description: impl Into<String>,
    ) -> SimResult<()> {
        let cap = self.settings.max_life_events;
        let citizen = self
            .citizens
            .get_mut(&id)
            .ok_or(SimError::CitizenNotFound(id))?;
        citizen.record(LifeEvent::new(date, kind, description), cap);
        Ok(())
    }

    pub fn start_pregnancy(&mut self, id: CitizenId, date: SimDate) -> SimResult<()> {
        let cap = self.settings.max_life_events;
        let citizen = self.living_mut(id)?;
        if citizen.gender != Gender::Female {
            return Err(SimError::Validation(format!(
                "citizen {id} cannot carry a pregnancy"
            )));
        }
        if citizen.health.pregnancy.is_some() {
            return Err(SimError::Validation(format!("citizen {id} is already pregnant")));
        }
        citizen.health.pregnancy = Some(Pregnancy {
            conceived: date,
            month: 0,
        });
        citizen.record(
            LifeEvent::new(date, LifeEventKind::Conceived, "Expecting a child"),
            cap,
        );
        Ok(())
    }

    /// Switch profession: level resets to 0 and income follows the new trade.
    pub fn change_profession(
        &mut self,
        id: CitizenId,
        profession: Profession,
        date: SimDate,
    ) -> SimResult<()> {
        let cap = self.settings.max_life_events;
        let citizen = self.living_mut(id)?;
        let old = citizen.profession;
        citizen.profession = profession;
        citizen.profession_level = 0;
        citizen.recompute_income();
        citizen.record(
            LifeEvent::new(
                date,
                LifeEventKind::ProfessionChanged,
                format!("Left work as {old} to become a {profession}"),
            ),
            cap,
        );
        debug!(citizen_id = %id, %old, new = %profession, "profession changed");
        Ok(())
    }

    /// Raise (or lower) the profession level, capped at 0–100. Returns the new level.
    pub fn advance_profession(
        &mut self,
        id: CitizenId,
        delta: i32,
        date: SimDate,
    ) -> SimResult<u8> {
        let cap = self.settings.max_life_events;
        let citizen = self.living_mut(id)?;
        let old = citizen.profession_level;
        let level = (i32::from(old) + delta).clamp(0, 100) as u8;
        citizen.profession_level = level;
        citizen.recompute_income();
        if level > old {
            citizen.record(
                LifeEvent::new(
                    date,
                    LifeEventKind::Promoted,
                    format!("Rose to level {level} as {}", citizen.profession),
                ),
                cap,
            );
        }
        Ok(level)
    }

    /// Terminal transition alive → deceased. Returns false if already dead.
    pub(crate) fn mark_dead(&mut self, id: CitizenId, date: SimDate, cause: &str) -> bool {
        let cap = self.settings.max_life_events;
        let Some(citizen) = self.citizens.get_mut(&id) else {
            return false;
        };
        if !citizen.alive {
            return false;
        }
        citizen.alive = false;
        citizen.death = Some(date);
        citizen.health.pregnancy = None;
        citizen.is_player_character = false;
        citizen.controlling_player = None;
        citizen.record(
            LifeEvent::new(date, LifeEventKind::Died, format!("Died of {cause}")),
            cap,
        );
        debug!(citizen_id = %id, %cause, "citizen died");
        true
    }

    // -----------------------------------------------------------------------
    // Monthly tick
    // -----------------------------------------------------------------------

    /// Age, decay needs, drift health, recompute happiness and carry
    /// pregnancies for every living citizen.
    pub fn tick_month(&mut self, date: SimDate, rng: &mut dyn RngCore) -> Vec<Signal> {
        let max_decay = self.settings.max_need_decay;
        let cap = self.settings.max_life_events;
        let mut signals = Vec::new();

        for citizen in self.citizens.values_mut().filter(|c| c.alive) {
            if date.month() == citizen.birth.month() && date.year() > citizen.last_aged_year {
                citizen.age += 1;
                citizen.last_aged_year = date.year();
            }

            for need in Need::ALL {
                let decay = rng.random_range(0.0..=max_decay);
                citizen.needs.adjust(*need, -decay);
            }

            let critical = citizen.critical_needs();
            let mut health = citizen.health.overall;
            if critical < 30.0 {
                health -= rng.random_range(1.0..5.0);
            } else if critical > 70.0 {
                health += rng.random_range(0.0..2.0);
            }
            if citizen.age > FRAILTY_AGE {
                let years_past = f64::from(citizen.age - FRAILTY_AGE);
                health -= rng.random_range(0.0..1.0) * (1.0 + years_past / 10.0);
            }
            citizen.health.overall = clamp_stat(health);
            citizen.recompute_happiness();

            if let Some(pregnancy) = citizen.health.pregnancy.as_mut() {
                pregnancy.month += 1;
                if pregnancy.month >= PREGNANCY_MONTHS {
                    citizen.health.pregnancy = None;
                    citizen.record(
                        LifeEvent::new(date, LifeEventKind::GaveBirth, "Gave birth"),
                        cap,
                    );
                    signals.push(Signal {
                        date,
                        kind: SignalKind::BirthDue {
                            mother_id: citizen.id,
                        },
                    });
                }
            }
        }
        signals
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            citizens: self.citizens.values().cloned().collect(),
            region_attractiveness: self
                .region_attractiveness
                .iter()
                .map(|(r, v)| (*r, *v))
                .collect(),
            next_citizen_id: self.citizen_ids.peek(),
            next_family_id: self.family_ids.peek(),
        }
    }

    /// Rebuild a registry, indices included, from a snapshot.
    pub fn restore(snapshot: RegistrySnapshot, settings: RegistrySettings) -> Self {
        let mut registry = Self::with_settings(settings);
        registry.citizen_ids = IdGenerator::starting_from(snapshot.next_citizen_id);
        registry.family_ids = IdGenerator::starting_from(snapshot.next_family_id);
        registry.region_attractiveness = snapshot.region_attractiveness.into_iter().collect();
        for citizen in snapshot.citizens {
            registry
                .by_region
                .entry(citizen.region_id)
                .or_default()
                .insert(citizen.id);
            registry
                .by_family
                .entry(citizen.family_id)
                .or_default()
                .insert(citizen.id);
            registry.citizens.insert(citizen.id, citizen);
        }
        registry
    }
}

/// Baseline skills plus a bonus in the skills the profession trains.
fn starting_skills(profession: Profession, age: u32, rng: &mut dyn RngCore) -> Skills {
    let mut skills = Skills::new(std::array::from_fn(|_| rng.random_range(0.0..20.0)));
    let experience = f64::from(age.min(40)) / 2.0;
    for (rank, skill) in profession.favored_skills().iter().enumerate() {
        let bonus = if rank == 0 {
            rng.random_range(20.0..40.0)
        } else {
            rng.random_range(10.0..20.0)
        };
        skills.adjust(*skill, bonus + experience);
    }
    skills
}
