//! Births, deaths, epidemics and famines.

mod epidemic;
mod stats;

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::context::TickContext;
use super::registry::CitizenRegistry;
use super::signal::{DeathCause, SignalKind};
use super::system::{SimSystem, TickFrequency};
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::id::{CitizenId, DiseaseId, FamineId, IdGenerator, RegionId};
use crate::model::{Disease, DiseaseParams, Famine, SimDate};

pub use stats::{AGE_BAND_WIDTH, AgeBand, AgePyramid, NUM_AGE_BANDS, PopulationStatistics};

// --- Constants ---

/// Age-factor multipliers of the monthly mortality chance.
const INFANT_RISK: f64 = 5.0;
const CHILD_RISK: f64 = 2.0;
const ELDER_BASE_RISK: f64 = 2.0;
const ELDER_RISK_PER_YEAR: f64 = 0.2;
const ELDER_AGE: u32 = 60;

/// Extra risk per disease carried.
const DISEASE_RISK: f64 = 0.5;

/// Critical-need thresholds and their multipliers.
const DESPERATE_NEEDS: f64 = 20.0;
const DESPERATE_RISK: f64 = 3.0;
const POOR_NEEDS: f64 = 40.0;
const POOR_RISK: f64 = 1.5;

/// Mortality chances are compared against a uniform draw over this range.
const MORTALITY_ROLL: f64 = 1000.0;

/// Year-to-date vital counters.
///
/// Reset on a month-1 tick whose year differs from the stored one. A driver
/// that skips January never resets them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearCounters {
    pub year: Option<u32>,
    pub births: u32,
    pub deaths: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemographicSettings {
    /// Births per 1,000 per year.
    pub annual_birth_rate: f64,
    /// Deaths per 1,000 per year.
    pub annual_death_rate: f64,
}

impl Default for DemographicSettings {
    fn default() -> Self {
        Self::from(&SimConfig::default())
    }
}

impl From<&SimConfig> for DemographicSettings {
    fn from(config: &SimConfig) -> Self {
        Self {
            annual_birth_rate: config.annual_birth_rate,
            annual_death_rate: config.annual_death_rate,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DemographicEngine {
    settings: DemographicSettings,
    diseases: BTreeMap<DiseaseId, Disease>,
    famines: BTreeMap<FamineId, Famine>,
    disease_ids: IdGenerator,
    famine_ids: IdGenerator,
    counters: YearCounters,
}

impl DemographicEngine {
    pub fn new(settings: DemographicSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn counters(&self) -> &YearCounters {
        &self.counters
    }

    pub fn disease(&self, id: DiseaseId) -> SimResult<&Disease> {
        self.diseases.get(&id).ok_or(SimError::DiseaseNotFound(id))
    }

    pub fn diseases(&self) -> impl Iterator<Item = &Disease> {
        self.diseases.values()
    }

    pub fn active_diseases(&self) -> impl Iterator<Item = &Disease> {
        self.diseases.values().filter(|d| d.active)
    }

    pub fn famines(&self) -> impl Iterator<Item = &Famine> {
        self.famines.values()
    }

    pub fn active_famines(&self) -> impl Iterator<Item = &Famine> {
        self.famines.values().filter(|f| f.active)
    }

    /// Run one month: births, deaths, disease progression, famine effects.
    pub fn tick_month(&mut self, ctx: &mut TickContext) {
        self.roll_year_counters(ctx);
        self.process_births(ctx);
        self.process_deaths(ctx);
        self.progress_diseases(ctx);
        self.apply_famines(ctx);
    }

    fn roll_year_counters(&mut self, ctx: &TickContext) {
        let year = ctx.date.year();
        if ctx.date.month() == 1 && self.counters.year != Some(year) {
            self.counters = YearCounters {
                year: Some(year),
                births: 0,
                deaths: 0,
            };
        }
    }

    /// Add this month's expected births to the yearly counter. No citizen is
    /// created; partner resolution is left to the embedding application.
    fn process_births(&mut self, ctx: &mut TickContext) {
        let (population, happiness_sum) = ctx
            .registry
            .alive()
            .fold((0usize, 0.0), |(n, h), c| (n + 1, h + c.happiness()));
        if population == 0 {
            return;
        }
        let damping = happiness_sum / population as f64 / 100.0;
        let expected =
            population as f64 * self.settings.annual_birth_rate / 1000.0 / 12.0 * damping;
        let mut births = expected.floor() as u32;
        if ctx.rng.random_bool(expected.fract().clamp(0.0, 1.0)) {
            births += 1;
        }
        self.counters.births += births;
    }

    fn process_deaths(&mut self, ctx: &mut TickContext) {
        let chances: Vec<(CitizenId, f64)> = ctx
            .registry
            .alive()
            .map(|c| {
                let age_factor = match c.age() {
                    0 => INFANT_RISK,
                    1..5 => CHILD_RISK,
                    age if age > ELDER_AGE => {
                        ELDER_BASE_RISK + ELDER_RISK_PER_YEAR * f64::from(age - ELDER_AGE)
                    }
                    _ => 1.0,
                };
                let health_factor = 2.0 - c.health().overall / 100.0;
                let disease_factor = 1.0 + DISEASE_RISK * c.health().diseases.len() as f64;
                let critical = c.critical_needs();
                let needs_factor = if critical < DESPERATE_NEEDS {
                    DESPERATE_RISK
                } else if critical < POOR_NEEDS {
                    POOR_RISK
                } else {
                    1.0
                };
                let chance = self.settings.annual_death_rate / 12.0
                    * age_factor
                    * health_factor
                    * disease_factor
                    * needs_factor;
                (c.id(), chance)
            })
            .collect();

        for (id, chance) in chances {
            if ctx.rng.random_range(0.0..MORTALITY_ROLL) < chance {
                record_death(&mut self.counters, ctx, id, DeathCause::Natural);
            }
        }
    }

    /// Outbreak of a new disease among the given living citizens.
    pub fn start_epidemic(
        &mut self,
        ctx: &mut TickContext,
        params: DiseaseParams,
        patients: &[CitizenId],
    ) -> SimResult<DiseaseId> {
        params.validate()?;
        for id in patients {
            ctx.registry.living(*id)?;
        }
        let id: DiseaseId = self.disease_ids.next_id();
        let mut disease = Disease {
            id,
            params,
            started: ctx.date,
            active: true,
            infected: Default::default(),
        };
        for patient in patients {
            epidemic::infect(ctx, &mut disease, *patient);
        }
        info!(
            disease_id = %id,
            name = disease.name(),
            patients = patients.len(),
            "epidemic started"
        );
        self.diseases.insert(id, disease);
        Ok(id)
    }

    pub fn start_famine(
        &mut self,
        region_id: RegionId,
        severity: f64,
        duration_months: u32,
        started: SimDate,
    ) -> SimResult<FamineId> {
        if !(0.0..=100.0).contains(&severity) {
            return Err(SimError::Validation(format!(
                "famine severity must be 0-100, got {severity}"
            )));
        }
        if duration_months == 0 {
            return Err(SimError::Validation("famine must last at least a month".into()));
        }
        let id: FamineId = self.famine_ids.next_id();
        self.famines.insert(
            id,
            Famine {
                id,
                region_id,
                severity,
                started,
                duration_months,
                active: true,
            },
        );
        info!(famine_id = %id, region = %region_id, severity, duration_months, "famine started");
        Ok(id)
    }

    pub fn calculate_age_pyramid(&self, registry: &CitizenRegistry) -> AgePyramid {
        stats::age_pyramid(registry)
    }

    pub fn calculate_statistics(&self, registry: &CitizenRegistry) -> PopulationStatistics {
        stats::statistics(registry, &self.counters)
    }
}

/// Mark a citizen dead, count the death and emit the signal.
fn record_death(
    counters: &mut YearCounters,
    ctx: &mut TickContext,
    id: CitizenId,
    cause: DeathCause,
) {
    let label = match cause {
        DeathCause::Natural => "natural causes".to_string(),
        DeathCause::Disease { disease_id } => format!("disease {disease_id}"),
        DeathCause::Starvation { .. } => "starvation".to_string(),
    };
    if ctx.registry.mark_dead(id, ctx.date, &label) {
        counters.deaths += 1;
        debug!(citizen_id = %id, cause = %label, "death recorded");
        ctx.emit(SignalKind::CitizenDied {
            citizen_id: id,
            cause,
        });
    }
}

impl SimSystem for DemographicEngine {
    fn name(&self) -> &str {
        "demographics"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Monthly
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        self.tick_month(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Gender, Need, Profession};
    use crate::testutil::{date, has_signal, seeded_rng, spawn, tick_system, with_context};

    fn params(contagiousness: f64, mortality: f64) -> DiseaseParams {
        DiseaseParams {
            name: "Sweating Sickness".into(),
            contagiousness,
            mortality_rate: mortality,
            duration_months: 6,
            grants_immunity: true,
        }
    }

    #[test]
    fn births_only_touch_the_counter() {
        let mut registry = crate::testutil::populated_registry(200, 3);
        let before = registry.total_count();
        let mut engine = DemographicEngine::new(DemographicSettings {
            annual_birth_rate: 120.0,
            annual_death_rate: 0.0,
        });
        for month in 1..=12 {
            tick_system(&mut registry, &mut engine, date(1450, month), month.into());
        }
        assert!(engine.counters().births > 0);
        assert_eq!(registry.total_count(), before);
    }

    #[test]
    fn counters_reset_only_on_january_of_a_new_year() {
        let mut registry = crate::testutil::populated_registry(100, 3);
        let mut engine = DemographicEngine::new(DemographicSettings {
            annual_birth_rate: 600.0,
            annual_death_rate: 0.0,
        });
        tick_system(&mut registry, &mut engine, date(1450, 1), 1);
        tick_system(&mut registry, &mut engine, date(1450, 2), 2);
        let february = engine.counters().births;
        assert!(february > 0);
        assert_eq!(engine.counters().year, Some(1450));

        // Skipping January of 1451 keeps the 1450 counts.
        tick_system(&mut registry, &mut engine, date(1451, 2), 3);
        assert!(engine.counters().births >= february);
        assert_eq!(engine.counters().year, Some(1450));

        tick_system(&mut registry, &mut engine, date(1452, 1), 4);
        assert_eq!(engine.counters().year, Some(1452));
        assert!(engine.counters().births < february * 3);
    }

    #[test]
    fn zero_death_rate_kills_nobody_naturally() {
        let mut registry = crate::testutil::populated_registry(100, 5);
        let mut engine = DemographicEngine::new(DemographicSettings {
            annual_birth_rate: 0.0,
            annual_death_rate: 0.0,
        });
        for month in 1..=12 {
            tick_system(&mut registry, &mut engine, date(1450, month), month.into());
        }
        assert_eq!(registry.population(), 100);
    }

    #[test]
    fn desperate_elders_die_quickly() {
        let mut registry = CitizenRegistry::new();
        let id = spawn(&mut registry, "Ulrich Zimmer", Gender::Male, 95, Profession::Laborer, RegionId(1));
        for need in [Need::Food, Need::Health, Need::Shelter] {
            registry.set_need(id, need, 0.0).unwrap();
        }
        registry.set_health(id, 0.0).unwrap();
        let mut engine = DemographicEngine::default();
        // 30/12 * 9 * 2 * 3 = 135 out of 1000 per month.
        let mut died = false;
        for i in 0..120u64 {
            let signals = tick_system(&mut registry, &mut engine, date(1450, 1 + (i % 12) as u32), i);
            if has_signal(&signals, |s| matches!(s, SignalKind::CitizenDied { .. })) {
                died = true;
                break;
            }
        }
        assert!(died);
        let c = registry.citizen(id).unwrap();
        assert!(!c.is_alive());
        assert!(c.death().is_some());
        assert_eq!(engine.counters().deaths, 1);
    }

    #[test]
    fn lethal_disease_kills_within_the_next_tick() {
        let mut registry = CitizenRegistry::new();
        let id = spawn(&mut registry, "Hedwig Lang", Gender::Female, 30, Profession::Farmer, RegionId(1));
        registry.set_immunity(id, 0.0).unwrap();
        let mut engine = DemographicEngine::default();
        let mut rng = seeded_rng(8);
        let mut disease = None;
        with_context(&mut registry, date(1450, 5), &mut rng, |ctx| {
            disease = Some(engine.start_epidemic(ctx, params(0.0, 100.0), &[id]).unwrap());
        });
        let disease = disease.unwrap();
        assert!(registry.citizen(id).unwrap().has_disease(disease));

        let signals = tick_system(&mut registry, &mut engine, date(1450, 6), 9);
        let c = registry.citizen(id).unwrap();
        assert!(!c.is_alive());
        assert_eq!(c.death().map(|d| d.year()), Some(1450));
        assert!(has_signal(&signals, |s| matches!(s, SignalKind::CitizenDied { citizen_id, .. } if *citizen_id == id)));
    }

    #[test]
    fn epidemic_rejects_dead_patients() {
        let mut registry = CitizenRegistry::new();
        let id = spawn(&mut registry, "Isolde Meyer", Gender::Female, 30, Profession::Farmer, RegionId(1));
        registry.mark_dead(id, date(1450, 1), "fever");
        let mut engine = DemographicEngine::default();
        let mut rng = seeded_rng(1);
        with_context(&mut registry, date(1450, 2), &mut rng, |ctx| {
            let err = engine.start_epidemic(ctx, params(50.0, 10.0), &[id]).unwrap_err();
            assert_eq!(err, SimError::CitizenDeceased(id));
        });
        assert_eq!(engine.diseases().count(), 0);
    }

    #[test]
    fn famine_drains_food_then_ends() {
        let mut registry = CitizenRegistry::new();
        let id = spawn(&mut registry, "Oswin Fischer", Gender::Male, 30, Profession::Farmer, RegionId(4));
        registry.set_need(id, Need::Food, 50.0).unwrap();
        let mut engine = DemographicEngine::new(DemographicSettings {
            annual_birth_rate: 0.0,
            annual_death_rate: 0.0,
        });
        let famine = engine.start_famine(RegionId(4), 50.0, 2, date(1450, 3)).unwrap();

        tick_system(&mut registry, &mut engine, date(1450, 3), 1);
        assert_eq!(registry.citizen(id).unwrap().needs().get(Need::Food), 45.0);
        tick_system(&mut registry, &mut engine, date(1450, 4), 2);
        assert_eq!(registry.citizen(id).unwrap().needs().get(Need::Food), 40.0);
        assert_eq!(engine.active_famines().count(), 1);

        let signals = tick_system(&mut registry, &mut engine, date(1450, 5), 3);
        assert_eq!(registry.citizen(id).unwrap().needs().get(Need::Food), 40.0);
        assert_eq!(engine.active_famines().count(), 0);
        assert!(has_signal(&signals, |s| matches!(s, SignalKind::FamineEnded { famine_id, .. } if *famine_id == famine)));
    }

    #[test]
    fn famine_rejects_bad_input() {
        let mut engine = DemographicEngine::default();
        assert!(engine.start_famine(RegionId(1), 150.0, 3, date(1450, 1)).is_err());
        assert!(engine.start_famine(RegionId(1), 50.0, 0, date(1450, 1)).is_err());
    }
}
