use serde::Deserialize;

use crate::error::{SimError, SimResult};
use crate::model::SimDate;

/// Tunable parameters for one simulation instance.
///
/// Every field has a default, so a TOML file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed. The same seed and the same command sequence replay identically.
    pub seed: u64,
    pub start_year: u32,
    /// 1–12.
    pub start_month: u32,
    /// Citizens created by `Simulation::seeded`.
    pub initial_population: u32,
    /// Regions the seeded population is spread across.
    pub num_regions: u32,
    /// Births per 1,000 citizens per year, before happiness damping.
    pub annual_birth_rate: f64,
    /// Deaths per 1,000 citizens per year, before risk factors.
    pub annual_death_rate: f64,
    /// Upper bound of the random monthly decay applied to each need.
    pub max_need_decay: f64,
    /// Migration desire spent by one move.
    pub migration_step: f64,
    /// Months after creation during which a message keeps spreading.
    pub message_lifetime_months: u32,
    /// Decisions kept per behavior controller.
    pub max_decision_history: usize,
    /// Life events kept per citizen; 0 keeps everything.
    pub max_life_events: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            start_year: 1450,
            start_month: 1,
            initial_population: 200,
            num_regions: 4,
            annual_birth_rate: 35.0,
            annual_death_rate: 30.0,
            max_need_decay: 5.0,
            migration_step: 50.0,
            message_lifetime_months: 12,
            max_decision_history: 100,
            max_life_events: 500,
        }
    }
}

impl SimConfig {
    /// Parse a config from TOML, then validate it.
    pub fn from_toml_str(source: &str) -> SimResult<Self> {
        let config: SimConfig =
            toml::from_str(source).map_err(|e| SimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(1..=12).contains(&self.start_month) {
            return Err(SimError::Config(format!(
                "start_month must be 1-12, got {}",
                self.start_month
            )));
        }
        if self.num_regions == 0 {
            return Err(SimError::Config("num_regions must be at least 1".into()));
        }
        if self.annual_birth_rate < 0.0 || self.annual_death_rate < 0.0 {
            return Err(SimError::Config("vital rates cannot be negative".into()));
        }
        if self.max_need_decay < 0.0 || self.migration_step < 0.0 {
            return Err(SimError::Config(
                "max_need_decay and migration_step cannot be negative".into(),
            ));
        }
        Ok(())
    }

    pub fn start_date(&self) -> SimDate {
        SimDate::new(self.start_year, self.start_month)
    }
}
