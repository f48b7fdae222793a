use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::timestamp::SimDate;
use crate::error::{SimError, SimResult};
use crate::id::{CitizenId, DiseaseId};

/// Parameters of a new epidemic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseParams {
    pub name: String,
    /// 0–100.
    pub contagiousness: f64,
    /// 0–100; monthly chance (percent) an infected citizen who did not recover dies.
    pub mortality_rate: f64,
    /// Months during which the disease keeps finding new victims.
    pub duration_months: u32,
    /// Whether recovery makes the citizen permanently immune to this disease.
    pub grants_immunity: bool,
}

impl DiseaseParams {
    pub fn validate(&self) -> SimResult<()> {
        if self.name.trim().is_empty() {
            return Err(SimError::Validation("disease name cannot be empty".into()));
        }
        for (label, v) in [
            ("contagiousness", self.contagiousness),
            ("mortality_rate", self.mortality_rate),
        ] {
            if !(0.0..=100.0).contains(&v) {
                return Err(SimError::Validation(format!("{label} must be 0-100, got {v}")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disease {
    pub id: DiseaseId,
    pub params: DiseaseParams,
    pub started: SimDate,
    pub active: bool,
    /// Citizens currently infected.
    pub infected: BTreeSet<CitizenId>,
}

impl Disease {
    pub fn name(&self) -> &str {
        &self.params.name
    }

    /// Whether the outbreak still claims new victims at `date`.
    pub fn is_spreading(&self, date: SimDate) -> bool {
        self.active && date.months_since(self.started) < self.params.duration_months
    }
}
