use serde::{Deserialize, Serialize};

use super::timestamp::SimDate;
use crate::id::{FamineId, RegionId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Famine {
    pub id: FamineId,
    pub region_id: RegionId,
    /// 0–100.
    pub severity: f64,
    pub started: SimDate,
    pub duration_months: u32,
    pub active: bool,
}

impl Famine {
    pub fn has_run_its_course(&self, date: SimDate) -> bool {
        date.months_since(self.started) >= self.duration_months
    }
}
