use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::timestamp::SimDate;
use crate::id::{CitizenId, MovementId, RegionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum MovementKind {
    Revolution,
    Reform,
    Religious,
    Guild,
    Cult,
}

string_enum!(MovementKind {
    Revolution => "revolution",
    Reform => "reform",
    Religious => "religious",
    Guild => "guild",
    Cult => "cult",
});

/// A collective with members, supporters and influence.
///
/// `supporters` counts the wider following, of which the tracked `members`
/// are the named core. Influence is derived from supporters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub kind: MovementKind,
    pub ideology: String,
    pub goal: String,
    pub region_id: RegionId,
    pub founded: SimDate,
    pub members: BTreeSet<CitizenId>,
    pub supporters: u32,
    /// 0–100.
    pub influence: f64,
    pub active: bool,
    pub achievements: Vec<String>,
}

impl Movement {
    pub fn recompute_influence(&mut self) {
        self.influence = (f64::from(self.supporters) / 100.0).min(100.0);
    }
}
