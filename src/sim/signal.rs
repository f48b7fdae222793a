use serde::{Deserialize, Serialize};

use crate::id::{CitizenId, DiseaseId, FamineId, MovementId, RegionId};
use crate::model::SimDate;

/// A notable state change emitted by an engine during a tick.
///
/// Signals are informational: engines never read each other's signals, the
/// embedding application consumes them from the tick report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub date: SimDate,
    pub kind: SignalKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeathCause {
    Natural,
    Disease { disease_id: DiseaseId },
    Starvation { famine_id: FamineId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalKind {
    /// A citizen died this tick.
    CitizenDied {
        citizen_id: CitizenId,
        cause: DeathCause,
    },

    /// A pregnancy reached term. No child record is created by the core.
    BirthDue { mother_id: CitizenId },

    CitizenInfected {
        citizen_id: CitizenId,
        disease_id: DiseaseId,
    },

    CitizenRecovered {
        citizen_id: CitizenId,
        disease_id: DiseaseId,
    },

    /// An epidemic ran its course and nobody is infected any more.
    EpidemicEnded { disease_id: DiseaseId },

    FamineEnded {
        famine_id: FamineId,
        region_id: RegionId,
    },

    /// A movement fell below the supporter floor and disbanded.
    MovementDissolved { movement_id: MovementId },

    /// A revolution crossed the influence threshold.
    RevolutionSucceeded { movement_id: MovementId },
}
