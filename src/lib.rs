#[macro_use]
mod macros;

pub mod config;
pub mod error;
pub mod id;
pub mod model;
pub mod sim;

#[cfg(test)]
mod testutil;

pub use config::SimConfig;
pub use error::{ErrorKind, SimError, SimResult};
pub use id::{
    CitizenId, DiseaseId, FamilyId, FamineId, IdGenerator, MessageId, MovementId, PlayerId,
    RegionId,
};
pub use model::{Citizen, SimDate};
pub use sim::registry::{CitizenRegistry, NewCitizen};
pub use sim::{Signal, SignalKind, Simulation, TickReport};
