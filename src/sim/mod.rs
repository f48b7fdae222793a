pub mod behavior;
mod context;
pub mod demographics;
pub mod embodiment;
pub mod names;
pub mod registry;
mod runner;
pub mod signal;
pub mod social;
mod system;

pub use context::TickContext;
pub use runner::{Simulation, TickReport, dispatch_systems};
pub use signal::{DeathCause, Signal, SignalKind};
pub use system::{SimSystem, TickFrequency};
