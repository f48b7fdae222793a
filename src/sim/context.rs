use rand::RngCore;

use super::registry::CitizenRegistry;
use super::signal::{Signal, SignalKind};
use crate::model::SimDate;

/// Context passed to each system on every tick.
///
/// Bundled so fields can be added later without changing the `SimSystem`
/// trait signature.
pub struct TickContext<'a> {
    pub registry: &'a mut CitizenRegistry,
    pub rng: &'a mut dyn RngCore,
    pub date: SimDate,
    /// Systems push signals here during `tick()`.
    pub signals: &'a mut Vec<Signal>,
}

impl TickContext<'_> {
    pub fn emit(&mut self, kind: SignalKind) {
        self.signals.push(Signal {
            date: self.date,
            kind,
        });
    }
}
