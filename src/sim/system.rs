use super::context::TickContext;
use crate::model::SimDate;

/// How often a simulation system should tick.
///
/// Ordered coarsest-to-finest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TickFrequency {
    /// Once a year, on the month-1 tick.
    Yearly,
    Monthly,
}

impl TickFrequency {
    pub fn fires_on(self, date: SimDate) -> bool {
        match self {
            TickFrequency::Monthly => true,
            TickFrequency::Yearly => date.month() == 1,
        }
    }
}

/// A pluggable simulation system that runs each tick.
///
/// Object-safe so systems can be stored as `&mut dyn SimSystem`.
pub trait SimSystem {
    fn name(&self) -> &str;
    fn frequency(&self) -> TickFrequency;
    fn tick(&mut self, ctx: &mut TickContext);
}
