use std::collections::BTreeMap;

use tracing::debug;

use super::action::Decision;
use super::controller::{BehaviorController, ControllerSnapshot};
use crate::id::CitizenId;
use crate::model::{Citizen, SimDate};
use crate::sim::context::TickContext;
use crate::sim::registry::CitizenRegistry;
use crate::sim::system::{SimSystem, TickFrequency};

/// Owns one controller per AI-driven citizen and runs them every month.
#[derive(Debug, Clone, Default)]
pub struct BehaviorManager {
    controllers: BTreeMap<CitizenId, BehaviorController>,
    latest: Vec<Decision>,
    max_history: usize,
}

impl BehaviorManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            ..Self::default()
        }
    }

    pub fn controller(&self, id: CitizenId) -> Option<&BehaviorController> {
        self.controllers.get(&id)
    }

    pub fn controllers(&self) -> impl Iterator<Item = &BehaviorController> {
        self.controllers.values()
    }

    /// Decisions produced by the most recent tick.
    pub fn latest_decisions(&self) -> &[Decision] {
        &self.latest
    }

    /// Update every living citizen not under player control, creating
    /// controllers on first sight. Dead and embodied citizens keep their
    /// controllers untouched.
    pub fn update_all(&mut self, registry: &CitizenRegistry, date: SimDate) -> Vec<Decision> {
        let max_history = self.max_history;
        let mut decisions = Vec::new();
        for citizen in registry.alive().filter(|c| !c.is_player_character()) {
            let controller = self
                .controllers
                .entry(citizen.id())
                .or_insert_with(|| BehaviorController::new(citizen, max_history));
            decisions.extend(controller.update(citizen, date));
        }
        debug!(decisions = decisions.len(), %date, "behavior pass complete");
        decisions
    }

    /// Put a citizen's controller to sleep. Returns false if it has none.
    pub fn deactivate(&mut self, id: CitizenId) -> bool {
        match self.controllers.get_mut(&id) {
            Some(controller) => {
                controller.pause();
                true
            }
            None => false,
        }
    }

    /// Give a citizen back to the AI with a freshly classified controller.
    pub fn activate(&mut self, citizen: &Citizen) {
        let max_history = self.max_history;
        self.controllers
            .entry(citizen.id())
            .and_modify(|c| c.resume(citizen))
            .or_insert_with(|| BehaviorController::new(citizen, max_history));
    }

    pub fn snapshot(&self) -> Vec<ControllerSnapshot> {
        self.controllers.values().map(BehaviorController::snapshot).collect()
    }

    pub fn restore(snapshots: Vec<ControllerSnapshot>, max_history: usize) -> Self {
        let controllers = snapshots
            .into_iter()
            .map(|s| (s.citizen_id, BehaviorController::restore(s, max_history)))
            .collect();
        Self {
            controllers,
            latest: Vec::new(),
            max_history,
        }
    }
}

impl SimSystem for BehaviorManager {
    fn name(&self) -> &str {
        "behavior"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Monthly
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        self.latest = self.update_all(ctx.registry, ctx.date);
    }
}
