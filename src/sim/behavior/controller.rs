use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::action::Decision;
use super::layers;
use super::{AiType, Goal};
use crate::id::CitizenId;
use crate::model::{Citizen, SimDate};

/// Serializable state of one controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub citizen_id: CitizenId,
    pub ai_type: AiType,
    pub goals: Vec<Goal>,
    pub decisions: Vec<Decision>,
    pub last_update: Option<SimDate>,
    pub active: bool,
}

/// Layered AI for one citizen.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorController {
    citizen_id: CitizenId,
    ai_type: AiType,
    goals: Vec<Goal>,
    decisions: VecDeque<Decision>,
    last_update: Option<SimDate>,
    active: bool,
    max_history: usize,
}

impl BehaviorController {
    pub fn new(citizen: &Citizen, max_history: usize) -> Self {
        let ai_type = AiType::classify(citizen);
        Self {
            citizen_id: citizen.id(),
            ai_type,
            goals: Goal::seed_for(ai_type),
            decisions: VecDeque::new(),
            last_update: None,
            active: true,
            max_history,
        }
    }

    pub fn citizen_id(&self) -> CitizenId {
        self.citizen_id
    }

    pub fn ai_type(&self) -> AiType {
        self.ai_type
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Past decisions, oldest first.
    pub fn decisions(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.iter()
    }

    pub fn last_update(&self) -> Option<SimDate> {
        self.last_update
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Run all layers for `date`. A second call for the same date, or any
    /// call while paused, returns nothing.
    pub fn update(&mut self, citizen: &Citizen, date: SimDate) -> Vec<Decision> {
        if !self.active || self.last_update == Some(date) {
            return Vec::new();
        }
        self.last_update = Some(date);

        let proposals = layers::basic_needs(citizen)
            .into_iter()
            .chain(layers::role_goals(citizen, date))
            .chain(layers::relationships(citizen))
            .chain(layers::life_goals(citizen, self.ai_type));

        let timestamp = date.ordinal();
        let decisions: Vec<Decision> = proposals
            .map(|(action, reasoning)| Decision {
                citizen_id: self.citizen_id,
                action,
                timestamp,
                reasoning,
                success: true,
            })
            .collect();

        for decision in &decisions {
            self.decisions.push_back(decision.clone());
        }
        while self.decisions.len() > self.max_history {
            self.decisions.pop_front();
        }
        decisions
    }

    /// Go dormant while a player drives the citizen.
    pub fn pause(&mut self) {
        self.active = false;
    }

    /// Hand the citizen back to the AI, re-classifying from current state.
    pub fn resume(&mut self, citizen: &Citizen) {
        let ai_type = AiType::classify(citizen);
        if ai_type != self.ai_type {
            debug!(citizen_id = %self.citizen_id, from = %self.ai_type, to = %ai_type, "ai type changed");
        }
        self.ai_type = ai_type;
        self.goals = Goal::seed_for(ai_type);
        self.active = true;
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            citizen_id: self.citizen_id,
            ai_type: self.ai_type,
            goals: self.goals.clone(),
            decisions: self.decisions.iter().cloned().collect(),
            last_update: self.last_update,
            active: self.active,
        }
    }

    pub fn restore(snapshot: ControllerSnapshot, max_history: usize) -> Self {
        let mut decisions: VecDeque<Decision> = snapshot.decisions.into();
        while decisions.len() > max_history {
            decisions.pop_front();
        }
        Self {
            citizen_id: snapshot.citizen_id,
            ai_type: snapshot.ai_type,
            goals: snapshot.goals,
            decisions,
            last_update: snapshot.last_update,
            active: snapshot.active,
            max_history,
        }
    }
}
