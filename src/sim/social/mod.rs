//! Relationships, message diffusion and collective movements.

mod diffusion;
mod movements;
pub mod relations;

use std::collections::BTreeMap;

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::id::{IdGenerator, MessageId, MovementId};
use crate::model::{Message, MessageKind, Movement, MovementKind};

use super::context::TickContext;
use super::system::{SimSystem, TickFrequency};

pub use movements::join_probability;
pub use relations::{
    MAX_RELATIONS, compatibility, create_enmity, create_friendship, generate_social_relations,
    update_relationship,
};

/// Input for `SocialEngine::create_message`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub kind: MessageKind,
    pub content: String,
    /// 0–100.
    pub spread_rate: f64,
    /// 0–100.
    pub believability: f64,
}

/// Input for `SocialEngine::create_movement`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovement {
    pub kind: MovementKind,
    pub ideology: String,
    pub goal: String,
    /// Following beyond the founder. At least one supporter is always counted.
    pub initial_supporters: u32,
}

/// Owns every message and movement. Social edges live on the citizens.
#[derive(Debug, Clone)]
pub struct SocialEngine {
    messages: BTreeMap<MessageId, Message>,
    movements: BTreeMap<MovementId, Movement>,
    message_ids: IdGenerator,
    movement_ids: IdGenerator,
    message_lifetime_months: u32,
}

impl Default for SocialEngine {
    fn default() -> Self {
        Self::new(SimConfig::default().message_lifetime_months)
    }
}

impl SocialEngine {
    pub fn new(message_lifetime_months: u32) -> Self {
        Self {
            messages: BTreeMap::new(),
            movements: BTreeMap::new(),
            message_ids: IdGenerator::new(),
            movement_ids: IdGenerator::new(),
            message_lifetime_months,
        }
    }

    pub fn message(&self, id: MessageId) -> SimResult<&Message> {
        self.messages.get(&id).ok_or(SimError::MessageNotFound(id))
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    pub fn movement(&self, id: MovementId) -> SimResult<&Movement> {
        self.movements.get(&id).ok_or(SimError::MovementNotFound(id))
    }

    pub fn movements(&self) -> impl Iterator<Item = &Movement> {
        self.movements.values()
    }

    pub fn active_movements(&self) -> impl Iterator<Item = &Movement> {
        self.movements.values().filter(|m| m.active)
    }
}

impl SimSystem for SocialEngine {
    fn name(&self) -> &str {
        "social"
    }

    fn frequency(&self) -> TickFrequency {
        TickFrequency::Monthly
    }

    /// Monthly diffusion and recruitment; yearly bulk relationship formation.
    fn tick(&mut self, ctx: &mut TickContext) {
        self.propagate_messages(ctx);
        self.process_movements(ctx);
        if TickFrequency::Yearly.fires_on(ctx.date) {
            generate_social_relations(ctx.registry, ctx.rng, ctx.date);
        }
    }
}
