use std::collections::BTreeSet;

use rand::Rng;
use tracing::debug;

use super::{NewMessage, SocialEngine};
use crate::error::{SimError, SimResult};
use crate::id::{CitizenId, MessageId};
use crate::model::{Citizen, Message, SimDate, Trait};
use crate::sim::context::TickContext;
use crate::sim::registry::CitizenRegistry;

/// Living friends and family of a citizen: the people a message can reach next.
fn contacts(registry: &CitizenRegistry, citizen: &Citizen) -> BTreeSet<CitizenId> {
    citizen
        .friends()
        .chain(citizen.family().iter().map(|f| f.citizen_id))
        .filter(|id| registry.get(*id).is_some_and(Citizen::is_alive))
        .collect()
}

impl SocialEngine {
    /// Start a message with its origin as the first to know and believe it.
    pub fn create_message(
        &mut self,
        registry: &CitizenRegistry,
        origin: CitizenId,
        spec: NewMessage,
        date: SimDate,
    ) -> SimResult<MessageId> {
        let region_id = registry.living(origin)?.region_id();
        for (label, v) in [("spread_rate", spec.spread_rate), ("believability", spec.believability)] {
            if !(0.0..=100.0).contains(&v) {
                return Err(SimError::Validation(format!("{label} must be 0-100, got {v}")));
            }
        }
        let id: MessageId = self.message_ids.next_id();
        self.messages.insert(
            id,
            Message {
                id,
                origin,
                kind: spec.kind,
                content: spec.content,
                spread_rate: spec.spread_rate,
                believability: spec.believability,
                region_id,
                created: date,
                reached: BTreeSet::from([origin]),
                believers: BTreeSet::from([origin]),
            },
        );
        debug!(message_id = %id, %origin, kind = %spec.kind, "message created");
        Ok(id)
    }

    pub fn believers(&self, id: MessageId) -> SimResult<&BTreeSet<CitizenId>> {
        Ok(&self.message(id)?.believers)
    }

    /// One month of spread for every message still within its lifetime.
    ///
    /// Senders are those reached before this pass; people reached during the
    /// pass start passing it on next month. Returns how many were reached.
    pub fn propagate_messages(&mut self, ctx: &mut TickContext) -> usize {
        let lifetime = self.message_lifetime_months;
        let mut total = 0;
        for message in self.messages.values_mut() {
            if !message.is_spreading(ctx.date, lifetime) {
                continue;
            }
            total += spread(message, ctx);
        }
        total
    }
}

fn spread(message: &mut Message, ctx: &mut TickContext) -> usize {
    let senders: Vec<CitizenId> = message.reached.iter().copied().collect();
    let spread_rate = message.spread_rate / 100.0;
    let believability = message.believability / 100.0;
    let mut reached = 0;

    for sender in senders {
        let Some(citizen) = ctx.registry.get(sender).filter(|c| c.is_alive()) else {
            continue;
        };
        let charisma = citizen.personality().get(Trait::Charisma) / 100.0;
        let targets: Vec<(CitizenId, f64)> = contacts(ctx.registry, citizen)
            .into_iter()
            .filter(|id| !message.reached.contains(id))
            .filter_map(|id| {
                ctx.registry
                    .get(id)
                    .map(|c| (id, c.personality().get(Trait::Intelligence) / 100.0))
            })
            .collect();

        for (target, intelligence) in targets {
            if message.reached.contains(&target) {
                continue;
            }
            if ctx.rng.random_bool(spread_rate * charisma) {
                message.reached.insert(target);
                reached += 1;
                if ctx.rng.random_bool(believability * intelligence) {
                    message.believers.insert(target);
                }
            }
        }
    }
    if reached > 0 {
        debug!(message_id = %message.id, reached, total = message.reached.len(), "message spread");
    }
    reached
}
