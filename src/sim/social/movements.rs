use std::collections::BTreeSet;

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use super::{NewMovement, SocialEngine};
use crate::error::{SimError, SimResult};
use crate::id::{CitizenId, MovementId};
use crate::model::{Citizen, LifeEvent, LifeEventKind, Movement, MovementKind, SimDate, Trait};
use crate::sim::context::TickContext;
use crate::sim::registry::CitizenRegistry;
use crate::sim::signal::SignalKind;

// --- Constants ---

const BASE_JOIN_CHANCE: f64 = 0.10;
const REVOLUTIONARY_COURAGE_BONUS: f64 = 0.30;
const REFORMIST_INTELLECT_BONUS: f64 = 0.20;
const DISCONTENT_BONUS: f64 = 0.20;
const FRIEND_MEMBER_BONUS: f64 = 0.10;
const MAX_JOIN_CHANCE: f64 = 0.90;

const TRAIT_THRESHOLD: f64 = 70.0;
const DISCONTENT_HAPPINESS: f64 = 40.0;

const MAX_RECRUITMENT_ATTEMPTS: u32 = 10;
const RECRUITMENT_RATE: f64 = 0.01;
/// A movement with fewer supporters than this disbands.
const MIN_SUPPORTERS: u32 = 5;
/// Influence a revolution needs to succeed.
const REVOLUTION_INFLUENCE: f64 = 70.0;

/// Chance that `citizen` joins `movement` when approached.
pub fn join_probability(citizen: &Citizen, movement: &Movement) -> f64 {
    let personality = citizen.personality();
    let mut chance = BASE_JOIN_CHANCE;
    if movement.kind == MovementKind::Revolution && personality.get(Trait::Courage) > TRAIT_THRESHOLD {
        chance += REVOLUTIONARY_COURAGE_BONUS;
    }
    if movement.kind == MovementKind::Reform
        && personality.get(Trait::Intelligence) > TRAIT_THRESHOLD
    {
        chance += REFORMIST_INTELLECT_BONUS;
    }
    if citizen.happiness() < DISCONTENT_HAPPINESS {
        chance += DISCONTENT_BONUS;
    }
    let friends_inside = citizen
        .friends()
        .filter(|f| movement.members.contains(f))
        .count();
    chance += FRIEND_MEMBER_BONUS * friends_inside as f64;
    chance.min(MAX_JOIN_CHANCE)
}

fn enlist(
    registry: &mut CitizenRegistry,
    movement: &mut Movement,
    id: CitizenId,
    date: SimDate,
) -> SimResult<bool> {
    let cap = registry.settings().max_life_events;
    let citizen = registry.living_mut(id)?;
    if !movement.members.insert(id) {
        return Ok(false);
    }
    movement.supporters += 1;
    movement.recompute_influence();
    citizen.record(
        LifeEvent::new(
            date,
            LifeEventKind::JoinedMovement,
            format!("Joined the {} movement: {}", movement.kind, movement.ideology),
        ),
        cap,
    );
    Ok(true)
}

impl SocialEngine {
    /// Found a movement in the founder's region with the founder as first member.
    pub fn create_movement(
        &mut self,
        registry: &mut CitizenRegistry,
        founder: CitizenId,
        spec: NewMovement,
        date: SimDate,
    ) -> SimResult<MovementId> {
        if spec.ideology.trim().is_empty() {
            return Err(SimError::Validation("movement ideology cannot be empty".into()));
        }
        let region_id = registry.living(founder)?.region_id();
        let id: MovementId = self.movement_ids.next_id();
        let mut movement = Movement {
            id,
            kind: spec.kind,
            ideology: spec.ideology,
            goal: spec.goal,
            region_id,
            founded: date,
            members: BTreeSet::new(),
            supporters: spec.initial_supporters.saturating_sub(1),
            influence: 0.0,
            active: true,
            achievements: Vec::new(),
        };
        enlist(registry, &mut movement, founder, date)?;
        info!(movement_id = %id, kind = %movement.kind, region = %region_id, supporters = movement.supporters, "movement founded");
        self.movements.insert(id, movement);
        Ok(id)
    }

    /// Returns false if the citizen already belonged.
    pub fn join_movement(
        &mut self,
        registry: &mut CitizenRegistry,
        movement_id: MovementId,
        citizen: CitizenId,
        date: SimDate,
    ) -> SimResult<bool> {
        let movement = self
            .movements
            .get_mut(&movement_id)
            .ok_or(SimError::MovementNotFound(movement_id))?;
        if !movement.active {
            warn!(%movement_id, %citizen, "join rejected: movement inactive");
            return Err(SimError::MovementInactive(movement_id));
        }
        enlist(registry, movement, citizen, date)
    }

    /// Returns false if the citizen was not a member.
    pub fn leave_movement(
        &mut self,
        registry: &mut CitizenRegistry,
        movement_id: MovementId,
        citizen: CitizenId,
        date: SimDate,
    ) -> SimResult<bool> {
        let movement = self
            .movements
            .get_mut(&movement_id)
            .ok_or(SimError::MovementNotFound(movement_id))?;
        registry.citizen(citizen)?;
        if !movement.members.remove(&citizen) {
            return Ok(false);
        }
        movement.supporters = movement.supporters.saturating_sub(1);
        movement.recompute_influence();
        registry.record_event(
            citizen,
            date,
            LifeEventKind::LeftMovement,
            format!("Left the {} movement", movement.kind),
        )?;
        Ok(true)
    }

    /// Monthly pruning of dead members, recruitment, influence update, success check and dissolution.
    pub fn process_movements(&mut self, ctx: &mut TickContext) {
        for movement in self.movements.values_mut().filter(|m| m.active) {
            let before = movement.members.len();
            movement
                .members
                .retain(|m| ctx.registry.get(*m).is_some_and(Citizen::is_alive));
            let fallen = (before - movement.members.len()) as u32;
            if fallen > 0 {
                movement.supporters = movement.supporters.saturating_sub(fallen);
                debug!(movement_id = %movement.id, fallen, "dead members pruned");
            }
            movement.recompute_influence();

            let attempts = ((f64::from(movement.supporters) * RECRUITMENT_RATE).floor() as u32)
                .min(MAX_RECRUITMENT_ATTEMPTS);
            let prospects: Vec<CitizenId> = ctx
                .registry
                .in_region(movement.region_id)
                .iter()
                .filter(|c| !movement.members.contains(&c.id()))
                .map(|c| c.id())
                .collect();

            for _ in 0..attempts {
                let Some(&prospect) = prospects.choose(&mut *ctx.rng) else {
                    break;
                };
                let Some(chance) = ctx.registry.get(prospect).map(|c| join_probability(c, movement))
                else {
                    continue;
                };
                if ctx.rng.random_bool(chance)
                    && enlist(ctx.registry, movement, prospect, ctx.date).unwrap_or(false)
                {
                    debug!(movement_id = %movement.id, citizen_id = %prospect, "recruited");
                }
            }
            movement.recompute_influence();

            if movement.kind == MovementKind::Revolution
                && movement.influence > REVOLUTION_INFLUENCE
                && movement.achievements.is_empty()
            {
                movement
                    .achievements
                    .push(format!("Revolution succeeded: {}", movement.goal));
                info!(movement_id = %movement.id, "revolution succeeded");
                ctx.emit(SignalKind::RevolutionSucceeded {
                    movement_id: movement.id,
                });
            }

            if movement.supporters < MIN_SUPPORTERS {
                movement.active = false;
                info!(movement_id = %movement.id, supporters = movement.supporters, "movement dissolved");
                ctx.emit(SignalKind::MovementDissolved {
                    movement_id: movement.id,
                });
            }
        }
    }
}
