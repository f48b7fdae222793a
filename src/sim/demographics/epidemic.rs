use rand::Rng;
use tracing::{debug, info};

use super::{DemographicEngine, record_death};
use crate::id::CitizenId;
use crate::model::{Disease, LifeEvent, LifeEventKind, Need, clamp_stat};
use crate::sim::context::TickContext;
use crate::sim::signal::{DeathCause, SignalKind};

// --- Constants ---

/// Immunity gained by recovering from a disease that grants immunity.
const RECOVERY_IMMUNITY_BOOST: f64 = 20.0;

/// Food level below which famine victims risk starving to death.
const STARVATION_FOOD_LEVEL: f64 = 10.0;

/// Add the disease to a living citizen and to the disease's infected set.
pub(super) fn infect(ctx: &mut TickContext, disease: &mut Disease, id: CitizenId) {
    let cap = ctx.registry.settings().max_life_events;
    let Some(citizen) = ctx.registry.get_mut(id) else {
        return;
    };
    if !citizen.alive || citizen.has_disease(disease.id) {
        return;
    }
    citizen.health.diseases.push(disease.id);
    citizen.record(
        LifeEvent::new(
            ctx.date,
            LifeEventKind::FellIll,
            format!("Fell ill with {}", disease.name()),
        ),
        cap,
    );
    disease.infected.insert(id);
    debug!(citizen_id = %id, disease = disease.name(), "citizen infected");
    ctx.emit(SignalKind::CitizenInfected {
        citizen_id: id,
        disease_id: disease.id,
    });
}

fn recover(ctx: &mut TickContext, disease: &mut Disease, id: CitizenId) {
    let cap = ctx.registry.settings().max_life_events;
    disease.infected.remove(&id);
    let Some(citizen) = ctx.registry.get_mut(id) else {
        return;
    };
    citizen.health.diseases.retain(|d| *d != disease.id);
    if disease.params.grants_immunity {
        citizen.health.immunity = clamp_stat(citizen.health.immunity + RECOVERY_IMMUNITY_BOOST);
        citizen.health.immune_to.insert(disease.id);
    }
    citizen.record(
        LifeEvent::new(
            ctx.date,
            LifeEventKind::Recovered,
            format!("Recovered from {}", disease.name()),
        ),
        cap,
    );
    debug!(citizen_id = %id, disease = disease.name(), "citizen recovered");
    ctx.emit(SignalKind::CitizenRecovered {
        citizen_id: id,
        disease_id: disease.id,
    });
}

impl DemographicEngine {
    /// One month of every active epidemic.
    ///
    /// Infected citizens recover (chance = immunity), otherwise die (chance =
    /// mortality) or stay sick. While the outbreak is within its duration,
    /// every susceptible citizen may then catch it. An outbreak past its
    /// duration with nobody infected ends.
    pub fn progress_diseases(&mut self, ctx: &mut TickContext) {
        for disease in self.diseases.values_mut().filter(|d| d.active) {
            let infected: Vec<CitizenId> = disease.infected.iter().copied().collect();
            for id in infected {
                let immunity = match ctx.registry.get(id) {
                    Some(c) if c.is_alive() => c.health().immunity,
                    _ => {
                        disease.infected.remove(&id);
                        continue;
                    }
                };
                if ctx.rng.random_bool(immunity / 100.0) {
                    recover(ctx, disease, id);
                } else if ctx.rng.random_bool(disease.params.mortality_rate / 100.0) {
                    disease.infected.remove(&id);
                    record_death(
                        &mut self.counters,
                        ctx,
                        id,
                        DeathCause::Disease {
                            disease_id: disease.id,
                        },
                    );
                }
            }

            if disease.is_spreading(ctx.date) {
                let susceptible: Vec<(CitizenId, f64)> = ctx
                    .registry
                    .alive()
                    .filter(|c| !c.has_disease(disease.id) && !c.is_immune_to(disease.id))
                    .map(|c| (c.id(), c.health().immunity))
                    .collect();
                let contagiousness = disease.params.contagiousness / 100.0;
                for (id, immunity) in susceptible {
                    let chance = contagiousness * (1.0 - immunity / 100.0) / 100.0;
                    if ctx.rng.random_bool(chance) {
                        infect(ctx, disease, id);
                    }
                }
            } else if disease.infected.is_empty() {
                disease.active = false;
                info!(disease_id = %disease.id, name = disease.name(), "epidemic ended");
                ctx.emit(SignalKind::EpidemicEnded {
                    disease_id: disease.id,
                });
            }
        }
    }

    /// One month of every active famine: food loss for the region and a
    /// starvation roll for the worst fed. Famines past their duration end
    /// without further effect.
    pub(super) fn apply_famines(&mut self, ctx: &mut TickContext) {
        for famine in self.famines.values_mut().filter(|f| f.active) {
            if famine.has_run_its_course(ctx.date) {
                famine.active = false;
                info!(famine_id = %famine.id, region = %famine.region_id, "famine ended");
                ctx.emit(SignalKind::FamineEnded {
                    famine_id: famine.id,
                    region_id: famine.region_id,
                });
                continue;
            }

            let victims: Vec<CitizenId> = ctx
                .registry
                .in_region(famine.region_id)
                .iter()
                .map(|c| c.id())
                .collect();
            let food_loss = famine.severity / 10.0;
            let death_chance = famine.severity / 1000.0;
            for id in victims {
                let Ok(food) = ctx.registry.adjust_need(id, Need::Food, -food_loss) else {
                    continue;
                };
                if food < STARVATION_FOOD_LEVEL && ctx.rng.random_bool(death_chance) {
                    record_death(
                        &mut self.counters,
                        ctx,
                        id,
                        DeathCause::Starvation {
                            famine_id: famine.id,
                        },
                    );
                }
            }
        }
    }
}
