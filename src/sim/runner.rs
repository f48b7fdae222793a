use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info};

use super::behavior::{BehaviorManager, Decision};
use super::context::TickContext;
use super::demographics::{DemographicEngine, DemographicSettings};
use super::embodiment::RoleSwitcher;
use super::registry::{CitizenRegistry, NewCitizen, RegistrySettings, SeedSummary};
use super::signal::Signal;
use super::social::{NewMessage, NewMovement, SocialEngine};
use super::system::SimSystem;
use crate::config::SimConfig;
use crate::error::SimResult;
use crate::id::{CitizenId, DiseaseId, FamineId, MessageId, MovementId, PlayerId, RegionId};
use crate::model::{DiseaseParams, SimDate};

/// Run every system whose frequency fires on `date`, in slice order, against
/// one shared context. Returns the signals they emitted.
///
/// Systems never see each other's signals; ordering is the only coupling
/// between them.
pub fn dispatch_systems(
    registry: &mut CitizenRegistry,
    systems: &mut [&mut dyn SimSystem],
    rng: &mut dyn RngCore,
    date: SimDate,
) -> Vec<Signal> {
    let mut signals = Vec::new();
    for system in systems.iter_mut() {
        if system.frequency().fires_on(date) {
            let mut ctx = TickContext {
                registry,
                rng,
                date,
                signals: &mut signals,
            };
            system.tick(&mut ctx);
            debug!(system = system.name(), %date, "system ticked");
        }
    }
    signals
}

/// Everything one monthly tick produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub date: SimDate,
    pub signals: Vec<Signal>,
    pub decisions: Vec<Decision>,
}

/// One self-contained simulation: the registry, every engine, the player
/// sessions and the RNG that drives them.
///
/// Nothing is global, so any number of simulations can run side by side.
/// The same config and command sequence replay identically.
pub struct Simulation {
    config: SimConfig,
    registry: CitizenRegistry,
    demographics: DemographicEngine,
    behavior: BehaviorManager,
    social: SocialEngine,
    switcher: RoleSwitcher,
    rng: SmallRng,
    last_tick: Option<SimDate>,
}

impl Simulation {
    /// An empty world.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            registry: CitizenRegistry::with_settings(RegistrySettings::from(&config)),
            demographics: DemographicEngine::new(DemographicSettings::from(&config)),
            behavior: BehaviorManager::new(config.max_decision_history),
            social: SocialEngine::new(config.message_lifetime_months),
            switcher: RoleSwitcher::new(),
            rng: SmallRng::seed_from_u64(config.seed),
            last_tick: None,
            config,
        })
    }

    /// A world populated with `config.initial_population` citizens spread
    /// over `config.num_regions` regions.
    pub fn seeded(config: SimConfig) -> SimResult<Self> {
        let mut sim = Self::new(config)?;
        let start = sim.current_date();
        let summary: SeedSummary = sim.registry.seed_population(
            sim.config.initial_population,
            sim.config.num_regions,
            start,
            &mut sim.rng,
        )?;
        info!(
            citizens = summary.citizens.len(),
            families = summary.families,
            seed = sim.config.seed,
            "world seeded"
        );
        Ok(sim)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The date of the last tick, or the configured start before the first.
    pub fn current_date(&self) -> SimDate {
        self.last_tick
            .unwrap_or_else(|| self.config.start_date())
    }

    /// The date `run` will tick next.
    pub fn next_date(&self) -> SimDate {
        match self.last_tick {
            Some(date) => date.next_month(),
            None => self.current_date(),
        }
    }

    /// Advance one month: registry upkeep, then demographics, behavior and
    /// social processing, in that order.
    pub fn tick(&mut self, date: SimDate) -> TickReport {
        let mut signals = self.registry.tick_month(date, &mut self.rng);
        let mut systems: [&mut dyn SimSystem; 3] =
            [&mut self.demographics, &mut self.behavior, &mut self.social];
        signals.extend(dispatch_systems(
            &mut self.registry,
            &mut systems,
            &mut self.rng,
            date,
        ));
        self.last_tick = Some(date);

        let decisions = self.behavior.latest_decisions().to_vec();
        info!(
            %date,
            population = self.registry.population(),
            signals = signals.len(),
            decisions = decisions.len(),
            "tick complete"
        );
        TickReport {
            date,
            signals,
            decisions,
        }
    }

    /// Tick `months` consecutive months starting at `next_date`.
    pub fn run(&mut self, months: u32) -> Vec<TickReport> {
        (0..months)
            .map(|_| {
                let date = self.next_date();
                self.tick(date)
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn registry(&self) -> &CitizenRegistry {
        &self.registry
    }

    /// Direct access for the registry's named mutators.
    pub fn registry_mut(&mut self) -> &mut CitizenRegistry {
        &mut self.registry
    }

    pub fn demographics(&self) -> &DemographicEngine {
        &self.demographics
    }

    pub fn behavior(&self) -> &BehaviorManager {
        &self.behavior
    }

    pub fn social(&self) -> &SocialEngine {
        &self.social
    }

    pub fn switcher(&self) -> &RoleSwitcher {
        &self.switcher
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    pub fn create_citizen(&mut self, spec: NewCitizen) -> SimResult<CitizenId> {
        let date = self.current_date();
        self.registry.create_citizen(spec, date, &mut self.rng)
    }

    pub fn migrate_citizen(&mut self, id: CitizenId, to: RegionId) -> SimResult<()> {
        let date = self.current_date();
        self.registry.migrate_citizen(id, to, date)
    }

    pub fn start_epidemic(
        &mut self,
        params: DiseaseParams,
        patients: &[CitizenId],
    ) -> SimResult<(DiseaseId, Vec<Signal>)> {
        let date = self.current_date();
        let mut signals = Vec::new();
        let mut ctx = TickContext {
            registry: &mut self.registry,
            rng: &mut self.rng,
            date,
            signals: &mut signals,
        };
        let id = self.demographics.start_epidemic(&mut ctx, params, patients)?;
        Ok((id, signals))
    }

    pub fn start_famine(
        &mut self,
        region: RegionId,
        severity: f64,
        duration_months: u32,
    ) -> SimResult<FamineId> {
        let date = self.current_date();
        self.demographics
            .start_famine(region, severity, duration_months, date)
    }

    pub fn create_message(&mut self, origin: CitizenId, spec: NewMessage) -> SimResult<MessageId> {
        let date = self.current_date();
        self.social.create_message(&self.registry, origin, spec, date)
    }

    pub fn create_movement(
        &mut self,
        founder: CitizenId,
        spec: NewMovement,
    ) -> SimResult<MovementId> {
        let date = self.current_date();
        self.social
            .create_movement(&mut self.registry, founder, spec, date)
    }

    pub fn join_movement(&mut self, movement: MovementId, citizen: CitizenId) -> SimResult<bool> {
        let date = self.current_date();
        self.social
            .join_movement(&mut self.registry, movement, citizen, date)
    }

    pub fn switch_role(&mut self, player: PlayerId, target: CitizenId) -> SimResult<()> {
        let date = self.current_date();
        self.switcher
            .switch_role(&mut self.registry, &mut self.behavior, player, target, date)
    }

    pub fn switch_to_previous(&mut self, player: PlayerId) -> SimResult<CitizenId> {
        let date = self.current_date();
        self.switcher
            .switch_to_previous(&mut self.registry, &mut self.behavior, player, date)
    }

    pub fn release(&mut self, player: PlayerId) -> SimResult<CitizenId> {
        let date = self.current_date();
        self.switcher
            .release(&mut self.registry, &mut self.behavior, player, date)
    }

    pub fn recommended_characters(&self, player: PlayerId) -> SimResult<Vec<CitizenId>> {
        self.switcher.get_recommended_characters(&self.registry, player)
    }
}
