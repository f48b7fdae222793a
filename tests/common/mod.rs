#![allow(dead_code)]

use citizen_sim::model::{Gender, Profession};
use citizen_sim::sim::{SignalKind, TickReport};
use citizen_sim::{CitizenId, NewCitizen, RegionId, SimConfig, Simulation};

pub fn config(seed: u64, population: u32) -> SimConfig {
    SimConfig {
        seed,
        initial_population: population,
        num_regions: 2,
        ..SimConfig::default()
    }
}

pub fn seeded_sim(seed: u64, population: u32) -> Simulation {
    Simulation::seeded(config(seed, population)).unwrap()
}

/// A simulation with nobody in it, for hand-built scenarios.
pub fn empty_sim(seed: u64) -> Simulation {
    Simulation::new(config(seed, 0)).unwrap()
}

pub fn add_citizen(
    sim: &mut Simulation,
    name: &str,
    gender: Gender,
    age: u32,
    profession: Profession,
    region: u64,
) -> CitizenId {
    sim.create_citizen(NewCitizen::new(name, gender, age, profession, RegionId(region)))
        .unwrap()
}

pub fn count_signals(reports: &[TickReport], predicate: impl Fn(&SignalKind) -> bool) -> usize {
    reports
        .iter()
        .flat_map(|r| r.signals.iter())
        .filter(|s| predicate(&s.kind))
        .count()
}
