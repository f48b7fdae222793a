use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::id::{CitizenId, RegionId};
use crate::model::{Gender, Profession, SimDate};
use crate::sim::registry::{CitizenRegistry, NewCitizen};
use crate::sim::{Signal, SignalKind, SimSystem, TickContext};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn seeded_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

pub fn date(year: u32, month: u32) -> SimDate {
    SimDate::new(year, month)
}

/// Create one citizen with a throwaway RNG, born in the current month.
pub fn spawn(
    registry: &mut CitizenRegistry,
    name: &str,
    gender: Gender,
    age: u32,
    profession: Profession,
    region: RegionId,
) -> CitizenId {
    let mut rng = seeded_rng(registry.total_count() as u64 + 1);
    registry
        .create_citizen(
            NewCitizen::new(name, gender, age, profession, region).born_in_month(1),
            date(1450, 1),
            &mut rng,
        )
        .expect("fixture citizen should be valid")
}

/// A registry holding `count` seeded citizens over two regions.
pub fn populated_registry(count: u32, seed: u64) -> CitizenRegistry {
    let mut registry = CitizenRegistry::new();
    let mut rng = seeded_rng(seed);
    registry
        .seed_population(count, 2, date(1450, 1), &mut rng)
        .expect("seeding should succeed");
    registry
}

// ---------------------------------------------------------------------------
// Tick execution helpers
// ---------------------------------------------------------------------------

/// Run a closure against a fresh tick context. Returns emitted signals.
pub fn with_context(
    registry: &mut CitizenRegistry,
    date: SimDate,
    rng: &mut SmallRng,
    f: impl FnOnce(&mut TickContext),
) -> Vec<Signal> {
    let mut signals = Vec::new();
    let mut ctx = TickContext {
        registry,
        rng,
        date,
        signals: &mut signals,
    };
    f(&mut ctx);
    signals
}

/// Run a single system tick at the given date. Returns emitted signals.
pub fn tick_system(
    registry: &mut CitizenRegistry,
    system: &mut dyn SimSystem,
    date: SimDate,
    seed: u64,
) -> Vec<Signal> {
    let mut rng = seeded_rng(seed);
    with_context(registry, date, &mut rng, |ctx| system.tick(ctx))
}

// ---------------------------------------------------------------------------
// Signal helpers
// ---------------------------------------------------------------------------

/// Check if any signal matches the predicate.
pub fn has_signal(signals: &[Signal], predicate: impl Fn(&SignalKind) -> bool) -> bool {
    signals.iter().any(|s| predicate(&s.kind))
}

/// Count signals matching the predicate.
pub fn count_signals(signals: &[Signal], predicate: impl Fn(&SignalKind) -> bool) -> usize {
    signals.iter().filter(|s| predicate(&s.kind)).count()
}

/// Assert a float is approximately equal, with a named context message.
pub fn assert_approx(actual: f64, expected: f64, tolerance: f64, msg: &str) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{msg}: expected ~{expected} (+-{tolerance}), got {actual}"
    );
}
