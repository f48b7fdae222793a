use serde::Serialize;

use super::YearCounters;
use crate::model::Gender;
use crate::sim::registry::CitizenRegistry;

pub const NUM_AGE_BANDS: usize = 10;
/// Years covered by each band; the last band is open-ended.
pub const AGE_BAND_WIDTH: u32 = 10;

const FERTILE_AGES: std::ops::RangeInclusive<u32> = 15..=49;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgeBand {
    pub min_age: u32,
    /// `None` for the open-ended top band.
    pub max_age: Option<u32>,
    pub male: usize,
    pub female: usize,
    /// Share of the living population, 0–100.
    pub male_percent: f64,
    pub female_percent: f64,
}

impl AgeBand {
    pub fn label(&self) -> String {
        match self.max_age {
            Some(max) => format!("{}-{max}", self.min_age),
            None => format!("{}+", self.min_age),
        }
    }

    pub fn total(&self) -> usize {
        self.male + self.female
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgePyramid {
    pub bands: Vec<AgeBand>,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PopulationStatistics {
    pub population: usize,
    pub births_this_year: u32,
    pub deaths_this_year: u32,
    /// Per 1,000 living citizens.
    pub birth_rate: f64,
    pub death_rate: f64,
    /// Birth rate minus death rate.
    pub growth_rate: f64,
    /// Mean age at death of every deceased citizen.
    pub average_lifespan: f64,
    /// Mean fertility of living women aged 15–49.
    pub fertility_rate: f64,
    pub mean_age: f64,
    pub median_age: f64,
}

pub(super) fn age_pyramid(registry: &CitizenRegistry) -> AgePyramid {
    let mut bands: Vec<AgeBand> = (0..NUM_AGE_BANDS as u32)
        .map(|i| AgeBand {
            min_age: i * AGE_BAND_WIDTH,
            max_age: (i + 1 < NUM_AGE_BANDS as u32).then(|| (i + 1) * AGE_BAND_WIDTH - 1),
            ..AgeBand::default()
        })
        .collect();

    let mut total = 0;
    for c in registry.alive() {
        let index = ((c.age() / AGE_BAND_WIDTH) as usize).min(NUM_AGE_BANDS - 1);
        match c.gender() {
            Gender::Male => bands[index].male += 1,
            Gender::Female => bands[index].female += 1,
        }
        total += 1;
    }

    if total > 0 {
        for band in &mut bands {
            band.male_percent = band.male as f64 / total as f64 * 100.0;
            band.female_percent = band.female as f64 / total as f64 * 100.0;
        }
    }
    AgePyramid { bands, total }
}

pub(super) fn statistics(registry: &CitizenRegistry, counters: &YearCounters) -> PopulationStatistics {
    let mut ages: Vec<u32> = registry.alive().map(|c| c.age()).collect();
    ages.sort_unstable();
    let population = ages.len();

    let per_thousand = |count: u32| {
        if population == 0 {
            0.0
        } else {
            f64::from(count) / population as f64 * 1000.0
        }
    };
    let birth_rate = per_thousand(counters.births);
    let death_rate = per_thousand(counters.deaths);

    let lifespans: Vec<f64> = registry
        .all()
        .filter(|c| !c.is_alive())
        .map(|c| f64::from(c.age()))
        .collect();

    let fertility: Vec<f64> = registry
        .alive()
        .filter(|c| c.gender() == Gender::Female && FERTILE_AGES.contains(&c.age()))
        .map(|c| c.health().fertility)
        .collect();

    let median_age = match population {
        0 => 0.0,
        n if n % 2 == 1 => f64::from(ages[n / 2]),
        n => (f64::from(ages[n / 2 - 1]) + f64::from(ages[n / 2])) / 2.0,
    };

    PopulationStatistics {
        population,
        births_this_year: counters.births,
        deaths_this_year: counters.deaths,
        birth_rate,
        death_rate,
        growth_rate: birth_rate - death_rate,
        average_lifespan: mean(&lifespans),
        fertility_rate: mean(&fertility),
        mean_age: mean(&ages.iter().map(|a| f64::from(*a)).collect::<Vec<_>>()),
        median_age,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::RegionId;
    use crate::model::Profession;
    use crate::testutil::{assert_approx, date, spawn};

    fn sample() -> CitizenRegistry {
        let mut registry = CitizenRegistry::new();
        for (i, (age, gender)) in [
            (3, Gender::Male),
            (25, Gender::Female),
            (27, Gender::Male),
            (40, Gender::Female),
            (95, Gender::Male),
        ]
        .into_iter()
        .enumerate()
        {
            spawn(
                &mut registry,
                &format!("Person {i}"),
                gender,
                age,
                Profession::Farmer,
                RegionId(1),
            );
        }
        registry
    }

    #[test]
    fn pyramid_buckets_by_band_and_gender() {
        let registry = sample();
        let pyramid = age_pyramid(&registry);
        assert_eq!(pyramid.bands.len(), NUM_AGE_BANDS);
        assert_eq!(pyramid.total, 5);
        assert_eq!(pyramid.bands[0].male, 1);
        assert_eq!(pyramid.bands[2].male, 1);
        assert_eq!(pyramid.bands[2].female, 1);
        assert_eq!(pyramid.bands[4].female, 1);
        // 95 falls in the open top band.
        assert_eq!(pyramid.bands[9].male, 1);
        assert_eq!(pyramid.bands[9].label(), "90+");
        assert_eq!(pyramid.bands[2].label(), "20-29");
        assert_approx(pyramid.bands[2].male_percent, 20.0, 1e-9, "20s male share");
        let share: f64 = pyramid
            .bands
            .iter()
            .map(|b| b.male_percent + b.female_percent)
            .sum();
        assert_approx(share, 100.0, 1e-9, "shares sum");
    }

    #[test]
    fn pyramid_of_empty_registry_is_all_zero() {
        let pyramid = age_pyramid(&CitizenRegistry::new());
        assert_eq!(pyramid.total, 0);
        assert!(pyramid.bands.iter().all(|b| b.total() == 0 && b.male_percent == 0.0));
    }

    #[test]
    fn statistics_cover_living_and_dead() {
        let mut registry = sample();
        let oldest = registry.alive().find(|c| c.age() == 95).map(|c| c.id()).unwrap();
        registry.mark_dead(oldest, date(1450, 2), "old age");
        let counters = YearCounters {
            year: Some(1450),
            births: 2,
            deaths: 1,
        };
        let stats = statistics(&registry, &counters);
        assert_eq!(stats.population, 4);
        assert_approx(stats.birth_rate, 500.0, 1e-9, "birth rate");
        assert_approx(stats.death_rate, 250.0, 1e-9, "death rate");
        assert_approx(stats.growth_rate, 250.0, 1e-9, "growth");
        assert_approx(stats.average_lifespan, 95.0, 1e-9, "lifespan");
        assert_approx(stats.mean_age, 23.75, 1e-9, "mean age");
        assert_approx(stats.median_age, 26.0, 1e-9, "median age");
        assert!(stats.fertility_rate > 0.0);
    }
}
