//! Synthetic health data
//!
//! Terminal fallback of the resolver. Produces plausible metrics from a seed
//! derived from the calendar date (and optionally the hour), so the output is
//! stable for a given day but varies across days. Never fails and never
//! touches the filesystem.

use crate::config::{ResolverConfig, SeedGranularity};
use crate::types::{HealthSummary, HeartRate, Timeframe};
use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike, Utc};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::ops::{Range, RangeInclusive};

/// Seed for a given instant: day of month plus zero-based month index, plus
/// the hour for hourly granularity
pub fn synthetic_seed<Tz: TimeZone>(now: &DateTime<Tz>, granularity: SeedGranularity) -> u64 {
    let daily = u64::from(now.day()) + u64::from(now.month0());
    match granularity {
        SeedGranularity::Daily => daily,
        SeedGranularity::Hourly => daily + u64::from(now.hour()),
    }
}

/// Value ranges for one timeframe
struct Bands {
    steps: Range<u64>,
    sleep_hours: Range<f64>,
    active_calories: Range<u64>,
    workouts: RangeInclusive<u32>,
}

/// Totals scale with the number of days in the window
fn bands(timeframe: Timeframe) -> Bands {
    match timeframe {
        Timeframe::Today => Bands {
            steps: 6_000..12_000,
            sleep_hours: 6.5..8.5,
            active_calories: 300..700,
            workouts: 0..=1,
        },
        Timeframe::Week => Bands {
            steps: 45_000..80_000,
            sleep_hours: 45.0..58.0,
            active_calories: 2_100..4_500,
            workouts: 3..=6,
        },
        Timeframe::Month => Bands {
            steps: 190_000..330_000,
            sleep_hours: 195.0..250.0,
            active_calories: 9_000..19_000,
            workouts: 12..=24,
        },
    }
}

/// Deterministic-per-seed generator of plausible summaries
pub struct SyntheticGenerator {
    granularity: SeedGranularity,
    utc_offset: FixedOffset,
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new(&ResolverConfig::default())
    }
}

impl SyntheticGenerator {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            granularity: config.seed_granularity,
            utc_offset: config.utc_offset(),
        }
    }

    /// Generate a summary for `timeframe` as of `now`
    pub fn generate(&self, timeframe: Timeframe, now: DateTime<Utc>) -> HealthSummary {
        let local = now.with_timezone(&self.utc_offset);
        let mut rng = ChaCha8Rng::seed_from_u64(synthetic_seed(&local, self.granularity));
        let bands = bands(timeframe);

        // Rates are per-beat, so they do not scale with the window
        let resting: u32 = rng.gen_range(55..68);
        let average = resting + rng.gen_range(8..22);
        let max = average + rng.gen_range(45..75);

        let sleep_hours = (rng.gen_range(bands.sleep_hours) * 10.0).round() / 10.0;

        HealthSummary {
            steps: rng.gen_range(bands.steps),
            heart_rate: HeartRate {
                resting,
                average,
                max,
            },
            sleep_hours,
            active_calories: rng.gen_range(bands.active_calories),
            workouts: rng.gen_range(bands.workouts),
        }
    }
}
