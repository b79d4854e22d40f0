//! Metric extraction
//!
//! This module aggregates window-filtered export records into a health summary:
//! - Step and active-energy totals
//! - Heart-rate average, maximum and latest resting value
//! - Total sleep duration
//! - Workout count
//!
//! Every metric is computed independently and has a fixed default for the
//! empty case, so extraction is total over any input.

use crate::types::{HealthSummary, HeartRate, RawRecord, RawWorkout, RecordCoverage, RecordKind};

/// Resting rate reported when no resting samples exist
pub const DEFAULT_RESTING_HR: u32 = 60;

/// Heart-rate triple reported when no heart-rate samples exist
pub const NO_DATA_HEART_RATE: HeartRate = HeartRate {
    resting: 60,
    average: 80,
    max: 120,
};

/// Sleep reported when no sleep samples exist (hours)
pub const DEFAULT_SLEEP_HOURS: f64 = 7.5;

/// Summary plus the record counts behind it
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub summary: HealthSummary,
    pub coverage: RecordCoverage,
}

/// Extractor for turning raw records into summary metrics
pub struct MetricExtractor;

impl MetricExtractor {
    /// Extract metrics from records and workouts already filtered to a window
    pub fn extract(records: &[RawRecord], workouts: &[RawWorkout]) -> Extraction {
        let coverage = compute_coverage(records, workouts);

        let summary = HealthSummary {
            steps: compute_steps(records),
            heart_rate: compute_heart_rate(records),
            sleep_hours: compute_sleep_hours(records),
            active_calories: compute_active_calories(records),
            workouts: u32::try_from(workouts.len()).unwrap_or(u32::MAX),
        };

        Extraction { summary, coverage }
    }
}

fn of_kind(records: &[RawRecord], kind: RecordKind) -> impl Iterator<Item = &RawRecord> {
    records.iter().filter(move |r| r.kind == kind)
}

fn round_u64(value: f64) -> u64 {
    // `as` saturates, so negative sums clamp to zero
    value.round() as u64
}

fn round_u32(value: f64) -> u32 {
    value.round() as u32
}

/// Sum of step-count samples
fn compute_steps(records: &[RawRecord]) -> u64 {
    round_u64(of_kind(records, RecordKind::StepCount).map(|r| r.value).sum())
}

/// Average and maximum over heart-rate samples, resting from the latest
/// resting sample
fn compute_heart_rate(records: &[RawRecord]) -> HeartRate {
    let samples: Vec<f64> = of_kind(records, RecordKind::HeartRate)
        .map(|r| r.value)
        .collect();

    if samples.is_empty() {
        return NO_DATA_HEART_RATE;
    }

    let average = samples.iter().sum::<f64>() / samples.len() as f64;
    let max = samples.iter().copied().fold(f64::MIN, f64::max);

    let resting = of_kind(records, RecordKind::RestingHeartRate)
        .max_by_key(|r| r.start_time)
        .map(|r| round_u32(r.value))
        .unwrap_or(DEFAULT_RESTING_HR);

    HeartRate {
        resting,
        average: round_u32(average),
        max: round_u32(max),
    }
}

/// Total time covered by sleep samples, in hours to one decimal
fn compute_sleep_hours(records: &[RawRecord]) -> f64 {
    let mut any = false;
    let mut minutes = 0.0;

    for record in of_kind(records, RecordKind::SleepAnalysis) {
        any = true;
        minutes += (record.end_time - record.start_time).num_milliseconds() as f64 / 60_000.0;
    }

    if !any {
        return DEFAULT_SLEEP_HOURS;
    }

    ((minutes / 60.0) * 10.0).round().max(0.0) / 10.0
}

/// Sum of active-energy samples (kcal)
fn compute_active_calories(records: &[RawRecord]) -> u64 {
    round_u64(
        of_kind(records, RecordKind::ActiveEnergyBurned)
            .map(|r| r.value)
            .sum(),
    )
}

fn compute_coverage(records: &[RawRecord], workouts: &[RawWorkout]) -> RecordCoverage {
    let mut coverage = RecordCoverage {
        workouts: workouts.len(),
        ..Default::default()
    };

    for record in records {
        match record.kind {
            RecordKind::StepCount => coverage.step_records += 1,
            RecordKind::HeartRate => coverage.heart_rate_records += 1,
            RecordKind::RestingHeartRate => coverage.resting_heart_rate_records += 1,
            RecordKind::SleepAnalysis => coverage.sleep_records += 1,
            RecordKind::ActiveEnergyBurned => coverage.active_energy_records += 1,
            RecordKind::Other => {}
        }
    }

    coverage
}
