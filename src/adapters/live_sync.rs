//! Live-sync snapshot adapter
//!
//! Reads the small JSON file a companion sync app keeps up to date and maps
//! its scalar readings to a health summary. Snapshots older than
//! [`MAX_SNAPSHOT_AGE_HOURS`] are ignored.

use crate::error::SourceError;
use crate::types::{DataSource, HealthSummary, HeartRate, LiveSnapshot, Timeframe};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Offset, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::SummarySource;

/// Snapshots at least this old are stale
pub const MAX_SNAPSHOT_AGE_HOURS: i64 = 24;

const DEFAULT_STEPS: f64 = 0.0;
const DEFAULT_HEART_RATE: f64 = 75.0;
const DEFAULT_SLEEP_HOURS: f64 = 7.5;
const DEFAULT_ACTIVE_CALORIES: f64 = 400.0;

// A snapshot holds one instantaneous reading, so the triple is spread around it
const RESTING_OFFSET_BPM: u32 = 10;
const MAX_OFFSET_BPM: u32 = 60;

/// Calories above which today counts as having one workout
const WORKOUT_CALORIE_THRESHOLD: u64 = 300;
/// Workout count reported for multi-day timeframes
const MULTI_DAY_WORKOUTS: u32 = 5;

/// Live-sync snapshot reader
pub struct LiveSyncReader {
    path: PathBuf,
    utc_offset: FixedOffset,
}

impl LiveSyncReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            utc_offset: Utc.fix(),
        }
    }

    /// Offset used to read snapshot timestamps that carry none
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot and check that it is fresh
    pub fn load(&self, now: DateTime<Utc>) -> Result<LiveSnapshot, SourceError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                SourceError::Unavailable(format!("no snapshot at {}", self.path.display()))
            }
            _ => SourceError::Unavailable(format!(
                "cannot read {}: {}",
                self.path.display(),
                e
            )),
        })?;

        let snapshot: LiveSnapshot = serde_json::from_str(&raw)
            .map_err(|e| SourceError::Unavailable(format!("snapshot is not valid JSON: {}", e)))?;

        let taken_at = snapshot
            .timestamp
            .as_deref()
            .ok_or_else(|| SourceError::Unavailable("snapshot has no timestamp".to_string()))
            .and_then(|ts| {
                parse_snapshot_timestamp(ts, self.utc_offset).ok_or_else(|| {
                    SourceError::Unavailable(format!("bad snapshot timestamp {:?}", ts))
                })
            })?;

        let age = now - taken_at;
        if age >= Duration::hours(MAX_SNAPSHOT_AGE_HOURS) {
            return Err(SourceError::Unavailable(format!(
                "snapshot is stale ({}h old)",
                age.num_hours()
            )));
        }

        debug!(
            path = %self.path.display(),
            age_minutes = age.num_minutes(),
            "live snapshot is fresh"
        );

        Ok(snapshot)
    }
}

impl SummarySource for LiveSyncReader {
    fn source(&self) -> DataSource {
        DataSource::LiveSync
    }

    fn read(
        &self,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Result<HealthSummary, SourceError> {
        let snapshot = self.load(now)?;
        Ok(summary_from_snapshot(&snapshot, timeframe))
    }
}

/// Parse an ISO-8601 snapshot timestamp.
///
/// Accepts RFC 3339, basic offsets (`+0000`), and local times without an
/// offset, which are read in `offset`.
pub fn parse_snapshot_timestamp(text: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z"))
    {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()?
        .and_local_timezone(offset)
        .single()
        .map(|t| t.with_timezone(&Utc))
}

/// Map a snapshot's scalar readings to a summary.
///
/// Missing fields take fixed defaults. The heart-rate triple is derived from
/// the single current reading, and the workout count is estimated from the
/// timeframe because snapshots carry no workout history.
pub fn summary_from_snapshot(snapshot: &LiveSnapshot, timeframe: Timeframe) -> HealthSummary {
    let steps = non_negative(snapshot.steps.unwrap_or(DEFAULT_STEPS)).round() as u64;
    // A non-positive pulse is no reading at all
    let heart_rate = snapshot
        .heart_rate
        .filter(|bpm| bpm.is_finite() && *bpm >= 1.0)
        .unwrap_or(DEFAULT_HEART_RATE)
        .round() as u32;
    let sleep_hours = non_negative(snapshot.sleep_hours.unwrap_or(DEFAULT_SLEEP_HOURS));
    let active_calories =
        non_negative(snapshot.active_calories.unwrap_or(DEFAULT_ACTIVE_CALORIES)).round() as u64;

    let workouts = match timeframe {
        Timeframe::Today => u32::from(active_calories > WORKOUT_CALORIE_THRESHOLD),
        Timeframe::Week | Timeframe::Month => MULTI_DAY_WORKOUTS,
    };

    HealthSummary {
        steps,
        heart_rate: HeartRate {
            resting: heart_rate.saturating_sub(RESTING_OFFSET_BPM).max(1),
            average: heart_rate,
            max: heart_rate.saturating_add(MAX_OFFSET_BPM),
        },
        sleep_hours,
        active_calories,
        workouts,
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
