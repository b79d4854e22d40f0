//! Core types for the Vitals Resolver pipeline
//!
//! This module defines the data structures that flow between the readers, the
//! metric extractor and the source resolver: requested timeframes, raw export
//! records, live snapshots and the resolved health summary.

use crate::error::ResolveError;
use crate::window::TimeWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Requested aggregation window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Today,
    Week,
    Month,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::Today, Timeframe::Week, Timeframe::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Today => "today",
            Timeframe::Week => "week",
            Timeframe::Month => "month",
        }
    }

    /// Whole days the window reaches back before today
    pub fn lookback_days(&self) -> i64 {
        match self {
            Timeframe::Today => 0,
            Timeframe::Week => 7,
            Timeframe::Month => 30,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Timeframe::Today),
            "week" => Ok(Timeframe::Week),
            "month" => Ok(Timeframe::Month),
            other => Err(ResolveError::InvalidArgument(format!(
                "timeframe must be one of today, week, month (got {:?})",
                other
            ))),
        }
    }
}

/// Inbound summary request as received from a transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub timeframe: String,
}

impl SummaryRequest {
    /// Parse a JSON request body
    pub fn from_json(json: &str) -> Result<Self, ResolveError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the requested timeframe token
    pub fn timeframe(&self) -> Result<Timeframe, ResolveError> {
        self.timeframe.parse()
    }
}

/// Heart-rate triple in beats per minute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRate {
    pub resting: u32,
    pub average: u32,
    pub max: u32,
}

/// Health metrics summary for one timeframe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub steps: u64,
    pub heart_rate: HeartRate,
    /// Total sleep (hours, one decimal)
    pub sleep_hours: f64,
    pub active_calories: u64,
    pub workouts: u32,
}

/// Record kinds the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    StepCount,
    HeartRate,
    RestingHeartRate,
    SleepAnalysis,
    ActiveEnergyBurned,
    Other,
}

impl RecordKind {
    /// Map an export type identifier onto a record kind
    pub fn from_type_tag(tag: &str) -> Self {
        match tag {
            "HKQuantityTypeIdentifierStepCount" => RecordKind::StepCount,
            "HKQuantityTypeIdentifierHeartRate" => RecordKind::HeartRate,
            "HKQuantityTypeIdentifierRestingHeartRate" => RecordKind::RestingHeartRate,
            "HKCategoryTypeIdentifierSleepAnalysis" => RecordKind::SleepAnalysis,
            "HKQuantityTypeIdentifierActiveEnergyBurned" => RecordKind::ActiveEnergyBurned,
            _ => RecordKind::Other,
        }
    }
}

/// A dated sample from a bulk export
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub kind: RecordKind,
    pub value: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// A workout entry from a bulk export
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawWorkout {
    pub start_time: DateTime<Utc>,
    pub activity_type: Option<String>,
    pub duration_minutes: Option<f64>,
    pub distance: Option<f64>,
    pub energy_kcal: Option<f64>,
}

/// Live-sync snapshot file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    pub steps: Option<f64>,
    pub heart_rate: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub active_calories: Option<f64>,
    /// ISO-8601 time the snapshot was written
    pub timestamp: Option<String>,
}

/// Number of records that contributed to each metric.
///
/// A zero count means the matching summary field holds a sentinel default
/// rather than a measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCoverage {
    pub step_records: usize,
    pub heart_rate_records: usize,
    pub resting_heart_rate_records: usize,
    pub sleep_records: usize,
    pub active_energy_records: usize,
    pub workouts: usize,
}

impl RecordCoverage {
    /// True when no record of any kind fell inside the window
    pub fn is_empty(&self) -> bool {
        *self == RecordCoverage::default()
    }
}

/// Which source produced a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    LiveSync,
    Export,
    Synthetic,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::LiveSync => "live_sync",
            DataSource::Export => "export",
            DataSource::Synthetic => "synthetic",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            DataSource::LiveSync => "live sync",
            DataSource::Export => "health export",
            DataSource::Synthetic => "synthetic data",
        }
    }
}

/// Outcome of one resolution request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedSummary {
    pub request_id: Uuid,
    pub timeframe: Timeframe,
    pub window: TimeWindow,
    pub source: DataSource,
    pub resolved_at: DateTime<Utc>,
    pub summary: HealthSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_parse() {
        assert_eq!("today".parse::<Timeframe>().unwrap(), Timeframe::Today);
        assert_eq!("week".parse::<Timeframe>().unwrap(), Timeframe::Week);
        assert_eq!("month".parse::<Timeframe>().unwrap(), Timeframe::Month);

        for bad in ["", "Today", "year", " week"] {
            let err = bad.parse::<Timeframe>().unwrap_err();
            assert!(matches!(err, ResolveError::InvalidArgument(_)), "{bad:?}");
        }
    }

    #[test]
    fn test_summary_request_validation() {
        let req = SummaryRequest::from_json(r#"{"timeframe": "week"}"#).unwrap();
        assert_eq!(req.timeframe().unwrap(), Timeframe::Week);

        let req = SummaryRequest::from_json(r#"{"timeframe": "decade"}"#).unwrap();
        assert!(matches!(
            req.timeframe(),
            Err(ResolveError::InvalidArgument(_))
        ));

        assert!(matches!(
            SummaryRequest::from_json(r#"{"range": "week"}"#),
            Err(ResolveError::JsonError(_))
        ));
    }

    #[test]
    fn test_type_tag_mapping() {
        assert_eq!(
            RecordKind::from_type_tag("HKQuantityTypeIdentifierStepCount"),
            RecordKind::StepCount
        );
        assert_eq!(
            RecordKind::from_type_tag("HKCategoryTypeIdentifierSleepAnalysis"),
            RecordKind::SleepAnalysis
        );
        assert_eq!(
            RecordKind::from_type_tag("HKQuantityTypeIdentifierBodyMass"),
            RecordKind::Other
        );
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = HealthSummary {
            steps: 1200,
            heart_rate: HeartRate {
                resting: 58,
                average: 71,
                max: 140,
            },
            sleep_hours: 7.2,
            active_calories: 310,
            workouts: 1,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["heartRate"]["resting"], 58);
        assert_eq!(value["sleepHours"], 7.2);
        assert_eq!(value["activeCalories"], 310);
    }
}
