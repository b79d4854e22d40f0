//! Data source adapters
//!
//! This module provides readers that load one kind of on-disk health data and
//! map it to a complete [`HealthSummary`], or report why they could not.

mod apple_export;
mod live_sync;

pub use apple_export::{parse_export, parse_export_timestamp, ExportReader, ParsedExport};
pub use live_sync::{summary_from_snapshot, LiveSyncReader, MAX_SNAPSHOT_AGE_HOURS};

use crate::error::SourceError;
use crate::types::{DataSource, HealthSummary, Timeframe};
use chrono::{DateTime, Utc};

/// Trait for fallible summary sources
pub trait SummarySource {
    /// Which source this reader represents
    fn source(&self) -> DataSource;

    /// Produce a complete summary for `timeframe` as of `now`
    fn read(&self, timeframe: Timeframe, now: DateTime<Utc>)
        -> Result<HealthSummary, SourceError>;
}
