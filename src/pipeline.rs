//! Source resolution
//!
//! This module provides the public API for Vitals Resolver. It walks the
//! fallback chain for a requested timeframe and always returns a usable
//! summary:
//!
//! 1. `LiveSyncReader` - fresh snapshot from the sync companion
//! 2. `ExportReader` - bulk health export
//! 3. `SyntheticGenerator` - deterministic plausible data
//!
//! Each source is tried at most once per request. Source failures are logged
//! and never reach the caller.

use crate::adapters::{ExportReader, LiveSyncReader, SummarySource};
use crate::config::ResolverConfig;
use crate::encoder::SummaryEncoder;
use crate::error::{ResolveError, SourceError};
use crate::synthetic::SyntheticGenerator;
use crate::types::{DataSource, HealthSummary, ResolvedSummary, SummaryRequest, Timeframe};
use crate::window::{Clock, SystemClock, TimeWindow};
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

/// Resolve a summary for a raw timeframe token with the given configuration.
///
/// # Arguments
/// * `config` - Source locations and guard-rail limits
/// * `timeframe` - One of `today`, `week`, `month`
///
/// # Returns
/// The resolved summary, or `InvalidArgument` for an unknown timeframe
///
/// # Example
/// ```ignore
/// let resolved = resolve_summary(&ResolverConfig::for_home("/home/ana"), "week")?;
/// println!("{}", SummaryEncoder::to_text(&resolved));
/// ```
pub fn resolve_summary(
    config: &ResolverConfig,
    timeframe: &str,
) -> Result<ResolvedSummary, ResolveError> {
    let timeframe: Timeframe = timeframe.parse()?;
    Ok(SourceResolver::new(config).resolve(timeframe))
}

/// Resolver that owns the source readers and the fallback policy.
///
/// Cheap to share: readers hold only paths and limits, plus the cached export
/// location.
pub struct SourceResolver {
    live_sync: LiveSyncReader,
    export: ExportReader,
    synthetic: SyntheticGenerator,
    clock: Arc<dyn Clock>,
    utc_offset: FixedOffset,
}

impl SourceResolver {
    /// Create a resolver reading the wall clock
    pub fn new(config: &ResolverConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a resolver with an injected clock
    pub fn with_clock(config: &ResolverConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            live_sync: LiveSyncReader::new(config.live_sync_path.clone())
                .with_utc_offset(config.utc_offset()),
            export: ExportReader::new(config),
            synthetic: SyntheticGenerator::new(config),
            clock,
            utc_offset: config.utc_offset(),
        }
    }

    pub fn live_sync(&self) -> &LiveSyncReader {
        &self.live_sync
    }

    pub fn export(&self) -> &ExportReader {
        &self.export
    }

    /// Resolve a summary as of the clock's current instant
    pub fn resolve(&self, timeframe: Timeframe) -> ResolvedSummary {
        self.resolve_at(timeframe, self.clock.now())
    }

    /// Resolve a summary as of `now`
    pub fn resolve_at(&self, timeframe: Timeframe, now: DateTime<Utc>) -> ResolvedSummary {
        let request_id = Uuid::new_v4();
        let span = info_span!("resolve", %request_id, timeframe = timeframe.as_str());
        let _guard = span.enter();

        let (source, summary) = self.walk_chain(timeframe, now);
        info!(source = source.as_str(), "resolved health summary");

        ResolvedSummary {
            request_id,
            timeframe,
            window: TimeWindow::resolve_in(timeframe, now, self.utc_offset),
            source,
            resolved_at: now,
            summary,
        }
    }

    /// Validate a JSON request and render the text response
    pub fn handle_request(&self, request_json: &str) -> Result<String, ResolveError> {
        let request = SummaryRequest::from_json(request_json)?;
        let timeframe = request.timeframe()?;
        Ok(SummaryEncoder::to_text(&self.resolve(timeframe)))
    }

    fn walk_chain(&self, timeframe: Timeframe, now: DateTime<Utc>) -> (DataSource, HealthSummary) {
        let sources: [&dyn SummarySource; 2] = [&self.live_sync, &self.export];

        for source in sources {
            match source.read(timeframe, now) {
                Ok(summary) => return (source.source(), summary),
                Err(err) => log_fallback(source.source(), &err),
            }
        }

        (
            DataSource::Synthetic,
            self.synthetic.generate(timeframe, now),
        )
    }
}

fn log_fallback(source: DataSource, err: &SourceError) {
    if err.is_data_issue() {
        warn!(
            source = source.as_str(),
            error.code = err.code(),
            error = %err,
            "source unusable, falling back"
        );
    } else {
        debug!(
            source = source.as_str(),
            error.code = err.code(),
            error = %err,
            "source unavailable, falling back"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 18, 15, 0, 0).unwrap()
    }

    const FRESH_SNAPSHOT: &str = r#"{
        "steps": 4321,
        "heartRate": 70,
        "sleepHours": 7.1,
        "activeCalories": 350,
        "timestamp": "2025-07-18T14:00:00Z"
    }"#;

    const VALID_EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<HealthData locale="en_US">
 <Record type="HKQuantityTypeIdentifierStepCount" startDate="2025-07-18 08:00:00 +0000" endDate="2025-07-18 08:10:00 +0000" value="9876"/>
 <Record type="HKQuantityTypeIdentifierHeartRate" startDate="2025-07-18 09:00:00 +0000" endDate="2025-07-18 09:00:00 +0000" value="77"/>
</HealthData>
"#;

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn config(&self) -> ResolverConfig {
            ResolverConfig::for_home(self.dir.path())
        }

        fn write_snapshot(&self, json: &str) {
            let path = self.config().live_sync_path;
            write(&path, json);
        }

        fn write_export(&self, xml: &str) {
            let path = self.config().export_dir.join("export.xml");
            write(&path, xml);
        }

        fn resolver(&self) -> SourceResolver {
            SourceResolver::with_clock(&self.config(), Arc::new(crate::window::FixedClock(now())))
        }
    }

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_live_sync_preferred_over_export() {
        let fixture = Fixture::new();
        fixture.write_snapshot(FRESH_SNAPSHOT);
        fixture.write_export(VALID_EXPORT);

        let resolved = fixture.resolver().resolve(Timeframe::Today);
        assert_eq!(resolved.source, DataSource::LiveSync);
        assert_eq!(resolved.summary.steps, 4321);
        assert_eq!(resolved.summary.workouts, 1);
    }

    #[test]
    fn test_export_used_when_snapshot_stale() {
        let fixture = Fixture::new();
        fixture.write_snapshot(r#"{"steps": 1, "timestamp": "2025-07-16T00:00:00Z"}"#);
        fixture.write_export(VALID_EXPORT);

        let resolved = fixture.resolver().resolve(Timeframe::Today);
        assert_eq!(resolved.source, DataSource::Export);
        assert_eq!(resolved.summary.steps, 9876);
        assert_eq!(resolved.summary.heart_rate.average, 77);
    }

    #[test]
    fn test_synthetic_when_export_truncated() {
        let fixture = Fixture::new();
        fixture.write_export(&VALID_EXPORT[..VALID_EXPORT.len() - 20]);

        let resolver = fixture.resolver();
        let resolved = resolver.resolve(Timeframe::Week);
        assert_eq!(resolved.source, DataSource::Synthetic);
        assert_eq!(
            resolved.summary,
            SyntheticGenerator::new(&fixture.config()).generate(Timeframe::Week, now())
        );
    }

    #[test]
    fn test_synthetic_when_export_too_large() {
        let fixture = Fixture::new();
        fixture.write_export(VALID_EXPORT);
        let config = fixture.config().with_max_export_bytes(16);

        let resolver = SourceResolver::with_clock(&config, Arc::new(crate::window::FixedClock(now())));
        assert_eq!(resolver.resolve(Timeframe::Today).source, DataSource::Synthetic);
    }

    #[test]
    fn test_synthetic_when_nothing_present() {
        let fixture = Fixture::new();
        let resolver = fixture.resolver();

        for timeframe in Timeframe::ALL {
            let resolved = resolver.resolve(timeframe);
            assert_eq!(resolved.source, DataSource::Synthetic);
            assert_eq!(resolved.timeframe, timeframe);
            assert_eq!(resolved.resolved_at, now());
            assert!(resolved.window.contains(now()));
        }
    }

    #[test]
    fn test_every_timeframe_yields_complete_summary() {
        let fixture = Fixture::new();
        fixture.write_export(VALID_EXPORT);
        let resolver = fixture.resolver();

        for timeframe in Timeframe::ALL {
            let summary = resolver.resolve(timeframe).summary;
            assert!(summary.sleep_hours >= 0.0);
            assert!(summary.heart_rate.resting > 0);
            assert!(summary.heart_rate.max >= summary.heart_rate.average);
        }
    }

    #[test]
    fn test_resolve_summary_rejects_unknown_timeframe() {
        let fixture = Fixture::new();
        let result = resolve_summary(&fixture.config(), "fortnight");
        assert!(matches!(result, Err(ResolveError::InvalidArgument(_))));
    }

    #[test]
    fn test_handle_request() {
        let fixture = Fixture::new();
        fixture.write_snapshot(FRESH_SNAPSHOT);
        let resolver = fixture.resolver();

        let text = resolver.handle_request(r#"{"timeframe": "today"}"#).unwrap();
        assert!(text.contains("Steps: 4321"));

        assert!(matches!(
            resolver.handle_request(r#"{"timeframe": "yesterday"}"#),
            Err(ResolveError::InvalidArgument(_))
        ));
        assert!(matches!(
            resolver.handle_request("{"),
            Err(ResolveError::JsonError(_))
        ));
    }
}
