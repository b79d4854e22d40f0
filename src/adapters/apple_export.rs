//! Bulk health export adapter
//!
//! Streams an `export.xml` health export, keeps the `Record` and `Workout`
//! entries that start inside the requested window, and hands them to the
//! metric extractor.
//!
//! Exports are unbounded historical dumps, so two guard rails apply:
//! - the file size is checked with `stat` before the file is opened
//! - the parse loop checks a deadline and gives up once it has passed

use crate::config::{ResolverConfig, EXPORT_FILE_NAME};
use crate::error::SourceError;
use crate::extractor::MetricExtractor;
use crate::types::{DataSource, HealthSummary, RawRecord, RawWorkout, RecordKind, Timeframe};
use crate::window::TimeWindow;
use chrono::{DateTime, FixedOffset, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::debug;

use super::SummarySource;

/// Root element of a health export
const ROOT_ELEMENT: &[u8] = b"HealthData";

/// Directory an unzipped export archive produces
const NESTED_EXPORT_DIR: &str = "apple_health_export";

/// Parse events between deadline checks
const DEADLINE_CHECK_INTERVAL: u64 = 512;

/// Budget used when the configured timeout overflows `Instant`
const UNBOUNDED_PARSE_SECS: u64 = 24 * 60 * 60;

/// Records and workouts that fell inside the window
#[derive(Debug, Default)]
pub struct ParsedExport {
    pub records: Vec<RawRecord>,
    pub workouts: Vec<RawWorkout>,
    /// Entries dropped for an unparseable date
    pub skipped: usize,
    /// Records of a type the extractor does not use
    pub ignored: usize,
}

/// Health export reader
pub struct ExportReader {
    export_dir: PathBuf,
    max_bytes: u64,
    timeout: Duration,
    utc_offset: FixedOffset,
    discovered: OnceLock<PathBuf>,
}

impl ExportReader {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            export_dir: config.export_dir.clone(),
            max_bytes: config.max_export_bytes,
            timeout: config.parse_timeout(),
            utc_offset: config.utc_offset(),
            discovered: OnceLock::new(),
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Find the export document.
    ///
    /// The first successful lookup is cached; later calls reuse it.
    pub fn locate(&self) -> Result<PathBuf, SourceError> {
        if let Some(path) = self.discovered.get() {
            return Ok(path.clone());
        }

        let candidates = [
            self.export_dir.join(EXPORT_FILE_NAME),
            self.export_dir.join(NESTED_EXPORT_DIR).join(EXPORT_FILE_NAME),
        ];

        for candidate in candidates.iter() {
            if candidate.is_file() {
                // A concurrent lookup may have won; both found the same file
                let _ = self.discovered.set(candidate.clone());
                return Ok(candidate.clone());
            }
        }

        Err(SourceError::NotFound(candidates[0].clone()))
    }

    /// Size of the export on disk, rejecting it if over the ceiling
    pub fn checked_size(&self, path: &Path) -> Result<u64, SourceError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound(path.to_path_buf()),
            _ => SourceError::Unavailable(format!("cannot stat {}: {}", path.display(), e)),
        })?;

        let size = metadata.len();
        if size > self.max_bytes {
            return Err(SourceError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(size)
    }
}

impl SummarySource for ExportReader {
    fn source(&self) -> DataSource {
        DataSource::Export
    }

    fn read(
        &self,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Result<HealthSummary, SourceError> {
        let path = self.locate()?;
        let size = self.checked_size(&path)?;

        let window = TimeWindow::resolve_in(timeframe, now, self.utc_offset);
        let file = File::open(&path).map_err(|e| {
            SourceError::Unavailable(format!("cannot open {}: {}", path.display(), e))
        })?;

        let started = Instant::now();
        let deadline = started
            .checked_add(self.timeout)
            .unwrap_or_else(|| started + Duration::from_secs(UNBOUNDED_PARSE_SECS));
        let parsed = parse_export(BufReader::new(file), &window, deadline)?;

        let extraction = MetricExtractor::extract(&parsed.records, &parsed.workouts);
        debug!(
            path = %path.display(),
            size_bytes = size,
            elapsed_ms = started.elapsed().as_millis() as u64,
            records = parsed.records.len(),
            workouts = parsed.workouts.len(),
            skipped = parsed.skipped,
            ignored = parsed.ignored,
            coverage = ?extraction.coverage,
            "parsed health export"
        );

        Ok(extraction.summary)
    }
}

/// Stream an export document, keeping entries that start inside `window`.
///
/// Fails with `Malformed` if the document is not well-formed, is truncated,
/// or has a root other than `HealthData`, and with `Timeout` once `deadline`
/// has passed.
pub fn parse_export<R: BufRead>(
    input: R,
    window: &TimeWindow,
    deadline: Instant,
) -> Result<ParsedExport, SourceError> {
    let budget = deadline.saturating_duration_since(Instant::now());
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut parsed = ParsedExport::default();
    let mut buf = Vec::new();
    let mut depth: usize = 0;
    let mut saw_root = false;
    let mut events: u64 = 0;

    loop {
        if events % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
            return Err(SourceError::Timeout(budget));
        }
        events += 1;

        let event = reader.read_event_into(&mut buf).map_err(|e| {
            SourceError::Malformed(format!("at byte {}: {}", reader.buffer_position(), e))
        })?;

        match event {
            Event::Start(element) => {
                visit_element(&element, depth, &mut saw_root, window, &mut parsed)?;
                depth += 1;
            }
            Event::Empty(element) => {
                visit_element(&element, depth, &mut saw_root, window, &mut parsed)?;
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(SourceError::Malformed(
            "document has no HealthData root".to_string(),
        ));
    }
    if depth != 0 {
        return Err(SourceError::Malformed(
            "document ended before its root was closed".to_string(),
        ));
    }

    Ok(parsed)
}

fn visit_element(
    element: &BytesStart<'_>,
    depth: usize,
    saw_root: &mut bool,
    window: &TimeWindow,
    parsed: &mut ParsedExport,
) -> Result<(), SourceError> {
    if depth == 0 {
        if element.name().as_ref() != ROOT_ELEMENT {
            return Err(SourceError::Malformed(format!(
                "unexpected root element <{}>",
                String::from_utf8_lossy(element.name().as_ref())
            )));
        }
        *saw_root = true;
        return Ok(());
    }

    // Records and workouts are direct children of the root
    if depth != 1 {
        return Ok(());
    }

    match element.name().as_ref() {
        b"Record" => visit_record(element, window, parsed),
        b"Workout" => visit_workout(element, window, parsed),
        _ => Ok(()),
    }
}

fn visit_record(
    element: &BytesStart<'_>,
    window: &TimeWindow,
    parsed: &mut ParsedExport,
) -> Result<(), SourceError> {
    let mut kind = RecordKind::Other;
    let mut value = 0.0;
    let mut start = None;
    let mut end = None;
    let mut non_finite = false;

    for attr in element.attributes() {
        let attr = attr.map_err(|e| SourceError::Malformed(e.to_string()))?;
        let text = attr
            .unescape_value()
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        match attr.key.as_ref() {
            b"type" => kind = RecordKind::from_type_tag(&text),
            b"value" => match text.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => value = v,
                Ok(_) => non_finite = true,
                // Category samples carry a label instead of a number
                Err(_) => value = 0.0,
            },
            b"startDate" => start = Some(parse_export_timestamp(&text)),
            b"endDate" => end = Some(parse_export_timestamp(&text)),
            _ => {}
        }
    }

    if kind == RecordKind::Other {
        parsed.ignored += 1;
        return Ok(());
    }

    let (Some(Some(start_time)), Some(Some(end_time))) = (start, end) else {
        parsed.skipped += 1;
        return Ok(());
    };
    if non_finite {
        parsed.skipped += 1;
        return Ok(());
    }

    if window.contains(start_time) {
        parsed.records.push(RawRecord {
            kind,
            value,
            start_time,
            end_time,
        });
    }
    Ok(())
}

fn visit_workout(
    element: &BytesStart<'_>,
    window: &TimeWindow,
    parsed: &mut ParsedExport,
) -> Result<(), SourceError> {
    let mut start = None;
    let mut activity_type = None;
    let mut duration_minutes = None;
    let mut distance = None;
    let mut energy_kcal = None;

    for attr in element.attributes() {
        let attr = attr.map_err(|e| SourceError::Malformed(e.to_string()))?;
        let text = attr
            .unescape_value()
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        match attr.key.as_ref() {
            b"startDate" => start = parse_export_timestamp(&text),
            b"workoutActivityType" => activity_type = Some(text.into_owned()),
            b"duration" => duration_minutes = parse_finite(&text),
            b"totalDistance" => distance = parse_finite(&text),
            b"totalEnergyBurned" => energy_kcal = parse_finite(&text),
            _ => {}
        }
    }

    let Some(start_time) = start else {
        parsed.skipped += 1;
        return Ok(());
    };

    if window.contains(start_time) {
        parsed.workouts.push(RawWorkout {
            start_time,
            activity_type,
            duration_minutes,
            distance,
            energy_kcal,
        });
    }
    Ok(())
}

fn parse_finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an export timestamp (`2024-01-15 08:00:00 -0800`), also accepting
/// RFC 3339
pub fn parse_export_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S %z")
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .map(|t| t.with_timezone(&Utc))
        .ok()
}
