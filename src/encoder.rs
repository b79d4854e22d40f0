//! Summary encoding
//!
//! Renders a resolved summary for transports: a fixed-order human-readable
//! text block, or JSON.

use crate::error::ResolveError;
use crate::types::ResolvedSummary;
use std::fmt::Write;

/// Encoder for resolved summaries
pub struct SummaryEncoder;

impl SummaryEncoder {
    /// Human-readable text.
    ///
    /// Field order is fixed: steps, heart rate (resting, average, max), sleep,
    /// active calories, workouts.
    pub fn to_text(resolved: &ResolvedSummary) -> String {
        let summary = &resolved.summary;
        let hr = &summary.heart_rate;
        let mut out = String::new();

        // Writing to a String cannot fail
        let _ = writeln!(
            out,
            "Health summary ({}, from {})",
            resolved.timeframe,
            resolved.source.label()
        );
        let _ = writeln!(out, "Steps: {}", summary.steps);
        let _ = writeln!(
            out,
            "Heart rate: resting {} bpm, average {} bpm, max {} bpm",
            hr.resting, hr.average, hr.max
        );
        let _ = writeln!(out, "Sleep: {:.1} hours", summary.sleep_hours);
        let _ = writeln!(out, "Active calories: {} kcal", summary.active_calories);
        let _ = write!(out, "Workouts: {}", summary.workouts);

        out
    }

    /// Compact JSON
    pub fn to_json(resolved: &ResolvedSummary) -> Result<String, ResolveError> {
        Ok(serde_json::to_string(resolved)?)
    }

    /// Pretty-printed JSON
    pub fn to_json_pretty(resolved: &ResolvedSummary) -> Result<String, ResolveError> {
        Ok(serde_json::to_string_pretty(resolved)?)
    }
}
