//! Timeframe windows
//!
//! Converts a requested timeframe into a concrete `[start, end]` interval at
//! day granularity. The current instant always comes from a [`Clock`], so
//! window resolution is reproducible in tests.

use crate::types::Timeframe;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Inclusive time interval `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Resolve a timeframe relative to `now`, with day boundaries in UTC
    pub fn resolve(timeframe: Timeframe, now: DateTime<Utc>) -> Self {
        Self::resolve_in(timeframe, now, utc())
    }

    /// Resolve a timeframe relative to `now`, with day boundaries taken in
    /// the given offset.
    ///
    /// `today` spans local midnight to 23:59:59.999. `week` and `month` start
    /// at local midnight 7 and 30 days earlier and end with today.
    pub fn resolve_in(timeframe: Timeframe, now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let today = now.with_timezone(&offset).date_naive();
        let end = local_midnight(today, offset) + Duration::days(1) - Duration::milliseconds(1);
        let start_day = today - Duration::days(timeframe.lookback_days());
        let start = local_midnight(start_day, offset);

        TimeWindow { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// True when `instant` falls inside the window, both ends included
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Midnight of `date` in `offset`, as a UTC instant
fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::default());
    let utc_naive = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::<Utc>::from_naive_utc_and_offset(utc_naive, Utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn reference_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 18, 15, 0, 0).unwrap()
    }

    #[test]
    fn test_today_window() {
        let window = TimeWindow::resolve(Timeframe::Today, reference_now());

        assert_eq!(
            window.start(),
            Utc.with_ymd_and_hms(2025, 7, 18, 0, 0, 0).unwrap()
        );
        assert_eq!(
            window.end(),
            Utc.with_ymd_and_hms(2025, 7, 18, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_week_and_month_windows() {
        let today = TimeWindow::resolve(Timeframe::Today, reference_now());
        let week = TimeWindow::resolve(Timeframe::Week, reference_now());
        let month = TimeWindow::resolve(Timeframe::Month, reference_now());

        assert_eq!(
            week.start(),
            Utc.with_ymd_and_hms(2025, 7, 11, 0, 0, 0).unwrap()
        );
        assert_eq!(
            month.start(),
            Utc.with_ymd_and_hms(2025, 6, 18, 0, 0, 0).unwrap()
        );
        assert_eq!(week.end(), today.end());
        assert_eq!(month.end(), today.end());
    }

    #[test]
    fn test_windows_never_invert() {
        let midnight = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let last_ms = midnight + Duration::days(1) - Duration::milliseconds(1);

        for now in [midnight, last_ms] {
            for timeframe in Timeframe::ALL {
                let window = TimeWindow::resolve(timeframe, now);
                assert!(window.start() <= window.end());
                assert!(window.contains(now));
            }
        }
    }

    #[test]
    fn test_offset_moves_day_boundary() {
        // 02:00 UTC is still the previous evening at UTC-5
        let now = Utc.with_ymd_and_hms(2025, 7, 18, 2, 0, 0).unwrap();
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let window = TimeWindow::resolve_in(Timeframe::Today, now, offset);

        assert_eq!(
            window.start(),
            Utc.with_ymd_and_hms(2025, 7, 17, 5, 0, 0).unwrap()
        );
        assert!(window.contains(now));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let window = TimeWindow::resolve(Timeframe::Today, reference_now());
        assert!(window.contains(window.start()));
        assert!(window.contains(window.end()));
        assert!(!window.contains(window.end() + Duration::milliseconds(1)));
        assert!(!window.contains(window.start() - Duration::milliseconds(1)));
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock(reference_now());
        assert_eq!(clock.now(), reference_now());
    }
}
