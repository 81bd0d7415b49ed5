//! Wall-clock access and the date-derived label values.
//!
//! The engine never reads the system time directly: it asks a [`Clock`], so
//! tests can pin time with [`FixedClock`].

use chrono::{
    Local,
    NaiveDate,
    NaiveDateTime,
    Timelike,
};

/// Date-time layouts accepted for `startDate`, tried in order.
const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

/// Date-only layouts accepted for `startDate`. Day-first wins over
/// month-first for slash-separated dates.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// Source of the current local time.
pub trait Clock {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;

    /// Current local date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Clock backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Parse a configured start date. Returns `None` for blank or unknown input.
pub fn parse_start_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// True when `start_date` parses to a day after `today`, i.e. `{date}` would
/// render negative.
pub fn starts_in_future(start_date: Option<&str>, today: NaiveDate) -> bool {
    start_date
        .and_then(parse_start_date)
        .is_some_and(|start| start.date() > today)
}

/// Whole days elapsed between `start_date` and `now`, truncated towards zero.
///
/// Yields `0` when no start date is configured or it cannot be parsed.
pub fn elapsed_days(start_date: Option<&str>, now: NaiveDateTime) -> i64 {
    match start_date.and_then(parse_start_date) {
        Some(start) => now.signed_duration_since(start).num_days(),
        None => {
            if let Some(raw) = start_date.filter(|s| !s.trim().is_empty()) {
                tracing::debug!(start_date = raw, "unparsable start date, using 0 days");
            }
            0
        }
    }
}

/// Half-seconds elapsed since midnight of `now`.
///
/// Midnight is taken from the same instant, so a call straddling midnight
/// cannot mix two different days.
pub fn ms_revision(now: NaiveDateTime) -> u32 {
    now.time().num_seconds_from_midnight() / 2
}
