//! Organization clock.
//!
//! "Today" for planning and due-date checks is defined by a fixed
//! organization UTC offset, independent of the client's timezone and of
//! the host's locale. Domain code takes an [`OrgClock`] value instead of
//! reading ambient system time, so tests can pin the clock.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use crate::errors::CoreError;

/// Timestamp format used everywhere in storage and API payloads.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Date format used everywhere in storage and API payloads.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Clock carrying the organization's fixed UTC offset.
#[derive(Clone, Copy, Debug)]
pub enum OrgClock {
    /// Wall clock shifted into the organization offset.
    Wall {
        /// Fixed offset from UTC.
        offset: FixedOffset,
    },
    /// Pinned instant, for tests.
    Fixed {
        /// The pinned instant, already in the organization offset.
        now: DateTime<FixedOffset>,
    },
}

impl OrgClock {
    /// Wall clock at the given whole-hour UTC offset.
    ///
    /// Out-of-range offsets fall back to UTC.
    pub fn with_offset_hours(hours: i32) -> Self {
        let offset = FixedOffset::east_opt(hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
        Self::Wall { offset }
    }

    /// Pinned clock for tests, from an ISO timestamp and offset hours.
    pub fn fixed(iso: &str, offset_hours: i32) -> Result<Self, CoreError> {
        let offset = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or_else(|| CoreError::InvalidTimestamp(format!("offset {offset_hours}h")))?;
        let utc = parse_timestamp(iso)?;
        Ok(Self::Fixed {
            now: utc.with_timezone(&offset),
        })
    }

    /// Current instant in the organization offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        match self {
            Self::Wall { offset } => Utc::now().with_timezone(offset),
            Self::Fixed { now } => *now,
        }
    }

    /// Current instant as UTC.
    pub fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }

    /// Current instant as a stored ISO timestamp (UTC).
    pub fn now_iso(&self) -> String {
        self.now_utc().format(TIMESTAMP_FORMAT).to_string()
    }

    /// Today's calendar date in the organization offset.
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

impl Default for OrgClock {
    /// Defaults to UTC+3 (the organization's home timezone).
    fn default() -> Self {
        Self::with_offset_hours(3)
    }
}

/// Parse a stored ISO timestamp into a UTC instant.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, CoreError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| CoreError::InvalidTimestamp(s.to_string()))
}

/// Parse a `YYYY-MM-DD` date string.
pub fn parse_date(s: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| CoreError::InvalidDate(s.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn fixed_clock_reports_pinned_instant() {
        let clock = OrgClock::fixed("2024-03-01T12:00:00Z", 3).unwrap();
        assert_eq!(clock.now_iso(), "2024-03-01T12:00:00Z");
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn offset_shifts_today_across_midnight() {
        // 22:30 UTC is already the next day at UTC+3.
        let clock = OrgClock::fixed("2024-03-01T22:30:00Z", 3).unwrap();
        assert_eq!(clock.today().day(), 2);
    }

    #[test]
    fn negative_offset_shifts_back() {
        // 01:00 UTC is still the previous day at UTC-5.
        let clock = OrgClock::fixed("2024-03-02T01:00:00Z", -5).unwrap();
        assert_eq!(clock.today().day(), 1);
    }

    #[test]
    fn parse_timestamp_roundtrip() {
        let ts = parse_timestamp("2024-06-15T08:30:00Z").unwrap();
        assert_eq!(ts.format(TIMESTAMP_FORMAT).to_string(), "2024-06-15T08:30:00Z");
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn parse_date_rejects_bad_format() {
        assert!(parse_date("15/06/2024").is_err());
        assert!(parse_date("2024-13-40").is_err());
    }

    #[test]
    fn invalid_fixed_offset_rejected() {
        assert!(OrgClock::fixed("2024-01-01T00:00:00Z", 99).is_err());
    }

    #[test]
    fn default_is_utc_plus_three() {
        let OrgClock::Wall { offset } = OrgClock::default() else {
            panic!("default must be a wall clock");
        };
        assert_eq!(offset.local_minus_utc(), 3 * 3600);
    }
}
