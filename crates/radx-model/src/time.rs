//! Time handling for rays and volumes.
//!
//! Radar times are kept as whole UTC seconds plus a nanosecond remainder,
//! which is how ray timestamps arrive from the acquisition systems.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// A UTC time with nanosecond resolution.
///
/// Deserialized values go through [`RadxTime::new`], so documents may carry
/// an oversized remainder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawRadxTime")]
pub struct RadxTime {
    /// Seconds since the Unix epoch.
    pub secs: i64,
    /// Sub-second remainder in nanoseconds, always < 1e9.
    pub nanos: u32,
}

#[derive(Deserialize)]
struct RawRadxTime {
    secs: i64,
    #[serde(default)]
    nanos: u32,
}

impl From<RawRadxTime> for RadxTime {
    fn from(raw: RawRadxTime) -> Self {
        Self::new(raw.secs, raw.nanos)
    }
}

impl RadxTime {
    pub fn new(secs: i64, nanos: u32) -> Self {
        // Normalize an out-of-range remainder into whole seconds
        let carry = (nanos / NANOS_PER_SEC) as i64;
        Self {
            secs: secs + carry,
            nanos: nanos % NANOS_PER_SEC,
        }
    }

    pub fn from_secs(secs: i64) -> Self {
        Self { secs, nanos: 0 }
    }

    pub fn from_datetime(dt: &DateTime<Utc>) -> Self {
        Self::new(dt.timestamp(), dt.timestamp_subsec_nanos())
    }

    /// Parse an ISO 8601 time, with or without the trailing zone designator.
    pub fn from_iso8601(s: &str) -> Result<Self, TimeParseError> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::from_datetime(&dt.with_timezone(&Utc)));
        }

        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(Self::from_datetime(&Utc.from_utc_datetime(&ndt)));
            }
        }

        Err(TimeParseError::InvalidFormat(s.to_string()))
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.secs, self.nanos).unwrap_or_default()
    }

    /// Time as fractional seconds since the epoch.
    pub fn as_secs_f64(&self) -> f64 {
        self.secs as f64 + self.nanos as f64 / 1.0e9
    }

    /// Signed difference `self - earlier` in seconds.
    pub fn secs_since(&self, earlier: &RadxTime) -> f64 {
        (self.secs - earlier.secs) as f64 + (self.nanos as f64 - earlier.nanos as f64) / 1.0e9
    }

    /// Round the remainder to milliseconds, carrying into the seconds when
    /// rounding reaches a full second.
    pub fn rounded_millis(&self) -> (i64, u32) {
        let millis = (self.nanos as f64 / 1.0e6).round() as u32;
        if millis > 999 {
            (self.secs + 1, millis - 1000)
        } else {
            (self.secs, millis)
        }
    }

    /// W3C form, `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn w3c(&self) -> String {
        self.to_datetime().format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// Dashed form with milliseconds, `YYYY-MM-DD HH:MM:SS.mmm`.
    pub fn dashed_millis(&self) -> String {
        let (secs, millis) = self.rounded_millis();
        let dt = DateTime::from_timestamp(secs, 0).unwrap_or_default();
        format!("{}.{:03}", dt.format("%Y-%m-%d %H:%M:%S"), millis)
    }

    /// Compact form used in file names, `YYYYMMDD<sep>HHMMSS`.
    pub fn compact(&self, separator: char) -> String {
        let dt = self.to_datetime();
        format!(
            "{}{}{}",
            dt.format("%Y%m%d"),
            separator,
            dt.format("%H%M%S")
        )
    }

    /// Year directory component, `YYYY`.
    pub fn year_dir(&self) -> String {
        self.to_datetime().format("%Y").to_string()
    }

    /// Day directory component, `YYYYMMDD`.
    pub fn day_dir(&self) -> String {
        self.to_datetime().format("%Y%m%d").to_string()
    }
}

impl PartialOrd for RadxTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RadxTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.secs
            .cmp(&other.secs)
            .then_with(|| self.nanos.cmp(&other.nanos))
    }
}

impl fmt::Display for RadxTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dashed_millis())
    }
}

#[derive(Debug, Clone, Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso8601() {
        let t = RadxTime::from_iso8601("2024-01-15T12:00:00Z").unwrap();
        assert_eq!(t.w3c(), "2024-01-15T12:00:00Z");
        assert_eq!(t.nanos, 0);

        let t = RadxTime::from_iso8601("2024-01-15 12:00:00.250").unwrap();
        assert_eq!(t.nanos, 250_000_000);
    }

    #[test]
    fn test_rounded_millis_carries() {
        let t = RadxTime::new(100, 999_600_000);
        assert_eq!(t.rounded_millis(), (101, 0));

        let t = RadxTime::new(100, 123_400_000);
        assert_eq!(t.rounded_millis(), (100, 123));
    }

    #[test]
    fn test_formats() {
        let t = RadxTime::from_iso8601("2013-06-02T03:04:05.678Z").unwrap();
        assert_eq!(t.w3c(), "2013-06-02T03:04:05Z");
        assert_eq!(t.dashed_millis(), "2013-06-02 03:04:05.678");
        assert_eq!(t.compact('_'), "20130602_030405");
        assert_eq!(t.compact('-'), "20130602-030405");
        assert_eq!(t.year_dir(), "2013");
        assert_eq!(t.day_dir(), "20130602");
    }

    #[test]
    fn test_secs_since_and_ordering() {
        let a = RadxTime::new(10, 500_000_000);
        let b = RadxTime::new(12, 250_000_000);
        assert!((b.secs_since(&a) - 1.75).abs() < 1e-9);
        assert!(a < b);
        assert_eq!(RadxTime::new(1, 1_500_000_000), RadxTime::new(2, 500_000_000));
    }

    #[test]
    fn test_deserialize_normalizes_nanos() {
        let t: RadxTime =
            serde_json::from_str(r#"{"secs": 1370142245, "nanos": 2250000000}"#).unwrap();
        assert_eq!(t, RadxTime::new(1_370_142_247, 250_000_000));
        assert_eq!(t.w3c(), "2013-06-02T03:04:07Z");

        let t: RadxTime = serde_json::from_str(r#"{"secs": 1370142245}"#).unwrap();
        assert_eq!(t.nanos, 0);
    }
}
