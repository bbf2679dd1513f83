//! Model run and forecast time handling.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ViewerError;

/// Longest lead time (hours) a request may ask for.
pub const MAX_FORECAST_STEP: u32 = 240;

/// Model run cycles (GFS runs 4x daily).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunCycle {
    /// 00Z run
    Z00,
    /// 06Z run
    Z06,
    /// 12Z run
    Z12,
    /// 18Z run
    Z18,
}

impl RunCycle {
    pub fn from_hour(hour: u32) -> Option<Self> {
        match hour {
            0 => Some(RunCycle::Z00),
            6 => Some(RunCycle::Z06),
            12 => Some(RunCycle::Z12),
            18 => Some(RunCycle::Z18),
            _ => None,
        }
    }

    pub fn hour(&self) -> u32 {
        match self {
            RunCycle::Z00 => 0,
            RunCycle::Z06 => 6,
            RunCycle::Z12 => 12,
            RunCycle::Z18 => 18,
        }
    }

    pub fn all() -> &'static [RunCycle] {
        &[RunCycle::Z00, RunCycle::Z06, RunCycle::Z12, RunCycle::Z18]
    }

    /// Two-digit form used in dataset paths ("00", "06", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            RunCycle::Z00 => "00",
            RunCycle::Z06 => "06",
            RunCycle::Z12 => "12",
            RunCycle::Z18 => "18",
        }
    }
}

impl fmt::Display for RunCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunCycle {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches(['z', 'Z']);
        trimmed
            .parse::<u32>()
            .ok()
            .and_then(RunCycle::from_hour)
            .ok_or_else(|| ViewerError::invalid("cycle", format!("'{}' is not one of 00, 06, 12, 18", s)))
    }
}

/// Identifies which model run to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunSelector {
    pub run_date: NaiveDate,
    pub run_cycle: RunCycle,
}

impl RunSelector {
    pub fn new(run_date: NaiveDate, run_cycle: RunCycle) -> Self {
        Self { run_date, run_cycle }
    }

    /// Run date as `YYYYMMDD`.
    pub fn date_compact(&self) -> String {
        self.run_date.format("%Y%m%d").to_string()
    }

    /// Model initialization instant.
    pub fn init_time(&self) -> DateTime<Utc> {
        let time = NaiveTime::from_hms_opt(self.run_cycle.hour(), 0, 0).unwrap_or_default();
        Utc.from_utc_datetime(&self.run_date.and_time(time))
    }

    /// Parse a run date given as `YYYY-MM-DD` or `YYYYMMDD`.
    pub fn parse_date(s: &str) -> Result<NaiveDate, ViewerError> {
        let s = s.trim();
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
            .map_err(|_| ViewerError::invalid("date", format!("'{}' is not a date (YYYY-MM-DD)", s)))
    }
}

impl fmt::Display for RunSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}z", self.date_compact(), self.run_cycle)
    }
}

/// Lead-time label, zero-padded to three digits: `t+007`.
pub fn lead_time_label(step: u32) -> String {
    format!("t+{:03}", step)
}

/// Validity label: `06UTC Mon 15 Jan 2024`.
pub fn valid_time_label(valid: &DateTime<Utc>) -> String {
    valid.format("%HUTC %a %d %b %Y").to_string()
}

/// Units of a CF-style time coordinate (`"<unit> since <origin>"`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUnits {
    seconds_per_unit: f64,
    origin: NaiveDateTime,
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time units: {0}")]
    InvalidUnits(String),
}

impl TimeUnits {
    /// Parse units such as `days since 1-1-1 00:00:0.0` or `hours since 2024-01-15 00:00`.
    ///
    /// Origins before the Gregorian reform are read on the Julian calendar,
    /// which is how GrADS servers define `days since 1-1-1`.
    pub fn parse(units: &str) -> Result<Self, TimeParseError> {
        let invalid = || TimeParseError::InvalidUnits(units.to_string());
        let (unit, origin) = units.split_once(" since ").ok_or_else(invalid)?;

        let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
            "days" | "day" | "d" => 86_400.0,
            "hours" | "hour" | "hr" | "h" => 3_600.0,
            "minutes" | "minute" | "min" => 60.0,
            "seconds" | "second" | "sec" | "s" => 1.0,
            _ => return Err(invalid()),
        };

        let mut parts = origin.split_whitespace();
        let date_part = parts.next().ok_or_else(invalid)?;
        let mut ymd = date_part.split('-').map(|p| p.parse::<i32>());
        let (year, month, day) = match (ymd.next(), ymd.next(), ymd.next()) {
            (Some(Ok(y)), Some(Ok(m)), Some(Ok(d))) => (y, m as u32, d as u32),
            _ => return Err(invalid()),
        };

        let mut hms = [0.0f64; 3];
        if let Some(time_part) = parts.next() {
            for (slot, piece) in hms.iter_mut().zip(time_part.trim_end_matches('Z').split(':')) {
                *slot = piece.parse().map_err(|_| invalid())?;
            }
        }

        let date = if is_before_gregorian_reform(year, month, day) {
            julian_to_gregorian(year, month, day)
        } else {
            NaiveDate::from_ymd_opt(year, month, day)
        }
        .ok_or_else(invalid)?;

        let seconds = hms[0] * 3600.0 + hms[1] * 60.0 + hms[2];
        let origin = date.and_time(NaiveTime::default()) + Duration::milliseconds((seconds * 1000.0).round() as i64);

        Ok(Self {
            seconds_per_unit,
            origin,
        })
    }

    /// Convert a raw coordinate value to an instant.
    pub fn decode(&self, value: f64) -> DateTime<Utc> {
        let millis = (value * self.seconds_per_unit * 1000.0).round() as i64;
        Utc.from_utc_datetime(&(self.origin + Duration::milliseconds(millis)))
    }
}

fn is_before_gregorian_reform(year: i32, month: u32, day: u32) -> bool {
    (year, month, day) < (1582, 10, 15)
}

/// Map a Julian calendar date to the proleptic Gregorian date of the same day.
fn julian_to_gregorian(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    // Julian day number of the Julian calendar date.
    let a = (14 - month as i64) / 12;
    let y = year as i64 + 4800 - a;
    let m = month as i64 + 12 * a - 3;
    let jdn = day as i64 + (153 * m + 2) / 5 + 365 * y + y / 4 - 32083;

    // JDN 1721426 is 0001-01-01 proleptic Gregorian (day 1 from CE).
    let days_from_ce = jdn - 1_721_425;
    NaiveDate::from_num_days_from_ce_opt(i32::try_from(days_from_ce).ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_lead_time_label() {
        assert_eq!(lead_time_label(0), "t+000");
        assert_eq!(lead_time_label(7), "t+007");
        assert_eq!(lead_time_label(240), "t+240");
    }

    #[test]
    fn test_run_cycle_parse() {
        assert_eq!("06".parse::<RunCycle>().unwrap(), RunCycle::Z06);
        assert_eq!("18z".parse::<RunCycle>().unwrap(), RunCycle::Z18);
        assert!("03".parse::<RunCycle>().is_err());
        assert!("noon".parse::<RunCycle>().is_err());
    }

    #[test]
    fn test_run_selector_init_time() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let run = RunSelector::new(date, RunCycle::Z12);
        assert_eq!(run.date_compact(), "20240115");
        assert_eq!(run.init_time().hour(), 12);
        assert_eq!(run.to_string(), "20240115 12z");
    }

    #[test]
    fn test_valid_time_label() {
        let valid = Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap();
        assert_eq!(valid_time_label(&valid), "06UTC Mon 15 Jan 2024");
    }

    #[test]
    fn test_julian_origin_matches_gregorian_calendar() {
        // Julian 0001-01-01 is proleptic Gregorian 0000-12-30.
        let date = julian_to_gregorian(1, 1, 1).unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (0, 12, 30));
    }

    #[test]
    fn test_decode_grads_days_since_1_1_1() {
        let units = TimeUnits::parse("days since 1-1-1 00:00:0.0").unwrap();
        // 2024-01-15 has ordinal 738900 counting 0001-01-01 as day 1.
        let decoded = units.decode(738_901.0);
        assert_eq!(decoded, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());

        let decoded = units.decode(738_901.0 + 7.0 / 24.0);
        assert_eq!(decoded, Utc.with_ymd_and_hms(2024, 1, 15, 7, 0, 0).unwrap());
    }

    #[test]
    fn test_decode_hours_since_modern_origin() {
        let units = TimeUnits::parse("hours since 2024-01-15 06:00").unwrap();
        assert_eq!(units.decode(3.0), Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_invalid_units() {
        assert!(TimeUnits::parse("fortnights since 2024-01-01").is_err());
        assert!(TimeUnits::parse("days").is_err());
    }
}
