use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{CrmError, Result};

pub const NANOS_PER_MILLI: i64 = 1_000_000;
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;
pub const NANOS_PER_DAY: i64 = 86_400 * NANOS_PER_SECOND;

/// accepted textual date layouts, tried in order
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Instant in nanoseconds since the unix epoch, UTC.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp(0);

    pub const fn from_nanos(nanos: i64) -> Self {
        Timestamp(nanos)
    }

    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis.saturating_mul(NANOS_PER_MILLI))
    }

    pub const fn nanos(&self) -> i64 {
        self.0
    }

    pub fn millis(&self) -> i64 {
        self.0.div_euclid(NANOS_PER_MILLI)
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Result<Self> {
        dt.timestamp_nanos_opt()
            .map(Timestamp)
            .ok_or_else(|| CrmError::validation("date", format!("{} is outside the supported range", dt)))
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_nanos(self.0)
    }

    /// midnight UTC of the given calendar date
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            CrmError::validation("date", format!("{:04}-{:02}-{:02} is not a calendar date", year, month, day))
        })?;
        Self::from_date(date)
    }

    pub fn from_date(date: NaiveDate) -> Result<Self> {
        Self::from_datetime(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// calendar date in UTC
    pub fn date(&self) -> NaiveDate {
        self.to_datetime().date_naive()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// calendar-month addition; the day is clamped to the end of a shorter month
    pub fn add_months(&self, months: u32) -> Result<Self> {
        let shifted = self
            .to_datetime()
            .checked_add_months(Months::new(months))
            .ok_or_else(|| CrmError::validation("date", format!("cannot add {} months to {}", months, self)))?;
        Self::from_datetime(shifted)
    }

    pub fn sub_months(&self, months: u32) -> Result<Self> {
        let shifted = self
            .to_datetime()
            .checked_sub_months(Months::new(months))
            .ok_or_else(|| CrmError::validation("date", format!("cannot subtract {} months from {}", months, self)))?;
        Self::from_datetime(shifted)
    }

    /// calendar-year addition (not multiples of 365 days)
    pub fn add_years(&self, years: u32) -> Result<Self> {
        let months = years
            .checked_mul(12)
            .ok_or_else(|| CrmError::validation("duration_years", format!("{} years is out of range", years)))?;
        self.add_months(months)
    }

    pub fn add_days(&self, days: i64) -> Self {
        Timestamp(self.0.saturating_add(days.saturating_mul(NANOS_PER_DAY)))
    }

    pub fn sub_days(&self, days: i64) -> Self {
        self.add_days(-days)
    }

    pub fn start_of_day(&self) -> Self {
        Timestamp(self.0.saturating_sub(self.0.rem_euclid(NANOS_PER_DAY)))
    }

    /// e.g. "15 Jan 2024"
    pub fn format_date(&self) -> String {
        self.to_datetime().format("%d %b %Y").to_string()
    }

    /// e.g. "2024-01-15"
    pub fn to_iso_date(&self) -> String {
        self.date().format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().to_rfc3339())
    }
}

/// parse a user- or spreadsheet-supplied date string
pub fn parse_date_input(input: &str) -> Result<Timestamp> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CrmError::validation("date", "date is required"));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Timestamp::from_datetime(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Timestamp::from_datetime(dt.and_utc());
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Timestamp::from_date(date);
        }
    }

    Err(CrmError::validation("date", format!("'{}' is not a recognised date", trimmed)))
}

/// convert a spreadsheet serial day number (1900 date system) to a timestamp
pub fn from_excel_serial(serial: f64) -> Result<Timestamp> {
    if !serial.is_finite() || serial <= 0.0 {
        return Err(CrmError::validation("date", format!("{} is not a valid spreadsheet date", serial)));
    }
    let epoch = Timestamp::from_ymd(1899, 12, 30)?;
    let millis = (serial * 86_400_000.0).round();
    if millis > (i64::MAX / NANOS_PER_MILLI) as f64 {
        return Err(CrmError::validation("date", format!("{} is out of range", serial)));
    }
    let offset = (millis as i64).saturating_mul(NANOS_PER_MILLI);
    Ok(Timestamp(epoch.0.saturating_add(offset)))
}
