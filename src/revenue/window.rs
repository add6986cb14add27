use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::errors::{CrmError, Result};
use crate::time::Timestamp;

/// one quarter of the April-March fiscal year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FyQuarter {
    pub quarter: u8,
    pub label: &'static str,
    pub start_month: u32,
    pub end_month: u32,
}

pub const FY_QUARTERS: [FyQuarter; 4] = [
    FyQuarter { quarter: 1, label: "Q1 (Apr-Jun)", start_month: 4, end_month: 6 },
    FyQuarter { quarter: 2, label: "Q2 (Jul-Sep)", start_month: 7, end_month: 9 },
    FyQuarter { quarter: 3, label: "Q3 (Oct-Dec)", start_month: 10, end_month: 12 },
    FyQuarter { quarter: 4, label: "Q4 (Jan-Mar)", start_month: 1, end_month: 3 },
];

pub fn fy_quarter(quarter: u8) -> Option<&'static FyQuarter> {
    FY_QUARTERS.iter().find(|q| q.quarter == quarter)
}

pub fn fy_quarter_label(quarter: u8) -> String {
    fy_quarter(quarter)
        .map(|q| q.label.to_string())
        .unwrap_or_else(|| format!("Q{}", quarter))
}

/// (fiscal year, quarter) containing `date`; the fiscal year is named by its April
pub fn fiscal_quarter_of(date: Timestamp) -> (i32, u8) {
    let d = date.date();
    match d.month() {
        4..=6 => (d.year(), 1),
        7..=9 => (d.year(), 2),
        10..=12 => (d.year(), 3),
        _ => (d.year() - 1, 4),
    }
}

/// Reporting window over service dates.
///
/// Calendar windows cover whole UTC days, first day to last day inclusive.
/// `Range` is half-open: `start <= t < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RevenueWindow {
    Month { year: i32, month: u32 },
    /// `fiscal_year` 2024 runs from April 2024 to March 2025
    FiscalQuarter { fiscal_year: i32, quarter: u8 },
    Year { year: i32 },
    Range { start: Timestamp, end: Timestamp },
}

impl RevenueWindow {
    pub fn month(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(CrmError::validation("month", format!("month must be 1-12, got {}", month)));
        }
        Ok(RevenueWindow::Month { year, month })
    }

    pub fn fiscal_quarter(fiscal_year: i32, quarter: u8) -> Result<Self> {
        if fy_quarter(quarter).is_none() {
            return Err(CrmError::validation("quarter", format!("quarter must be 1-4, got {}", quarter)));
        }
        Ok(RevenueWindow::FiscalQuarter { fiscal_year, quarter })
    }

    pub fn year(year: i32) -> Self {
        RevenueWindow::Year { year }
    }

    pub fn range(start: Timestamp, end: Timestamp) -> Result<Self> {
        if end <= start {
            return Err(CrmError::validation(
                "end",
                format!("window end {} must be after start {}", end, start),
            ));
        }
        Ok(RevenueWindow::Range { start, end })
    }

    /// the `months` calendar months up to and including today
    pub fn trailing_months(now: Timestamp, months: u32) -> Result<Self> {
        let end = now.start_of_day().add_days(1);
        let start = now.start_of_day().sub_months(months)?;
        RevenueWindow::range(start, end)
    }

    /// half-open instant bounds `[start, end)`
    pub fn bounds(&self) -> Result<(Timestamp, Timestamp)> {
        match *self {
            RevenueWindow::Month { year, month } => {
                let start = Timestamp::from_ymd(year, month, 1)?;
                Ok((start, start.add_months(1)?))
            }
            RevenueWindow::FiscalQuarter { fiscal_year, quarter } => {
                let q = fy_quarter(quarter).ok_or_else(|| {
                    CrmError::validation("quarter", format!("quarter must be 1-4, got {}", quarter))
                })?;
                let calendar_year = if q.quarter == 4 { fiscal_year + 1 } else { fiscal_year };
                let start = Timestamp::from_ymd(calendar_year, q.start_month, 1)?;
                Ok((start, start.add_months(3)?))
            }
            RevenueWindow::Year { year } => {
                let start = Timestamp::from_ymd(year, 1, 1)?;
                Ok((start, start.add_years(1)?))
            }
            RevenueWindow::Range { start, end } => {
                if end <= start {
                    return Err(CrmError::validation(
                        "end",
                        format!("window end {} must be after start {}", end, start),
                    ));
                }
                Ok((start, end))
            }
        }
    }

    pub fn label(&self) -> String {
        match *self {
            RevenueWindow::Month { year, month } => Timestamp::from_ymd(year, month, 1)
                .map(|t| t.to_datetime().format("%B %Y").to_string())
                .unwrap_or_else(|_| format!("{}-{:02}", year, month)),
            RevenueWindow::FiscalQuarter { fiscal_year, quarter } => format!(
                "FY{}-{:02} {}",
                fiscal_year,
                (fiscal_year + 1).rem_euclid(100),
                fy_quarter_label(quarter)
            ),
            RevenueWindow::Year { year } => year.to_string(),
            RevenueWindow::Range { start, end } => {
                format!("{} to {}", start.to_iso_date(), end.sub_days(1).to_iso_date())
            }
        }
    }
}

/// resolved window used while scanning records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl WindowBounds {
    pub fn resolve(window: &RevenueWindow) -> Result<Self> {
        let (start, end) = window.bounds()?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, at: Timestamp) -> bool {
        at >= self.start && at < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        let window = RevenueWindow::month(2024, 2).unwrap();
        assert_eq!(window.bounds().unwrap(), (date(2024, 2, 1), date(2024, 3, 1)));
        assert_eq!(window.label(), "February 2024");

        let december = RevenueWindow::month(2024, 12).unwrap();
        assert_eq!(december.bounds().unwrap().1, date(2025, 1, 1));

        assert_eq!(RevenueWindow::month(2024, 13).unwrap_err().field(), Some("month"));
    }

    #[test]
    fn test_fiscal_quarter_bounds() {
        let q1 = RevenueWindow::fiscal_quarter(2024, 1).unwrap();
        assert_eq!(q1.bounds().unwrap(), (date(2024, 4, 1), date(2024, 7, 1)));

        let q3 = RevenueWindow::fiscal_quarter(2024, 3).unwrap();
        assert_eq!(q3.bounds().unwrap(), (date(2024, 10, 1), date(2025, 1, 1)));

        // Q4 of FY2024 is January to March 2025
        let q4 = RevenueWindow::fiscal_quarter(2024, 4).unwrap();
        assert_eq!(q4.bounds().unwrap(), (date(2025, 1, 1), date(2025, 4, 1)));
        assert_eq!(q4.label(), "FY2024-25 Q4 (Jan-Mar)");

        assert_eq!(RevenueWindow::fiscal_quarter(2024, 5).unwrap_err().field(), Some("quarter"));
    }

    #[test]
    fn test_fiscal_quarter_of_date() {
        assert_eq!(fiscal_quarter_of(date(2024, 4, 1)), (2024, 1));
        assert_eq!(fiscal_quarter_of(date(2024, 9, 30)), (2024, 2));
        assert_eq!(fiscal_quarter_of(date(2024, 12, 31)), (2024, 3));
        assert_eq!(fiscal_quarter_of(date(2025, 2, 14)), (2024, 4));
        assert_eq!(fy_quarter_label(2), "Q2 (Jul-Sep)");
        assert_eq!(fy_quarter_label(9), "Q9");
    }

    #[test]
    fn test_year_and_trailing_windows() {
        assert_eq!(
            RevenueWindow::year(2024).bounds().unwrap(),
            (date(2024, 1, 1), date(2025, 1, 1))
        );

        let trailing = RevenueWindow::trailing_months(date(2024, 6, 15), 12).unwrap();
        assert_eq!(trailing.bounds().unwrap(), (date(2023, 6, 15), date(2024, 6, 16)));
        assert_eq!(trailing.label(), "2023-06-15 to 2024-06-15");
    }

    #[test]
    fn test_last_day_inclusive_first_day_of_next_excluded() {
        let bounds = WindowBounds::resolve(&RevenueWindow::month(2024, 3).unwrap()).unwrap();
        assert!(bounds.contains(date(2024, 3, 1)));
        assert!(bounds.contains(date(2024, 3, 31)));
        assert!(bounds.contains(Timestamp::from_nanos(date(2024, 4, 1).nanos() - 1)));
        assert!(!bounds.contains(date(2024, 4, 1)));
        assert!(!bounds.contains(Timestamp::from_nanos(date(2024, 3, 1).nanos() - 1)));
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        assert!(RevenueWindow::range(date(2024, 2, 1), date(2024, 1, 1)).is_err());
        assert!(RevenueWindow::range(date(2024, 1, 1), date(2024, 1, 1)).is_err());
    }
}
