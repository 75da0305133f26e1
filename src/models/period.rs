//! Report periods and date ranges
//!
//! A report period (week, month, quarter, year or custom) resolves to an
//! inclusive date range. Calendar periods run from the start of the period
//! containing today up to today. Ranges can be split into day, week or month
//! buckets for trend and task tables.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Period a report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Week,
    Month,
    Quarter,
    Year,
    Custom,
}

impl ReportPeriod {
    /// Resolve to a concrete range as of `today`.
    ///
    /// `Custom` requires `custom`; the other periods ignore it.
    pub fn resolve(
        &self,
        today: NaiveDate,
        custom: Option<DateRange>,
    ) -> Result<DateRange, PeriodError> {
        let start = match self {
            Self::Week => today - Duration::days(i64::from(today.weekday().num_days_from_monday())),
            Self::Month => first_of_month(today.year(), today.month()),
            Self::Quarter => {
                let quarter_month = (today.month0() / 3) * 3 + 1;
                first_of_month(today.year(), quarter_month)
            }
            Self::Year => first_of_month(today.year(), 1),
            Self::Custom => {
                return custom.ok_or(PeriodError::MissingCustomRange);
            }
        };
        DateRange::new(start, today)
    }

    /// Bucket size used when a report splits this period
    pub fn default_granularity(&self, range: &DateRange) -> Granularity {
        match self {
            Self::Week => Granularity::Day,
            Self::Month => Granularity::Week,
            Self::Quarter | Self::Year => Granularity::Month,
            Self::Custom => match range.days() {
                0..=14 => Granularity::Day,
                15..=92 => Granularity::Week,
                _ => Granularity::Month,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReportPeriod {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            "quarter" | "quarterly" => Ok(Self::Quarter),
            "year" | "yearly" => Ok(Self::Year),
            "custom" => Ok(Self::Custom),
            other => Err(PeriodError::InvalidFormat(other.to_string())),
        }
    }
}

/// Size of a report bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PeriodError> {
        if end < start {
            return Err(PeriodError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    /// Range of `days` days ending on `end` (inclusive)
    pub fn trailing(end: NaiveDate, days: i64) -> Self {
        Self {
            start: end - Duration::days(days.max(1) - 1),
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of days covered, inclusive
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Number of calendar months the range touches (at least 1)
    pub fn months_touched(&self) -> u32 {
        let months = (self.end.year() - self.start.year()) * 12
            + (self.end.month() as i32 - self.start.month() as i32)
            + 1;
        months.max(1) as u32
    }

    /// Every day in the range
    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.days()).map(move |offset| start + Duration::days(offset))
    }

    /// Split into consecutive buckets, the first and last clipped to the range
    pub fn buckets(&self, granularity: Granularity) -> Vec<DateRange> {
        let mut buckets = Vec::new();
        let mut cursor = self.start;
        while cursor <= self.end {
            let natural_end = match granularity {
                Granularity::Day => cursor,
                Granularity::Week => {
                    cursor
                        + Duration::days(
                            6 - i64::from(cursor.weekday().num_days_from_monday()),
                        )
                }
                Granularity::Month => last_of_month(cursor.year(), cursor.month()),
            };
            let end = natural_end.min(self.end);
            buckets.push(DateRange { start: cursor, end });
            cursor = end + Duration::days(1);
        }
        buckets
    }

    /// Label for a bucket of the given granularity
    pub fn label(&self, granularity: Granularity) -> String {
        match granularity {
            Granularity::Day => self.start.format("%Y-%m-%d").to_string(),
            Granularity::Week => {
                let week = self.start.iso_week();
                format!("{:04}-W{:02}", week.year(), week.week())
            }
            Granularity::Month => month_key(self.start),
        }
    }

    /// Parse "YYYY-MM-DD..YYYY-MM-DD"
    pub fn parse(s: &str) -> Result<Self, PeriodError> {
        let s = s.trim();
        let (start, end) = s
            .split_once("..")
            .ok_or_else(|| PeriodError::InvalidFormat(s.to_string()))?;
        let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
            .map_err(|_| PeriodError::InvalidFormat(s.to_string()))?;
        let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")
            .map_err(|_| PeriodError::InvalidFormat(s.to_string()))?;
        Self::new(start, end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// "YYYY-MM" key for the month containing `date`
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn last_of_month(year: i32, month: u32) -> NaiveDate {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.map(|d| d - Duration::days(1)).unwrap_or(NaiveDate::MAX)
}

/// Error type for period parsing and resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    InvalidFormat(String),
    MissingCustomRange,
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

impl fmt::Display for PeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodError::InvalidFormat(s) => write!(f, "Invalid period format: {}", s),
            PeriodError::MissingCustomRange => {
                write!(f, "A custom period needs a start and end date")
            }
            PeriodError::EndBeforeStart { start, end } => {
                write!(f, "Range end {} is before its start {}", end, start)
            }
        }
    }
}

impl std::error::Error for PeriodError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_resolve_calendar_periods() {
        // Thursday
        let today = date(2024, 8, 15);
        let week = ReportPeriod::Week.resolve(today, None).unwrap();
        assert_eq!(week.start, date(2024, 8, 12));
        assert_eq!(week.end, today);

        let month = ReportPeriod::Month.resolve(today, None).unwrap();
        assert_eq!(month.start, date(2024, 8, 1));

        let quarter = ReportPeriod::Quarter.resolve(today, None).unwrap();
        assert_eq!(quarter.start, date(2024, 7, 1));

        let year = ReportPeriod::Year.resolve(today, None).unwrap();
        assert_eq!(year.start, date(2024, 1, 1));
    }

    #[test]
    fn test_custom_requires_range() {
        let today = date(2024, 8, 15);
        assert_eq!(
            ReportPeriod::Custom.resolve(today, None),
            Err(PeriodError::MissingCustomRange)
        );
        let range = DateRange::new(date(2024, 1, 1), date(2024, 2, 1)).unwrap();
        assert_eq!(ReportPeriod::Custom.resolve(today, Some(range)).unwrap(), range);
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(DateRange::new(date(2024, 2, 1), date(2024, 1, 1)).is_err());
        assert!(DateRange::parse("2024-02-01..2024-01-01").is_err());
        assert!(DateRange::parse("2024-01-01").is_err());
    }

    #[test]
    fn test_months_touched() {
        let range = DateRange::new(date(2024, 1, 31), date(2024, 3, 1)).unwrap();
        assert_eq!(range.months_touched(), 3);
        let range = DateRange::new(date(2024, 5, 3), date(2024, 5, 3)).unwrap();
        assert_eq!(range.months_touched(), 1);
    }

    #[test]
    fn test_week_buckets_clip_to_range() {
        // Wednesday to the following Tuesday
        let range = DateRange::new(date(2024, 8, 7), date(2024, 8, 13)).unwrap();
        let buckets = range.buckets(Granularity::Week);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].end, date(2024, 8, 11));
        assert_eq!(buckets[1].start, date(2024, 8, 12));
        assert_eq!(buckets[1].end, date(2024, 8, 13));
    }

    #[test]
    fn test_month_buckets_and_labels() {
        let range = DateRange::new(date(2024, 11, 20), date(2025, 1, 5)).unwrap();
        let buckets = range.buckets(Granularity::Month);
        let labels: Vec<_> = buckets.iter().map(|b| b.label(Granularity::Month)).collect();
        assert_eq!(labels, vec!["2024-11", "2024-12", "2025-01"]);
        assert_eq!(buckets[1].end, date(2024, 12, 31));
    }

    #[test]
    fn test_trailing() {
        let range = DateRange::trailing(date(2024, 3, 30), 30);
        assert_eq!(range.start, date(2024, 3, 1));
        assert_eq!(range.days(), 30);
    }

    #[test]
    fn test_parse_period() {
        assert_eq!("Quarter".parse::<ReportPeriod>().unwrap(), ReportPeriod::Quarter);
        assert!("fortnight".parse::<ReportPeriod>().is_err());
    }
}
