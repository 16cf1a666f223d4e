//! Calendar primitives for month-based allocation
//!
//! A contract is measured in inclusive days and reported per calendar month.
//! `MonthLabel` names a month (`MM/YYYY`), `DateRange` is a validated
//! inclusive span of days, and `DateRange::months` walks every month the
//! span touches.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when parsing or building a month label
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("Malformed month label '{0}': expected MM/YYYY")]
    Malformed(String),

    #[error("Invalid month {0}: must be between 1 and 12")]
    InvalidMonth(u32),

    #[error("Month {month:02}/{year} is outside the supported calendar")]
    OutOfRange { year: i32, month: u32 },
}

/// A date range whose end precedes its start
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("End date {end} precedes start date {start}")]
pub struct RangeError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// True for Gregorian leap years
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in the given month (1-12)
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// First day of the month containing `date`
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Last day of the month containing `date`
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let first = first_day_of_month(date);
    let len = days_in_month(date.year(), date.month());
    first + Days::new(u64::from(len - 1))
}

/// Inclusive day count from `start` to `end` (zero or negative when `end < start`)
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// A calendar month, displayed as `MM/YYYY`
///
/// Stored as the first day of the month so ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthLabel(NaiveDate);

impl MonthLabel {
    /// Build a label from a year and a 1-based month
    pub fn new(year: i32, month: u32) -> Result<Self, LabelError> {
        if !(1..=12).contains(&month) {
            return Err(LabelError::InvalidMonth(month));
        }
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or(LabelError::OutOfRange { year, month })
    }

    /// The month containing `date`
    pub fn of(date: NaiveDate) -> Self {
        Self(first_day_of_month(date))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn last_day(&self) -> NaiveDate {
        last_day_of_month(self.0)
    }

    /// The following month, or `None` past the end of the supported calendar
    pub fn next_month(&self) -> Option<Self> {
        self.0.checked_add_months(Months::new(1)).map(Self)
    }
}

impl fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:04}", self.month(), self.year())
    }
}

impl FromStr for MonthLabel {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || LabelError::Malformed(s.to_string());

        let (month, year) = s.trim().split_once('/').ok_or_else(malformed)?;
        if month.is_empty() || month.len() > 2 || year.len() != 4 {
            return Err(malformed());
        }
        if !month.bytes().chain(year.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let month: u32 = month.parse().map_err(|_| malformed())?;
        let year: i32 = year.parse().map_err(|_| malformed())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for MonthLabel {
    type Error = LabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthLabel> for String {
    fn from(label: MonthLabel) -> Self {
        label.to_string()
    }
}

/// An inclusive, validated date range (`end >= start`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if end < start {
            return Err(RangeError { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive number of days; always at least 1
    pub fn days(&self) -> i64 {
        days_inclusive(self.start, self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// The part of this range that falls inside `month`, if any
    pub fn clip_to_month(&self, month: MonthLabel) -> Option<DateRange> {
        let start = self.start.max(month.first_day());
        let end = self.end.min(month.last_day());
        DateRange::new(start, end).ok()
    }

    /// Every calendar month the range touches, in chronological order
    pub fn months(&self) -> MonthIter {
        MonthIter {
            next: Some(MonthLabel::of(self.start)),
            last: MonthLabel::of(self.end),
        }
    }
}

/// Iterator over consecutive months, see [`DateRange::months`]
#[derive(Debug, Clone)]
pub struct MonthIter {
    next: Option<MonthLabel>,
    last: MonthLabel,
}

impl Iterator for MonthIter {
    type Item = MonthLabel;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.filter(|m| *m <= self.last)?;
        self.next = current.next_month();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn test_first_and_last_day_of_month() {
        assert_eq!(first_day_of_month(date(2024, 2, 17)), date(2024, 2, 1));
        assert_eq!(last_day_of_month(date(2024, 2, 17)), date(2024, 2, 29));
        assert_eq!(last_day_of_month(date(2023, 12, 1)), date(2023, 12, 31));
    }

    #[test]
    fn test_days_inclusive() {
        assert_eq!(days_inclusive(date(2024, 1, 15), date(2024, 3, 10)), 56);
        assert_eq!(days_inclusive(date(2024, 1, 1), date(2024, 1, 1)), 1);
        assert_eq!(days_inclusive(date(2024, 1, 2), date(2024, 1, 1)), 0);
    }

    #[test]
    fn test_month_label_display() {
        let label = MonthLabel::new(2024, 3).unwrap();
        assert_eq!(label.to_string(), "03/2024");
    }

    #[test]
    fn test_month_label_parse() {
        assert_eq!(
            "01/2024".parse::<MonthLabel>().unwrap(),
            MonthLabel::new(2024, 1).unwrap()
        );
        assert_eq!(
            "7/2025".parse::<MonthLabel>().unwrap(),
            MonthLabel::new(2025, 7).unwrap()
        );
    }

    #[test]
    fn test_month_label_parse_rejects_bad_input() {
        assert!(matches!(
            "2024-01".parse::<MonthLabel>(),
            Err(LabelError::Malformed(_))
        ));
        assert!(matches!(
            "13/2024".parse::<MonthLabel>(),
            Err(LabelError::InvalidMonth(13))
        ));
        assert!(matches!(
            "00/2024".parse::<MonthLabel>(),
            Err(LabelError::InvalidMonth(0))
        ));
        assert!("1/24".parse::<MonthLabel>().is_err());
        assert!("+1/2024".parse::<MonthLabel>().is_err());
    }

    #[test]
    fn test_month_label_ordering_is_chronological() {
        let dec = MonthLabel::new(2023, 12).unwrap();
        let jan = MonthLabel::new(2024, 1).unwrap();
        assert!(dec < jan);
        assert_eq!(dec.next_month(), Some(jan));
    }

    #[test]
    fn test_month_label_serde_as_string() {
        let label = MonthLabel::new(2024, 2).unwrap();
        let json = serde_json::to_string(&label).unwrap();
        assert_eq!(json, "\"02/2024\"");

        let back: MonthLabel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, label);
        assert!(serde_json::from_str::<MonthLabel>("\"2024/02\"").is_err());
    }

    #[test]
    fn test_date_range_rejects_inverted() {
        let err = DateRange::new(date(2024, 3, 1), date(2024, 2, 1)).unwrap_err();
        assert_eq!(err.start, date(2024, 3, 1));
        assert_eq!(err.end, date(2024, 2, 1));
    }

    #[test]
    fn test_date_range_months_crosses_year() {
        let range = DateRange::new(date(2023, 11, 20), date(2024, 2, 3)).unwrap();
        let labels: Vec<String> = range.months().map(|m| m.to_string()).collect();
        assert_eq!(labels, vec!["11/2023", "12/2023", "01/2024", "02/2024"]);
    }

    #[test]
    fn test_date_range_single_day() {
        let range = DateRange::new(date(2024, 5, 5), date(2024, 5, 5)).unwrap();
        assert_eq!(range.days(), 1);
        assert_eq!(range.months().count(), 1);
        assert!(range.contains(date(2024, 5, 5)));
        assert!(!range.contains(date(2024, 5, 6)));
    }

    #[test]
    fn test_clip_to_month() {
        let range = DateRange::new(date(2024, 1, 15), date(2024, 3, 10)).unwrap();

        let jan = range.clip_to_month(MonthLabel::new(2024, 1).unwrap()).unwrap();
        assert_eq!((jan.start(), jan.end()), (date(2024, 1, 15), date(2024, 1, 31)));

        let feb = range.clip_to_month(MonthLabel::new(2024, 2).unwrap()).unwrap();
        assert_eq!(feb.days(), 29);

        assert!(range
            .clip_to_month(MonthLabel::new(2024, 4).unwrap())
            .is_none());
    }
}
