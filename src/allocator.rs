//! Pro-rata monthly allocation of contract value and effort
//!
//! A contract's total value and total man-month are spread over the calendar
//! months its date range touches, weighted by how many of the contract's days
//! fall into each month. Each month is rounded independently: amounts to a
//! whole currency unit, man-months to two decimal places, ties away from
//! zero. The rounded parts are not reconciled against the totals, so the
//! sum of a schedule may drift from the contract value by a few units.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use prorata::allocator::{allocate, ContractSpan};
//! use rust_decimal::Decimal;
//!
//! let span = ContractSpan {
//!     start_date: NaiveDate::from_ymd_opt(2024, 1, 15),
//!     end_date: NaiveDate::from_ymd_opt(2024, 3, 10),
//!     total_value: Some(Decimal::from(90_000)),
//!     total_man_month: Some(Decimal::from(3)),
//! };
//!
//! let entries = allocate(&span).unwrap();
//! assert_eq!(entries.len(), 3);
//! assert_eq!(entries[0].month_label.to_string(), "01/2024");
//! assert_eq!(entries[0].amount, Decimal::from(27_321));
//! ```

use crate::calendar::{DateRange, MonthLabel, RangeError};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Decimal places kept for each month's man-month share
pub const MAN_MONTH_SCALE: u32 = 2;

/// Decimal places kept for each month's amount (whole currency units)
pub const AMOUNT_SCALE: u32 = 0;

/// Required input that was not supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    StartDate,
    EndDate,
    TotalValue,
}

impl RequiredField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredField::StartDate => "start date",
            RequiredField::EndDate => "end date",
            RequiredField::TotalValue => "contract value",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that prevent an allocation from being computed
///
/// All of these are detected before any month is computed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("Missing required input: {}. Enter the start date, end date and contract value before allocating", join_fields(.0))]
    MissingInput(Vec<RequiredField>),

    #[error("Invalid range: end date {end} precedes start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Negative {field}: {value}")]
    NegativeValue { field: &'static str, value: Decimal },

    #[error("{field} {value} is too large to allocate over {days} days")]
    ValueTooLarge {
        field: &'static str,
        value: Decimal,
        days: i64,
    },
}

fn join_fields(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(RequiredField::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<RangeError> for AllocationError {
    fn from(err: RangeError) -> Self {
        AllocationError::InvalidRange {
            start: err.start,
            end: err.end,
        }
    }
}

/// Contract dates and totals as they arrive from a form or register file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSpan {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_value: Option<Decimal>,
    /// Absent is treated as zero effort
    pub total_man_month: Option<Decimal>,
}

/// A `ContractSpan` that passed every precondition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedSpan {
    pub range: DateRange,
    pub total_value: Decimal,
    pub total_man_month: Decimal,
}

impl ContractSpan {
    /// Check presence, ordering, sign and magnitude of the inputs
    pub fn validate(&self) -> Result<ValidatedSpan, AllocationError> {
        let mut missing = Vec::new();
        if self.start_date.is_none() {
            missing.push(RequiredField::StartDate);
        }
        if self.end_date.is_none() {
            missing.push(RequiredField::EndDate);
        }
        if self.total_value.is_none() {
            missing.push(RequiredField::TotalValue);
        }

        let (Some(start), Some(end), Some(total_value)) =
            (self.start_date, self.end_date, self.total_value)
        else {
            return Err(AllocationError::MissingInput(missing));
        };

        let range = DateRange::new(start, end)?;
        let total_man_month = self.total_man_month.unwrap_or(Decimal::ZERO);

        for (field, value) in [
            ("contract value", total_value),
            ("man-month", total_man_month),
        ] {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(AllocationError::NegativeValue { field, value });
            }
            // Every month multiplies by at most `days`, so this bounds all of them
            if value.checked_mul(Decimal::from(range.days())).is_none() {
                return Err(AllocationError::ValueTooLarge {
                    field,
                    value,
                    days: range.days(),
                });
            }
        }

        Ok(ValidatedSpan {
            range,
            total_value,
            total_man_month,
        })
    }
}

/// One month's share of a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub month_label: MonthLabel,
    pub amount: Decimal,
    pub man_month: Decimal,
}

fn share(part_days: i64, total: Decimal, total_days: i64, scale: u32) -> Decimal {
    let mut value = (Decimal::from(part_days) * total / Decimal::from(total_days))
        .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    // Fixed scale so "1" prints as "1.00" for man-months
    value.rescale(scale);
    value
}

/// Allocate an already validated span
pub fn allocate_validated(span: &ValidatedSpan) -> Vec<AllocationEntry> {
    let total_days = span.range.days();

    let entries: Vec<AllocationEntry> = span
        .range
        .months()
        .filter_map(|month| {
            let segment = span.range.clip_to_month(month)?;
            let days = segment.days();
            Some(AllocationEntry {
                month_label: month,
                amount: share(days, span.total_value, total_days, AMOUNT_SCALE),
                man_month: share(days, span.total_man_month, total_days, MAN_MONTH_SCALE),
            })
        })
        .collect();

    tracing::debug!(
        start = %span.range.start(),
        end = %span.range.end(),
        total_days,
        months = entries.len(),
        "allocated contract span"
    );

    entries
}

/// Spread a contract's value and man-month over the months it spans
///
/// Returns one entry per calendar month from the month of `start_date` to
/// the month of `end_date`, or an error without any entries.
pub fn allocate(span: &ContractSpan) -> Result<Vec<AllocationEntry>, AllocationError> {
    let validated = span.validate()?;
    Ok(allocate_validated(&validated))
}
