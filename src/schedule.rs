//! Editable allocation schedule
//!
//! Wraps the entries produced by [`crate::allocator`] together with the
//! contract totals they were computed from, so callers can report totals and
//! rounding drift and apply manual corrections month by month.

use crate::allocator::{allocate_validated, AllocationEntry, AllocationError, ContractSpan};
use crate::calendar::{DateRange, MonthLabel};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from manual schedule edits
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Entry index {index} out of range (schedule has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Difference between the allocated sums and the contract totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drift {
    pub amount: Decimal,
    pub man_month: Decimal,
}

impl Drift {
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero() && self.man_month.is_zero()
    }
}

/// Monthly allocation of one contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    range: DateRange,
    contract_value: Decimal,
    contract_man_month: Decimal,
    entries: Vec<AllocationEntry>,
}

impl Schedule {
    /// Allocate `span` and keep its totals alongside the entries
    pub fn build(span: &ContractSpan) -> Result<Self, AllocationError> {
        let validated = span.validate()?;
        Ok(Self {
            range: validated.range,
            contract_value: validated.total_value,
            contract_man_month: validated.total_man_month,
            entries: allocate_validated(&validated),
        })
    }

    pub fn entries(&self) -> &[AllocationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Contract dates the schedule was computed for
    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn contract_value(&self) -> Decimal {
        self.contract_value
    }

    pub fn contract_man_month(&self) -> Decimal {
        self.contract_man_month
    }

    pub fn total_amount(&self) -> Decimal {
        self.entries.iter().map(|e| e.amount).sum()
    }

    pub fn total_man_month(&self) -> Decimal {
        self.entries.iter().map(|e| e.man_month).sum()
    }

    /// Allocated sums minus contract totals
    pub fn drift(&self) -> Drift {
        Drift {
            amount: self.total_amount() - self.contract_value,
            man_month: self.total_man_month() - self.contract_man_month,
        }
    }

    pub fn find(&self, month: MonthLabel) -> Option<&AllocationEntry> {
        self.entries.iter().find(|e| e.month_label == month)
    }

    fn check_index(&self, index: usize, len: usize) -> Result<(), ScheduleError> {
        if index < len {
            Ok(())
        } else {
            Err(ScheduleError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
        }
    }

    /// Replace the entry at `index`, returning the previous one
    pub fn update_entry(
        &mut self,
        index: usize,
        entry: AllocationEntry,
    ) -> Result<AllocationEntry, ScheduleError> {
        self.check_index(index, self.entries.len())?;
        Ok(std::mem::replace(&mut self.entries[index], entry))
    }

    /// Insert an entry before `index`; `index == len` appends
    pub fn insert_entry(&mut self, index: usize, entry: AllocationEntry) -> Result<(), ScheduleError> {
        self.check_index(index, self.entries.len() + 1)?;
        self.entries.insert(index, entry);
        Ok(())
    }

    pub fn remove_entry(&mut self, index: usize) -> Result<AllocationEntry, ScheduleError> {
        self.check_index(index, self.entries.len())?;
        Ok(self.entries.remove(index))
    }

    /// True while the entries form a gap-free, duplicate-free run of months
    pub fn is_contiguous(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| pair[0].month_label.next_month() == Some(pair[1].month_label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn reference_span() -> ContractSpan {
        ContractSpan {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 10),
            total_value: Some(dec!(90000)),
            total_man_month: Some(dec!(3)),
        }
    }

    fn entry(label: &str, amount: Decimal, man_month: Decimal) -> AllocationEntry {
        AllocationEntry {
            month_label: label.parse().unwrap(),
            amount,
            man_month,
        }
    }

    #[test]
    fn test_build_keeps_totals_and_reports_drift() {
        let schedule = Schedule::build(&reference_span()).unwrap();

        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule.range().days(), 56);
        assert_eq!(schedule.contract_value(), dec!(90000));
        assert_eq!(schedule.total_amount(), dec!(89999));
        assert_eq!(schedule.total_man_month(), dec!(3.00));
        assert_eq!(
            schedule.drift(),
            Drift {
                amount: dec!(-1),
                man_month: dec!(0),
            }
        );
        assert!(!schedule.drift().is_zero());
        assert!(schedule.is_contiguous());
    }

    #[test]
    fn test_build_propagates_allocation_errors() {
        let err = Schedule::build(&ContractSpan::default()).unwrap_err();
        assert!(matches!(err, AllocationError::MissingInput(_)));
    }

    #[test]
    fn test_update_entry_corrects_drift() {
        let mut schedule = Schedule::build(&reference_span()).unwrap();
        let previous = schedule
            .update_entry(0, entry("01/2024", dec!(27322), dec!(0.91)))
            .unwrap();

        assert_eq!(previous.amount, dec!(27321));
        assert!(schedule.drift().is_zero());
    }

    #[test]
    fn test_insert_and_remove_entries() {
        let mut schedule = Schedule::build(&reference_span()).unwrap();

        schedule
            .insert_entry(3, entry("04/2024", dec!(100), dec!(0.1)))
            .unwrap();
        assert_eq!(schedule.len(), 4);
        assert!(schedule.is_contiguous());

        let removed = schedule.remove_entry(1).unwrap();
        assert_eq!(removed.month_label.to_string(), "02/2024");
        assert!(!schedule.is_contiguous());
        assert!(schedule.find("02/2024".parse().unwrap()).is_none());
    }

    #[test]
    fn test_edits_out_of_range() {
        let mut schedule = Schedule::build(&reference_span()).unwrap();

        assert_eq!(
            schedule.remove_entry(3).unwrap_err(),
            ScheduleError::IndexOutOfRange { index: 3, len: 3 }
        );
        assert!(schedule
            .insert_entry(5, entry("05/2024", dec!(1), dec!(0)))
            .is_err());
        assert!(schedule
            .update_entry(3, entry("05/2024", dec!(1), dec!(0)))
            .is_err());
    }

    #[test]
    fn test_duplicate_month_breaks_contiguity() {
        let mut schedule = Schedule::build(&reference_span()).unwrap();
        schedule
            .insert_entry(1, entry("01/2024", dec!(0), dec!(0)))
            .unwrap();
        assert!(!schedule.is_contiguous());
    }
}
