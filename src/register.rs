//! Contract register loaded from JSON
//!
//! The register is a read-only list of contracts, either a bare JSON array
//! or an object with a `contracts` array. Dates, values and currencies may be
//! missing on individual rows; those rows are still listed but cannot be
//! allocated until completed.

use crate::allocator::ContractSpan;
use crate::currency::{CurrencyCode, CurrencyError, RateTable};
use crate::filter::ContractFilter;
use crate::status::{derive_status, ContractStatus, DEFAULT_EXPIRING_WITHIN_DAYS};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors while totalling a listing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    #[error(transparent)]
    Currency(#[from] CurrencyError),

    #[error("Total {0} of the listed contracts overflows")]
    Overflow(&'static str),
}

/// Everything needed to evaluate derived columns for a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewContext {
    pub today: NaiveDate,
    pub expiring_within_days: u32,
    pub rates: RateTable,
}

impl ViewContext {
    pub fn new(today: NaiveDate, rates: RateTable) -> Self {
        Self {
            today,
            expiring_within_days: DEFAULT_EXPIRING_WITHIN_DAYS,
            rates,
        }
    }
}

/// A single contract row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub code: String,
    pub client: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default)]
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_value: Option<Decimal>,
    pub total_man_month: Option<Decimal>,
    /// Defaults to the base currency of the rate table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
}

impl ContractRecord {
    pub fn span(&self) -> ContractSpan {
        ContractSpan {
            start_date: self.start_date,
            end_date: self.end_date,
            total_value: self.total_value,
            total_man_month: self.total_man_month,
        }
    }

    pub fn currency_or<'a>(&'a self, base: &'a CurrencyCode) -> &'a CurrencyCode {
        self.currency.as_ref().unwrap_or(base)
    }

    /// Derived status, `None` without a start date or with inverted dates
    pub fn status(&self, ctx: &ViewContext) -> Option<ContractStatus> {
        let start = self.start_date?;
        derive_status(start, self.end_date, ctx.today, ctx.expiring_within_days).ok()
    }

    /// Contract value in the base currency, `None` when unknown or unconvertible
    pub fn base_value(&self, rates: &RateTable) -> Option<Decimal> {
        let value = self.total_value?;
        rates.to_base(value, self.currency_or(rates.base())).ok()
    }
}

/// Column used to order a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortKey {
    #[default]
    Code,
    Client,
    Start,
    End,
    Value,
}

/// Totals over a set of contracts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterSummary {
    pub count: usize,
    pub currency: CurrencyCode,
    /// Sum of contract values converted to `currency`
    pub total_value: Decimal,
    pub total_man_month: Decimal,
    /// Rows contributing nothing to `total_value` because the value is missing
    pub without_value: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RegisterFile {
    List(Vec<ContractRecord>),
    Wrapped { contracts: Vec<ContractRecord> },
}

/// In-memory list of contracts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Register {
    contracts: Vec<ContractRecord>,
}

fn cmp_missing_last<T: Ord>(a: Option<T>, b: Option<T>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl Register {
    /// Build a register, rejecting duplicate codes
    pub fn new(contracts: Vec<ContractRecord>) -> Result<Self> {
        let mut seen = HashSet::new();
        for contract in &contracts {
            if contract.code.trim().is_empty() {
                bail!("Contract for client '{}' has an empty code", contract.client);
            }
            if !seen.insert(contract.code.to_lowercase()) {
                bail!("Duplicate contract code: {}", contract.code);
            }
        }
        Ok(Self { contracts })
    }

    /// Load and parse a register from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            bail!("Register file not found: {}", path.display());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read register {}", path.display()))?;
        let register = Self::from_json_str(&contents)
            .with_context(|| format!("Invalid register {}", path.display()))?;

        tracing::debug!(path = %path.display(), contracts = register.len(), "loaded register");
        Ok(register)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: RegisterFile = serde_json::from_str(content).context("Invalid register JSON")?;
        let contracts = match file {
            RegisterFile::List(contracts) => contracts,
            RegisterFile::Wrapped { contracts } => contracts,
        };
        Self::new(contracts)
    }

    pub fn records(&self) -> &[ContractRecord] {
        &self.contracts
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Look up a contract by code (case-insensitive)
    pub fn find(&self, code: &str) -> Option<&ContractRecord> {
        let code = code.trim();
        self.contracts
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.contracts.iter().map(|c| c.code.as_str())
    }

    /// Contracts passing `filter`, ordered by `sort`
    ///
    /// Rows missing the sort column go last in either direction; ties keep
    /// code order.
    pub fn select(
        &self,
        filter: &ContractFilter,
        ctx: &ViewContext,
        sort: SortKey,
        descending: bool,
    ) -> Vec<&ContractRecord> {
        let mut rows: Vec<&ContractRecord> = self
            .contracts
            .iter()
            .filter(|c| filter.matches(c, ctx))
            .collect();

        rows.sort_by(|a, b| {
            let primary = match sort {
                SortKey::Code => cmp_missing_last(Some(&a.code), Some(&b.code), descending),
                SortKey::Client => cmp_missing_last(
                    Some(a.client.to_lowercase()),
                    Some(b.client.to_lowercase()),
                    descending,
                ),
                SortKey::Start => cmp_missing_last(a.start_date, b.start_date, descending),
                SortKey::End => cmp_missing_last(a.end_date, b.end_date, descending),
                SortKey::Value => cmp_missing_last(
                    a.base_value(&ctx.rates),
                    b.base_value(&ctx.rates),
                    descending,
                ),
            };
            primary.then_with(|| a.code.cmp(&b.code))
        });

        tracing::debug!(matched = rows.len(), total = self.len(), ?sort, "selected contracts");
        rows
    }

    /// Count and totals of `rows`, values converted to the base currency
    pub fn summary(rows: &[&ContractRecord], rates: &RateTable) -> Result<RegisterSummary, SummaryError> {
        let mut total_value = Decimal::ZERO;
        let mut total_man_month = Decimal::ZERO;
        let mut without_value = 0;

        for row in rows {
            match row.total_value {
                Some(value) => {
                    let value = rates.to_base(value, row.currency_or(rates.base()))?;
                    total_value = total_value
                        .checked_add(value)
                        .ok_or(SummaryError::Overflow("value"))?;
                }
                None => without_value += 1,
            }
            total_man_month = total_man_month
                .checked_add(row.total_man_month.unwrap_or(Decimal::ZERO))
                .ok_or(SummaryError::Overflow("man-month"))?;
        }

        Ok(RegisterSummary {
            count: rows.len(),
            currency: rates.base().clone(),
            total_value,
            total_man_month,
            without_value,
        })
    }
}
