//! Currency codes and rate-table conversion
//!
//! Rates are quoted against a single base currency: `rate(USD) = 25000`
//! means one USD is worth 25000 units of the base. Converted amounts are
//! rounded to two decimal places, ties away from zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decimal places kept after conversion
pub const CONVERSION_SCALE: u32 = 2;

/// Base currency when none is configured
pub const DEFAULT_BASE_CURRENCY: &str = "VND";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("Invalid currency code '{0}': expected three letters (e.g. USD)")]
    InvalidCode(String),

    #[error("No exchange rate for {0}")]
    UnknownCurrency(CurrencyCode),

    #[error("Exchange rate for {code} must be positive, got {rate}")]
    NonPositiveRate { code: CurrencyCode, rate: Decimal },

    #[error("Converting {amount} {from} to {to} overflows")]
    Overflow {
        amount: Decimal,
        from: CurrencyCode,
        to: CurrencyCode,
    },
}

/// ISO-4217 style three-letter code, stored upper-case
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self(DEFAULT_BASE_CURRENCY.to_string())
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(CurrencyError::InvalidCode(s.to_string()))
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Exchange rates relative to a base currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    base: CurrencyCode,
    rates: BTreeMap<CurrencyCode, Decimal>,
}

impl RateTable {
    /// Table containing only the base currency
    pub fn new(base: CurrencyCode) -> Self {
        Self {
            base,
            rates: BTreeMap::new(),
        }
    }

    /// Build a table, rejecting zero or negative rates
    pub fn with_rates(
        base: CurrencyCode,
        rates: impl IntoIterator<Item = (CurrencyCode, Decimal)>,
    ) -> Result<Self, CurrencyError> {
        let mut table = Self::new(base);
        for (code, rate) in rates {
            table.set_rate(code, rate)?;
        }
        Ok(table)
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn set_rate(&mut self, code: CurrencyCode, rate: Decimal) -> Result<(), CurrencyError> {
        if rate <= Decimal::ZERO {
            return Err(CurrencyError::NonPositiveRate { code, rate });
        }
        if code == self.base {
            if rate != Decimal::ONE {
                tracing::warn!(%code, %rate, "ignoring rate for base currency");
            }
            return Ok(());
        }
        self.rates.insert(code, rate);
        Ok(())
    }

    /// Base units per one unit of `code`
    pub fn rate(&self, code: &CurrencyCode) -> Result<Decimal, CurrencyError> {
        if *code == self.base {
            return Ok(Decimal::ONE);
        }
        self.rates
            .get(code)
            .copied()
            .ok_or_else(|| CurrencyError::UnknownCurrency(code.clone()))
    }

    /// Known currency codes, base first
    pub fn currencies(&self) -> impl Iterator<Item = &CurrencyCode> {
        std::iter::once(&self.base).chain(self.rates.keys())
    }

    /// Convert `amount` from one currency into another
    pub fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<Decimal, CurrencyError> {
        let from_rate = self.rate(from)?;
        let to_rate = self.rate(to)?;
        if from == to {
            return Ok(amount);
        }
        let converted = amount
            .checked_mul(from_rate)
            .and_then(|v| v.checked_div(to_rate))
            .ok_or_else(|| CurrencyError::Overflow {
                amount,
                from: from.clone(),
                to: to.clone(),
            })?;
        Ok(converted.round_dp_with_strategy(CONVERSION_SCALE, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Convert into the base currency
    pub fn to_base(&self, amount: Decimal, from: &CurrencyCode) -> Result<Decimal, CurrencyError> {
        self.convert(amount, from, &self.base)
    }
}
