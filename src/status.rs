//! Contract status derived from its dates
//!
//! A contract is `Pending` before its start date, `Expired` after its end
//! date and `Active` in between. Active contracts whose end date is within
//! the configured window are reported as `ExpiringSoon`. Contracts without an
//! end date never expire.

use crate::calendar::{DateRange, RangeError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default window for `ExpiringSoon`
pub const DEFAULT_EXPIRING_WITHIN_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Pending,
    Active,
    ExpiringSoon,
    Expired,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Pending => "pending",
            ContractStatus::Active => "active",
            ContractStatus::ExpiringSoon => "expiring",
            ContractStatus::Expired => "expired",
        }
    }

    /// Contract currently in force (including about to expire)
    pub fn is_in_force(&self) -> bool {
        matches!(self, ContractStatus::Active | ContractStatus::ExpiringSoon)
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ContractStatus::Pending),
            "active" => Ok(ContractStatus::Active),
            "expiring" | "expiring_soon" => Ok(ContractStatus::ExpiringSoon),
            "expired" => Ok(ContractStatus::Expired),
            other => Err(format!(
                "Unknown contract status '{}'. Expected pending, active, expiring or expired",
                other
            )),
        }
    }
}

/// Status plus days left until the end date (inclusive of today)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validity {
    pub status: ContractStatus,
    /// `None` for open-ended contracts; negative once expired
    pub days_remaining: Option<i64>,
}

/// Derive the status and remaining days of a contract as of `today`
pub fn validity(
    start: NaiveDate,
    end: Option<NaiveDate>,
    today: NaiveDate,
    expiring_within_days: u32,
) -> Result<Validity, RangeError> {
    if let Some(end) = end {
        DateRange::new(start, end)?;
    }

    let days_remaining = end.map(|end| (end - today).num_days());

    let status = if today < start {
        ContractStatus::Pending
    } else {
        match days_remaining {
            Some(days) if days < 0 => ContractStatus::Expired,
            Some(days) if days <= i64::from(expiring_within_days) => ContractStatus::ExpiringSoon,
            _ => ContractStatus::Active,
        }
    };

    Ok(Validity {
        status,
        days_remaining,
    })
}

/// Convenience wrapper returning only the status
pub fn derive_status(
    start: NaiveDate,
    end: Option<NaiveDate>,
    today: NaiveDate,
    expiring_within_days: u32,
) -> Result<ContractStatus, RangeError> {
    validity(start, end, today, expiring_within_days).map(|v| v.status)
}
