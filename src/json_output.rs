//! JSON output format for schedules and register listings
//!
//! Decimal values are emitted as strings so amounts survive round-trips
//! through consumers that parse numbers as floats.

use crate::allocator::AllocationEntry;
use crate::calendar::MonthLabel;
use crate::currency::CurrencyCode;
use crate::register::{ContractRecord, RegisterSummary, ViewContext};
use crate::schedule::Schedule;
use crate::status::ContractStatus;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Format identifier of allocation schedules
pub const SCHEDULE_FORMAT: &str = "prorata-json-v1";

/// Format identifier of register listings
pub const REGISTER_FORMAT: &str = "prorata-register-v1";

/// Contract the schedule was computed for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonContract {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_value: Decimal,
    pub total_man_month: Decimal,
    pub currency: CurrencyCode,
}

/// One month of the schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonEntry {
    pub month: MonthLabel,
    pub amount: Decimal,
    pub man_month: Decimal,
}

impl From<&AllocationEntry> for JsonEntry {
    fn from(entry: &AllocationEntry) -> Self {
        Self {
            month: entry.month_label,
            amount: entry.amount,
            man_month: entry.man_month,
        }
    }
}

/// Totals and rounding drift
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonScheduleSummary {
    pub months: usize,
    pub total_amount: Decimal,
    pub total_man_month: Decimal,
    /// Allocated sum minus contract value
    pub drift_amount: Decimal,
    pub drift_man_month: Decimal,
}

/// Root JSON output structure for `allocate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSchedule {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    pub contract: JsonContract,
    pub entries: Vec<JsonEntry>,
    pub summary: JsonScheduleSummary,
}

impl JsonSchedule {
    /// Build the JSON view of a schedule
    pub fn new(schedule: &Schedule, contract: JsonContract) -> Self {
        let drift = schedule.drift();
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: SCHEDULE_FORMAT.to_string(),
            contract,
            entries: schedule.entries().iter().map(JsonEntry::from).collect(),
            summary: JsonScheduleSummary {
                months: schedule.len(),
                total_amount: schedule.total_amount(),
                total_man_month: schedule.total_man_month(),
                drift_amount: drift.amount,
                drift_man_month: drift.man_month,
            },
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A register row with its derived status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonContractRow {
    pub code: String,
    pub client: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContractStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_value: Option<Decimal>,
    pub currency: CurrencyCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_man_month: Option<Decimal>,
}

impl JsonContractRow {
    pub fn new(record: &ContractRecord, ctx: &ViewContext) -> Self {
        Self {
            code: record.code.clone(),
            client: record.client.clone(),
            project: record.project.clone(),
            title: record.title.clone(),
            status: record.status(ctx),
            start_date: record.start_date,
            end_date: record.end_date,
            total_value: record.total_value,
            currency: record.currency_or(ctx.rates.base()).clone(),
            total_man_month: record.total_man_month,
        }
    }
}

/// Root JSON output structure for `list`
#[derive(Debug, Clone, Serialize)]
pub struct JsonRegister {
    pub version: String,
    pub format: String,
    pub as_of: NaiveDate,
    pub contracts: Vec<JsonContractRow>,
    pub summary: RegisterSummary,
}

impl JsonRegister {
    pub fn new(rows: &[&ContractRecord], ctx: &ViewContext, summary: RegisterSummary) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: REGISTER_FORMAT.to_string(),
            as_of: ctx.today,
            contracts: rows.iter().map(|r| JsonContractRow::new(r, ctx)).collect(),
            summary,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
