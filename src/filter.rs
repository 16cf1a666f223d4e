//! Contract filtering for `-f key=value` expressions
//!
//! Supports:
//! - Clients / projects: -f client=acme,globex
//! - Derived status: -f status=active,expiring
//! - Currency: -f currency=usd
//! - Date window: -f from=2024-01-01 (still running on/after), -f to=2024-06-30 (started on/before)
//! - Running on a day: -f on=2024-03-01
//! - Free text: -f search=migration (code, title or client)
//!
//! Values inside one expression are alternatives; separate expressions must
//! all match.

use crate::calendar::DateRange;
use crate::currency::CurrencyCode;
use crate::register::{ContractRecord, ViewContext};
use crate::status::ContractStatus;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

/// One `key=values` condition
#[derive(Debug, Clone, PartialEq, Eq)]
enum Clause {
    Client(Vec<String>),
    Project(Vec<String>),
    Status(Vec<ContractStatus>),
    Currency(Vec<CurrencyCode>),
    EndsOnOrAfter(NaiveDate),
    StartsOnOrBefore(NaiveDate),
    RunningOn(NaiveDate),
    Search(String),
}

/// Contract filter that decides which register rows to show
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractFilter {
    /// All clauses must match (empty = every contract)
    clauses: Vec<Clause>,
}

fn split_values(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate> {
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid date for {}: '{}'. Expected YYYY-MM-DD", key, value))
}

impl ContractFilter {
    /// Create a filter that includes all contracts
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse a single filter expression like "client=acme" or "status=active,expiring"
    pub fn from_expr(expr: &str) -> Result<Self> {
        let mut filter = Self::all();
        filter.push_expr(expr)?;
        Ok(filter)
    }

    /// Parse several expressions, all of which must match
    pub fn from_exprs<I, S>(exprs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::all();
        for expr in exprs {
            filter.push_expr(expr.as_ref())?;
        }
        Ok(filter)
    }

    fn push_expr(&mut self, expr: &str) -> Result<()> {
        let Some((key, raw)) = expr.split_once('=') else {
            bail!(
                "Invalid filter expression: {}. Expected format: KEY=VALUE[,VALUE...]",
                expr
            );
        };

        let values = split_values(raw);
        let key = key.trim().to_lowercase();
        if values.is_empty() {
            bail!("Filter '{}' has no values", key);
        }

        let clause = match key.as_str() {
            "client" => Clause::Client(values.iter().map(|v| v.to_lowercase()).collect()),
            "project" => Clause::Project(values.iter().map(|v| v.to_lowercase()).collect()),
            "status" => Clause::Status(
                values
                    .iter()
                    .map(|v| v.parse::<ContractStatus>().map_err(anyhow::Error::msg))
                    .collect::<Result<_>>()?,
            ),
            "currency" => Clause::Currency(
                values
                    .iter()
                    .map(|v| v.parse::<CurrencyCode>().map_err(anyhow::Error::from))
                    .collect::<Result<_>>()?,
            ),
            "from" => Clause::EndsOnOrAfter(parse_date("from", raw)?),
            "to" => Clause::StartsOnOrBefore(parse_date("to", raw)?),
            "on" => Clause::RunningOn(parse_date("on", raw)?),
            "search" => Clause::Search(raw.trim().to_lowercase()),
            other => bail!(
                "Unknown filter key '{}'. Expected one of: client, project, status, currency, from, to, on, search",
                other
            ),
        };

        self.clauses.push(clause);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Check if a contract passes every clause
    pub fn matches(&self, record: &ContractRecord, ctx: &ViewContext) -> bool {
        self.clauses
            .iter()
            .all(|clause| Self::clause_matches(clause, record, ctx))
    }

    fn clause_matches(clause: &Clause, record: &ContractRecord, ctx: &ViewContext) -> bool {
        match clause {
            Clause::Client(names) => names.contains(&record.client.to_lowercase()),
            Clause::Project(names) => record
                .project
                .as_ref()
                .is_some_and(|p| names.contains(&p.to_lowercase())),
            Clause::Status(wanted) => record
                .status(ctx)
                .is_some_and(|status| wanted.contains(&status)),
            Clause::Currency(codes) => codes.contains(record.currency_or(ctx.rates.base())),
            // Open-ended contracts are still running on any date
            Clause::EndsOnOrAfter(date) => record.end_date.map_or(true, |end| end >= *date),
            Clause::StartsOnOrBefore(date) => record.start_date.is_some_and(|start| start <= *date),
            Clause::RunningOn(date) => match (record.start_date, record.end_date) {
                (Some(start), Some(end)) => {
                    DateRange::new(start, end).is_ok_and(|range| range.contains(*date))
                }
                (Some(start), None) => start <= *date,
                _ => false,
            },
            Clause::Search(needle) => [record.code.as_str(), record.title.as_str(), record.client.as_str()]
                .iter()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
        }
    }
}
