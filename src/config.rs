//! prorata.toml configuration
//!
//! # Example prorata.toml
//!
//! ```toml
//! [status]
//! expiring_within_days = 45
//!
//! [currency]
//! base = "VND"
//!
//! [currency.rates]
//! USD = "25000"
//! EUR = "27000"
//!
//! [codes]
//! width = 4
//!
//! [codes.prefixes]
//! contract = "HD"
//! ```
//!
//! Every section is optional; missing keys fall back to the defaults.

use crate::code_gen::{CodeGenerator, EntityKind, DEFAULT_SEQUENCE_WIDTH};
use crate::currency::{CurrencyCode, RateTable};
use crate::status::DEFAULT_EXPIRING_WITHIN_DAYS;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// File name picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "prorata.toml";

/// Root configuration for prorata.toml
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub status: StatusConfig,

    #[serde(default)]
    pub currency: CurrencyConfig,

    #[serde(default)]
    pub codes: CodesConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StatusConfig {
    /// Active contracts ending within this many days are "expiring"
    #[serde(default = "default_expiring_within_days")]
    pub expiring_within_days: u32,
}

fn default_expiring_within_days() -> u32 {
    DEFAULT_EXPIRING_WITHIN_DAYS
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            expiring_within_days: DEFAULT_EXPIRING_WITHIN_DAYS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CurrencyConfig {
    #[serde(default)]
    pub base: CurrencyCode,

    /// Base units per one unit of each currency
    #[serde(default)]
    pub rates: BTreeMap<CurrencyCode, Decimal>,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            base: CurrencyCode::default(),
            rates: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CodesConfig {
    #[serde(default = "default_width")]
    pub width: usize,

    #[serde(default)]
    pub prefixes: PrefixConfig,
}

/// Per-kind prefix overrides
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PrefixConfig {
    pub client: Option<String>,
    pub project: Option<String>,
    pub contract: Option<String>,
    pub invoice: Option<String>,
}

impl PrefixConfig {
    fn overrides(&self) -> impl Iterator<Item = (EntityKind, &str)> {
        [
            (EntityKind::Client, &self.client),
            (EntityKind::Project, &self.project),
            (EntityKind::Contract, &self.contract),
            (EntityKind::Invoice, &self.invoice),
        ]
        .into_iter()
        .filter_map(|(kind, prefix)| prefix.as_deref().map(|p| (kind, p)))
    }
}

fn default_width() -> usize {
    DEFAULT_SEQUENCE_WIDTH
}

impl Default for CodesConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_SEQUENCE_WIDTH,
            prefixes: PrefixConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }

    /// Explicit path if given, else `./prorata.toml` if present, else defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            tracing::debug!(path = %local.display(), "using local config");
            return Self::from_file(local);
        }

        Ok(Self::default())
    }

    pub fn rate_table(&self) -> Result<RateTable> {
        RateTable::with_rates(
            self.currency.base.clone(),
            self.currency.rates.iter().map(|(code, rate)| (code.clone(), *rate)),
        )
        .context("Invalid [currency.rates]")
    }

    pub fn code_generator(&self) -> Result<CodeGenerator> {
        let mut generator = CodeGenerator::new().with_width(self.codes.width);
        for (kind, prefix) in self.codes.prefixes.overrides() {
            generator = generator
                .with_prefix(kind, prefix)
                .with_context(|| format!("Invalid prefix for {}", kind))?;
        }
        Ok(generator)
    }
}
