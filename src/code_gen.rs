//! Automatic record codes
//!
//! Codes have the form `{PREFIX}-{YYYY}-{SEQ}`, e.g. `CT-2024-0007`. The next
//! code for a kind and year is one past the highest sequence already in use
//! for that prefix and year. Codes with another prefix, another year or an
//! unrecognised shape do not affect the sequence.

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Default zero-padding of the sequence part
pub const DEFAULT_SEQUENCE_WIDTH: usize = 4;

#[derive(Error, Debug)]
pub enum CodeError {
    #[error("Invalid code prefix '{0}': must be non-empty ASCII letters or digits")]
    InvalidPrefix(String),

    #[error("Failed to build code pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Kinds of records that receive generated codes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Client,
    Project,
    Contract,
    Invoice,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Client,
        EntityKind::Project,
        EntityKind::Contract,
        EntityKind::Invoice,
    ];

    pub fn default_prefix(&self) -> &'static str {
        match self {
            EntityKind::Client => "CL",
            EntityKind::Project => "PJ",
            EntityKind::Contract => "CT",
            EntityKind::Invoice => "INV",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Client => "client",
            EntityKind::Project => "project",
            EntityKind::Contract => "contract",
            EntityKind::Invoice => "invoice",
        };
        f.write_str(name)
    }
}

/// Issues sequential codes per kind and year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGenerator {
    prefixes: BTreeMap<EntityKind, String>,
    width: usize,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self {
            prefixes: EntityKind::ALL
                .iter()
                .map(|k| (*k, k.default_prefix().to_string()))
                .collect(),
            width: DEFAULT_SEQUENCE_WIDTH,
        }
    }
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the prefix used for `kind` (stored upper-case)
    pub fn with_prefix(mut self, kind: EntityKind, prefix: &str) -> Result<Self, CodeError> {
        let prefix = prefix.trim();
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CodeError::InvalidPrefix(prefix.to_string()));
        }
        self.prefixes.insert(kind, prefix.to_ascii_uppercase());
        Ok(self)
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    pub fn prefix(&self, kind: EntityKind) -> &str {
        self.prefixes
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_prefix())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn format_code(&self, kind: EntityKind, year: i32, sequence: u64) -> String {
        format!(
            "{}-{:04}-{:0width$}",
            self.prefix(kind),
            year,
            sequence,
            width = self.width
        )
    }

    /// Next free code for `kind` in `year`, given the codes already issued
    pub fn next_code<I>(&self, kind: EntityKind, year: i32, existing: I) -> Result<String, CodeError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let pattern = Regex::new(&format!(
            r"(?i)^{}-(\d{{4}})-(\d+)$",
            regex::escape(self.prefix(kind))
        ))?;

        let mut highest = 0u64;
        for code in existing {
            let code = code.as_ref().trim();
            let Some(caps) = pattern.captures(code) else {
                continue;
            };
            if caps[1].parse::<i32>().ok() != Some(year) {
                continue;
            }
            match caps[2].parse::<u64>() {
                Ok(seq) => highest = highest.max(seq),
                Err(_) => tracing::warn!(code, "ignoring code with oversized sequence"),
            }
        }

        Ok(self.format_code(kind, year, highest.saturating_add(1)))
    }
}
