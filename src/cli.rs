//! CLI argument parsing for prorata

use crate::code_gen::EntityKind;
use crate::currency::CurrencyCode;
use crate::register::SortKey;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Output format for schedules and listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "prorata")]
#[command(version)]
#[command(about = "Pro-rata monthly allocation of contract value and man-months", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./prorata.toml when present)
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text, json or csv)
    #[arg(long = "format", value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Spread a contract's value and man-months over the months it spans
    Allocate(AllocateArgs),

    /// Show the status of a contract on a given day
    Status(StatusArgs),

    /// List contracts from a register file
    List(ListArgs),

    /// Print the next free code for a record kind
    NextCode(NextCodeArgs),

    /// Convert an amount between currencies using the configured rates
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
pub struct AllocateArgs {
    /// Contract start date (YYYY-MM-DD, inclusive)
    #[arg(long = "start", value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Contract end date (YYYY-MM-DD, inclusive)
    #[arg(long = "end", value_name = "DATE")]
    pub end: Option<NaiveDate>,

    /// Total contract value
    #[arg(long = "value", value_name = "AMOUNT", allow_negative_numbers = true)]
    pub value: Option<Decimal>,

    /// Total effort in man-months
    #[arg(long = "man-month", value_name = "N", allow_negative_numbers = true)]
    pub man_month: Option<Decimal>,

    /// Currency of --value (defaults to the base currency)
    #[arg(long = "currency", value_name = "CODE")]
    pub currency: Option<CurrencyCode>,

    /// Convert the contract value into this currency before allocating
    #[arg(long = "to-currency", value_name = "CODE")]
    pub to_currency: Option<CurrencyCode>,

    /// Take the contract from a register file (requires --code)
    #[arg(
        long = "register",
        value_name = "FILE",
        requires = "code",
        conflicts_with_all = ["start", "end", "value", "man_month", "currency"]
    )]
    pub register: Option<PathBuf>,

    /// Contract code in the register
    #[arg(long = "code", value_name = "CODE", requires = "register")]
    pub code: Option<String>,

    /// Append a totals row to CSV output
    #[arg(long = "totals")]
    pub totals: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Contract start date (YYYY-MM-DD)
    #[arg(long = "start", value_name = "DATE")]
    pub start: NaiveDate,

    /// Contract end date (omit for open-ended contracts)
    #[arg(long = "end", value_name = "DATE")]
    pub end: Option<NaiveDate>,

    /// Evaluate as of this day instead of today
    #[arg(long = "today", value_name = "DATE")]
    pub today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Register file (JSON)
    #[arg(long = "register", value_name = "FILE")]
    pub register: PathBuf,

    /// Filter contracts (e.g., -f client=acme -f status=active,expiring); repeatable
    #[arg(short = 'f', long = "filter", value_name = "EXPR")]
    pub filters: Vec<String>,

    /// Sort column
    #[arg(long = "sort", value_enum, default_value = "code")]
    pub sort: SortKey,

    /// Sort descending
    #[arg(long = "desc")]
    pub descending: bool,

    /// Evaluate status as of this day instead of today
    #[arg(long = "today", value_name = "DATE")]
    pub today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct NextCodeArgs {
    /// Kind of record
    #[arg(long = "kind", value_enum)]
    pub kind: EntityKind,

    /// Register whose contract codes are already taken
    #[arg(long = "register", value_name = "FILE")]
    pub register: Option<PathBuf>,

    /// Codes already taken, in addition to the register; repeatable
    #[arg(long = "existing", value_name = "CODE")]
    pub existing: Vec<String>,

    /// Year of the code (defaults to the current year)
    #[arg(long = "year", value_name = "YYYY")]
    pub year: Option<i32>,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    #[arg(long = "amount", value_name = "AMOUNT", allow_negative_numbers = true)]
    pub amount: Decimal,

    #[arg(long = "from", value_name = "CODE")]
    pub from: CurrencyCode,

    #[arg(long = "to", value_name = "CODE")]
    pub to: CurrencyCode,
}
