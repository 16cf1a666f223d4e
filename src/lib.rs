//! prorata - pro-rata monthly allocation of contract value and effort
//!
//! This library spreads a contract's total value and man-months over the
//! calendar months it spans, weighted by day count, and provides the
//! surrounding contract tooling: status derivation from dates, currency
//! conversion, sequential record codes and filtered register listings.

pub mod allocator;
pub mod calendar;
pub mod cli;
pub mod code_gen;
pub mod config;
pub mod csv_output;
pub mod currency;
pub mod filter;
pub mod json_output;
pub mod register;
pub mod schedule;
pub mod status;
