use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;
use prorata::cli::{
    AllocateArgs, Cli, Command, ConvertArgs, ListArgs, NextCodeArgs, OutputFormat, StatusArgs,
};
use prorata::config::Config;
use prorata::csv_output::{CsvOutput, CsvRegisterOutput};
use prorata::filter::ContractFilter;
use prorata::json_output::{JsonContract, JsonRegister, JsonSchedule};
use prorata::register::{ContractRecord, Register, RegisterSummary, ViewContext};
use prorata::schedule::Schedule;
use prorata::status;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn today_or(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

/// Print a schedule as an aligned table with totals and drift
fn print_schedule(schedule: &Schedule, contract: &JsonContract) {
    let range = schedule.range();
    match &contract.code {
        Some(code) => println!("=== Allocation for {} ===", code),
        None => println!("=== Allocation ==="),
    }
    println!(
        "Period: {} -> {} ({} days)",
        range.start(),
        range.end(),
        range.days()
    );
    println!(
        "Value: {} {}, effort: {} man-month",
        contract.total_value, contract.currency, contract.total_man_month
    );
    println!();

    println!("{:<10} {:>16} {:>10}", "Month", "Amount", "Man-month");
    println!("─────────────────────────────────────────");
    for entry in schedule.entries() {
        println!(
            "{:<10} {:>16} {:>10}",
            entry.month_label.to_string(),
            entry.amount.to_string(),
            entry.man_month.to_string()
        );
    }
    println!("─────────────────────────────────────────");

    let drift = schedule.drift();
    println!(
        "{:<10} {:>16} {:>10}",
        "Total",
        schedule.total_amount().to_string(),
        schedule.total_man_month().to_string()
    );
    if !drift.is_zero() {
        println!(
            "{:<10} {:>16} {:>10}",
            "Drift",
            drift.amount.to_string(),
            drift.man_month.to_string()
        );
    }
}

fn run_allocate(args: AllocateArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let rates = config.rate_table()?;

    let (code, mut span, mut currency) = match (&args.register, &args.code) {
        (Some(path), Some(code)) => {
            let register = Register::from_file(path)?;
            let Some(record) = register.find(code) else {
                bail!("Contract {} not found in {}", code, path.display());
            };
            (
                Some(record.code.clone()),
                record.span(),
                record.currency_or(rates.base()).clone(),
            )
        }
        _ => (
            None,
            prorata::allocator::ContractSpan {
                start_date: args.start,
                end_date: args.end,
                total_value: args.value,
                total_man_month: args.man_month,
            },
            args.currency.clone().unwrap_or_else(|| rates.base().clone()),
        ),
    };

    if let Some(target) = &args.to_currency {
        span.total_value = span
            .total_value
            .map(|value| rates.convert(value, &currency, target))
            .transpose()?;
        currency = target.clone();
    }

    let schedule = Schedule::build(&span)?;
    let range = schedule.range();
    let contract = JsonContract {
        code,
        start_date: range.start(),
        end_date: range.end(),
        total_value: schedule.contract_value(),
        total_man_month: schedule.contract_man_month(),
        currency,
    };

    match format {
        OutputFormat::Text => print_schedule(&schedule, &contract),
        OutputFormat::Json => println!("{}", JsonSchedule::new(&schedule, contract).to_json()?),
        OutputFormat::Csv => {
            let mut csv = CsvOutput::new(args.totals);
            for entry in schedule.entries() {
                csv.add_entry(entry.clone());
            }
            print!("{}", csv.to_csv());
        }
    }
    Ok(())
}

fn run_status(args: StatusArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let today = today_or(args.today);
    let validity = status::validity(
        args.start,
        args.end,
        today,
        config.status.expiring_within_days,
    )?;

    match format {
        OutputFormat::Text => {
            print!("Status: {}", validity.status);
            match validity.days_remaining {
                Some(days) if days >= 0 => println!(" ({} days remaining)", days),
                Some(days) => println!(" (ended {} days ago)", -days),
                None => println!(" (open-ended)"),
            }
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "as_of": today,
                "status": validity.status,
                "days_remaining": validity.days_remaining,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => {
            println!("status,days_remaining");
            println!(
                "{},{}",
                validity.status,
                validity
                    .days_remaining
                    .map(|d| d.to_string())
                    .unwrap_or_default()
            );
        }
    }
    Ok(())
}

/// Print register rows as an aligned table
fn print_register(rows: &[&ContractRecord], ctx: &ViewContext, summary: &RegisterSummary) {
    println!(
        "{:<14} {:<16} {:<9} {:<10} {:<10} {:>14} {:<4}",
        "Code", "Client", "Status", "Start", "End", "Value", "Cur"
    );
    println!("─────────────────────────────────────────────────────────────────────────────────");
    let blank = || "-".to_string();
    for row in rows {
        println!(
            "{:<14} {:<16} {:<9} {:<10} {:<10} {:>14} {:<4}",
            row.code,
            row.client,
            row.status(ctx).map(|s| s.to_string()).unwrap_or_else(blank),
            row.start_date.map(|d| d.to_string()).unwrap_or_else(blank),
            row.end_date.map(|d| d.to_string()).unwrap_or_else(blank),
            row.total_value.map(|v| v.to_string()).unwrap_or_else(blank),
            row.currency_or(ctx.rates.base()).as_str(),
        );
    }
    println!("─────────────────────────────────────────────────────────────────────────────────");
    let in_force = rows
        .iter()
        .filter(|row| row.status(ctx).is_some_and(|s| s.is_in_force()))
        .count();
    println!(
        "{} contracts, {} in force, total value {} {}, {} man-month",
        summary.count, in_force, summary.total_value, summary.currency, summary.total_man_month
    );
    if summary.without_value > 0 {
        println!("{} contracts have no value yet", summary.without_value);
    }
}

fn run_list(args: ListArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let register = Register::from_file(&args.register)?;
    let filter = ContractFilter::from_exprs(&args.filters)?;
    let ctx = ViewContext {
        today: today_or(args.today),
        expiring_within_days: config.status.expiring_within_days,
        rates: config.rate_table()?,
    };

    let rows = register.select(&filter, &ctx, args.sort, args.descending);
    let summary = Register::summary(&rows, &ctx.rates).context("Cannot total contract values")?;

    match format {
        OutputFormat::Text => print_register(&rows, &ctx, &summary),
        OutputFormat::Json => println!("{}", JsonRegister::new(&rows, &ctx, summary).to_json()?),
        OutputFormat::Csv => {
            let mut csv = CsvRegisterOutput::new();
            for row in &rows {
                csv.add_record(row, &ctx);
            }
            print!("{}", csv.to_csv());
        }
    }
    Ok(())
}

fn run_next_code(args: NextCodeArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let generator = config.code_generator()?;
    let year = args.year.unwrap_or_else(|| Local::now().year());

    let mut existing = args.existing;
    if let Some(path) = &args.register {
        let register = Register::from_file(path)?;
        existing.extend(register.codes().map(str::to_string));
    }

    let code = generator.next_code(args.kind, year, &existing)?;

    match format {
        OutputFormat::Text => println!("{}", code),
        OutputFormat::Json => {
            let value = serde_json::json!({ "kind": args.kind, "year": year, "code": code });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => {
            println!("kind,year,code");
            println!("{},{},{}", args.kind, year, code);
        }
    }
    Ok(())
}

fn run_convert(args: ConvertArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let rates = config.rate_table()?;
    let result = rates
        .convert(args.amount, &args.from, &args.to)
        .with_context(|| {
            let known: Vec<&str> = rates.currencies().map(|c| c.as_str()).collect();
            format!("Cannot convert (known currencies: {})", known.join(", "))
        })?;

    match format {
        OutputFormat::Text => println!("{} {} = {} {}", args.amount, args.from, result, args.to),
        OutputFormat::Json => {
            let value = serde_json::json!({
                "amount": args.amount,
                "from": args.from,
                "to": args.to,
                "result": result,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => {
            println!("amount,from,to,result");
            println!("{},{},{},{}", args.amount, args.from, args.to, result);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = Config::discover(args.config.as_deref())?;

    match args.command {
        Command::Allocate(cmd) => run_allocate(cmd, &config, args.format),
        Command::Status(cmd) => run_status(cmd, &config, args.format),
        Command::List(cmd) => run_list(cmd, &config, args.format),
        Command::NextCode(cmd) => run_next_code(cmd, &config, args.format),
        Command::Convert(cmd) => run_convert(cmd, &config, args.format),
    }
}
