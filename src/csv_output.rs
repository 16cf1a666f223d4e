//! CSV output format for schedules and register listings
//!
//! For spreadsheet import of monthly allocations and contract lists

use crate::allocator::AllocationEntry;
use crate::register::{ContractRecord, ViewContext};

/// Escape CSV field (handle commas, quotes, newlines)
pub fn escape_field(field: &str) -> String {
    // If field contains comma, quote, or newline, wrap in quotes and escape quotes
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// CSV formatter for an allocation schedule
#[derive(Debug, Default)]
pub struct CsvOutput {
    entries: Vec<AllocationEntry>,
    include_totals: bool,
}

impl CsvOutput {
    /// Create a new CSV output formatter
    pub fn new(include_totals: bool) -> Self {
        Self {
            entries: Vec::new(),
            include_totals,
        }
    }

    pub fn add_entry(&mut self, entry: AllocationEntry) {
        self.entries.push(entry);
    }

    fn header(&self) -> &'static str {
        "month,amount,man_month"
    }

    fn format_entry(entry: &AllocationEntry) -> String {
        format!(
            "{},{},{}",
            entry.month_label, entry.amount, entry.man_month
        )
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(self.header());
        output.push('\n');

        for entry in &self.entries {
            output.push_str(&Self::format_entry(entry));
            output.push('\n');
        }

        if self.include_totals {
            let amount: rust_decimal::Decimal = self.entries.iter().map(|e| e.amount).sum();
            let man_month: rust_decimal::Decimal = self.entries.iter().map(|e| e.man_month).sum();
            output.push_str(&format!("total,{},{}\n", amount, man_month));
        }

        output
    }
}

/// CSV formatter for `list`
#[derive(Debug, Default)]
pub struct CsvRegisterOutput {
    rows: Vec<String>,
}

impl CsvRegisterOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&mut self, record: &ContractRecord, ctx: &ViewContext) {
        let fields = [
            escape_field(&record.code),
            escape_field(&record.client),
            escape_field(record.project.as_deref().unwrap_or_default()),
            escape_field(&record.title),
            optional(record.status(ctx)),
            optional(record.start_date),
            optional(record.end_date),
            optional(record.total_value),
            record.currency_or(ctx.rates.base()).to_string(),
            optional(record.total_man_month),
        ];
        self.rows.push(fields.join(","));
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::from(
            "code,client,project,title,status,start_date,end_date,total_value,currency,total_man_month\n",
        );
        for row in &self.rows {
            output.push_str(row);
            output.push('\n');
        }
        output
    }
}
