//! Output formatting module for s3stat
//!
//! This module provides formatters for displaying the bucket report in
//! different formats:
//! - Table format for human-readable terminal output
//! - JSON format for machine-readable output and integration with other tools

use crate::aggregation::{BucketReport, Totals};
use crate::bytefmt::format_bytes;
use prettytable::{Cell, Row, Table, format, row};
use serde_json::json;

/// Trait for report formatters
///
/// Implementations can provide different output formats (table, JSON, ...).
pub trait OutputFormatter {
    /// Format the report rows with totals
    fn format_report(&self, data: &[BucketReport], totals: &Totals) -> String;

    /// Format the report grouped into per-region sections
    fn format_report_by_region(&self, data: &[BucketReport], totals: &Totals) -> String;
}

/// Table formatter for human-readable output
pub struct TableFormatter;

impl TableFormatter {
    /// Format a number with thousands separators
    fn format_number(n: u64) -> String {
        let s = n.to_string();
        let mut result = String::new();

        for (count, ch) in s.chars().rev().enumerate() {
            if count > 0 && count % 3 == 0 {
                result.push(',');
            }
            result.push(ch);
        }

        result.chars().rev().collect()
    }

    /// Format the monthly cost column; unpriceable rows show "n/a"
    fn format_cost(cost: Option<f64>) -> String {
        match cost {
            Some(cost) => format!("${cost:.3}/mo"),
            None => "n/a".to_string(),
        }
    }

    fn format_datetime(dt: &chrono::DateTime<chrono::Utc>) -> String {
        dt.format("%Y-%m-%d %H:%M").to_string()
    }

    fn report_table(data: &[BucketReport], totals: Option<&Totals>) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

        table.set_titles(row![
            b -> "#",
            b -> "Bucket Identifier",
            b -> "Region",
            b -> "Created on",
            b -> "File Count",
            b -> "Bucket Size",
            b -> "Last Modified",
            b -> "Storage Cost"
        ]);

        for (i, report) in data.iter().enumerate() {
            table.add_row(row![
                r -> i,
                report.name,
                report.region,
                Self::format_datetime(&report.created),
                r -> Self::format_number(report.file_count),
                r -> format_bytes(report.total_size),
                Self::format_datetime(&report.last_modified),
                r -> Self::format_cost(report.monthly_cost)
            ]);
        }

        if let Some(totals) = totals {
            table.add_row(Row::new(vec![Cell::new(""); 8]));
            table.add_row(row![
                b -> "TOTAL",
                b -> format!("{} buckets", totals.buckets),
                "",
                "",
                b -> Self::format_number(totals.files),
                b -> format_bytes(totals.size),
                "",
                b -> format!("${:.3}/mo", totals.cost)
            ]);
        }

        table
    }

    /// Diagnostic lines for buckets whose scan was partial
    fn scan_notes(data: &[BucketReport]) -> String {
        let mut notes = String::new();
        for report in data {
            if let Some(error) = &report.error {
                notes.push_str(&format!("note: {} scan incomplete: {}\n", report.name, error));
            }
            if report.failed_objects > 0 {
                notes.push_str(&format!(
                    "note: {} had {} object(s) with failed metadata fetches\n",
                    report.name, report.failed_objects
                ));
            }
        }
        notes
    }
}

impl OutputFormatter for TableFormatter {
    fn format_report(&self, data: &[BucketReport], totals: &Totals) -> String {
        let mut output = Self::report_table(data, Some(totals)).to_string();

        let notes = Self::scan_notes(data);
        if !notes.is_empty() {
            output.push('\n');
            output.push_str(&notes);
        }
        output
    }

    fn format_report_by_region(&self, data: &[BucketReport], totals: &Totals) -> String {
        let mut output = String::new();

        let mut start = 0;
        while start < data.len() {
            let region = &data[start].region;
            let end = start + data[start..].iter().take_while(|r| &r.region == region).count();

            output.push_str(&format!("\n=== {region} ===\n"));
            output.push_str(&Self::report_table(&data[start..end], None).to_string());
            start = end;
        }

        output.push_str(&format!(
            "\nTOTAL: {} buckets, {} files, {}, ${:.3}/mo\n",
            totals.buckets,
            Self::format_number(totals.files),
            format_bytes(totals.size),
            totals.cost
        ));

        let notes = Self::scan_notes(data);
        if !notes.is_empty() {
            output.push('\n');
            output.push_str(&notes);
        }
        output
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, data: &[BucketReport], totals: &Totals) -> String {
        let output = json!({
            "buckets": data,
            "totals": totals,
        });
        serde_json::to_string_pretty(&output).unwrap_or_default()
    }

    fn format_report_by_region(&self, data: &[BucketReport], totals: &Totals) -> String {
        // Rows carry their region; grouping is presentation-only.
        self.format_report(data, totals)
    }
}

/// Get the appropriate formatter for the output mode
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter)
    }
}
