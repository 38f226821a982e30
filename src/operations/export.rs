use super::summary::round_to_integer;
use crate::error::{TrackerError, TrackerResult, ValidationError};
use crate::models::category::Category;
use crate::models::receipt::Receipt;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// UTF-8 byte-order mark so spreadsheet tools pick the right encoding.
const BOM: &str = "\u{feff}";

const ITEM_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// One row per receipt.
    Detailed,
    /// One row per distinct date.
    DailySummary,
    /// One row per category with receipts.
    CategorySummary,
}

impl FromStr for ExportMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "detailed" => Ok(ExportMode::Detailed),
            "daily" | "summary" => Ok(ExportMode::DailySummary),
            "categories" | "category" => Ok(ExportMode::CategorySummary),
            other => Err(ValidationError::InvalidFormat {
                field: "export mode".to_string(),
                reason: format!("'{}' is not one of detailed, daily, categories", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

pub fn build_report(
    receipts: &[Receipt],
    categories: &[Category],
    mode: ExportMode,
) -> TrackerResult<ExportTable> {
    if receipts.is_empty() {
        return Err(TrackerError::NothingToExport);
    }

    let table = match mode {
        ExportMode::Detailed => detailed(receipts),
        ExportMode::DailySummary => daily_summary(receipts),
        ExportMode::CategorySummary => category_summary(receipts, categories),
    };
    Ok(table)
}

fn detailed(receipts: &[Receipt]) -> ExportTable {
    let rows = receipts
        .iter()
        .map(|r| {
            vec![
                r.date().to_string(),
                r.store().to_string(),
                r.category().to_string(),
                format_amount(r.amount()),
                r.items().join(ITEM_SEPARATOR),
            ]
        })
        .collect();

    ExportTable {
        headers: vec!["Date", "Store", "Category", "Amount", "Items"],
        rows,
    }
}

fn daily_summary(receipts: &[Receipt]) -> ExportTable {
    // Dates keep the order in which they first appear.
    let mut days: Vec<(NaiveDate, usize, Decimal)> = Vec::new();
    for receipt in receipts {
        match days.iter_mut().find(|(date, _, _)| *date == receipt.date()) {
            Some((_, count, total)) => {
                *count += 1;
                *total += receipt.amount();
            }
            None => days.push((receipt.date(), 1, receipt.amount())),
        }
    }

    let rows = days
        .into_iter()
        .map(|(date, count, total)| {
            vec![date.to_string(), count.to_string(), format_amount(total)]
        })
        .collect();

    ExportTable {
        headers: vec!["Date", "Receipts", "Total"],
        rows,
    }
}

fn category_summary(receipts: &[Receipt], categories: &[Category]) -> ExportTable {
    let rows = categories
        .iter()
        .filter_map(|category| {
            let matching: Vec<&Receipt> = receipts
                .iter()
                .filter(|r| r.category() == category.name())
                .collect();
            if matching.is_empty() {
                return None;
            }
            let total: Decimal = matching.iter().map(|r| r.amount()).sum();
            let average = round_to_integer(total / Decimal::from(matching.len()));
            Some(vec![
                category.name().to_string(),
                matching.len().to_string(),
                format_amount(total),
                format_amount(average),
            ])
        })
        .collect();

    ExportTable {
        headers: vec!["Category", "Receipts", "Total", "Average"],
        rows,
    }
}

fn format_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// Writes `table` as BOM-prefixed CSV with every field quoted.
pub fn write_csv<W: Write>(table: &ExportTable, mut out: W) -> TrackerResult<()> {
    out.write_all(BOM.as_bytes())?;

    // Header included; embedded quotes come out doubled.
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_file_name(today: NaiveDate) -> String {
    format!("expenses_{}.csv", today.format("%Y-%m-%d"))
}

/// Builds the report and writes it into `dir`. Returns the written path.
pub fn export_report(
    dir: &Path,
    today: NaiveDate,
    receipts: &[Receipt],
    categories: &[Category],
    mode: ExportMode,
) -> TrackerResult<PathBuf> {
    let table = build_report(receipts, categories, mode)?;
    let path = dir.join(export_file_name(today));

    let file = File::create(&path)?;
    write_csv(&table, file)?;

    info!(path = %path.display(), ?mode, rows = table.rows.len(), "Report exported");
    Ok(path)
}
