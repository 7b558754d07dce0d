//! Exports of the merged metric table: nested JSON, flat CSV/Excel and a
//! plain-text summary of the extraction run.

use chrono::Utc;
use indexmap::IndexSet;
use rust_xlsxwriter::{Format, Workbook};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::Result;
use crate::extractor::ExtractionSummary;
use crate::models::{MetricTable, MetricValue};

pub const JSON_FILE: &str = "metrics.json";
pub const CSV_FILE: &str = "metrics.csv";
pub const EXCEL_FILE: &str = "metrics.xlsx";
pub const REPORT_FILE: &str = "extraction_report.txt";

const FIXED_COLUMNS: [&str; 3] = ["Name", "Ticker", "Industry"];

/// Paths of everything written by [`ReportWriter::write_all`]
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub excel: PathBuf,
    pub report: PathBuf,
}

/// One company as a flat row: fixed columns then the latest value of each metric
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow {
    pub name: String,
    pub ticker: String,
    pub industry: String,
    pub values: Vec<Option<MetricValue>>,
}

/// Headers plus one row per company
pub fn flatten(table: &MetricTable) -> (Vec<String>, Vec<FlatRow>) {
    let labels = table.metric_labels();

    let mut headers: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    headers.extend(labels.iter().cloned());

    let rows = table
        .companies()
        .map(|company| FlatRow {
            name: company.name.clone(),
            ticker: company.ticker.clone(),
            industry: company.industry.clone(),
            values: labels
                .iter()
                .map(|label| company.latest_value(label).cloned())
                .collect(),
        })
        .collect();

    (headers, rows)
}

pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    /// Creates the output directory if needed
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn write_all(&self, table: &MetricTable, summary: &ExtractionSummary) -> Result<ReportPaths> {
        let paths = ReportPaths {
            json: self.write_json(table)?,
            csv: self.write_csv(table)?,
            excel: self.write_excel(table)?,
            report: self.write_summary(table, summary)?,
        };
        info!("✅ All exports written to {}", self.output_dir.display());
        Ok(paths)
    }

    pub fn write_json(&self, table: &MetricTable) -> Result<PathBuf> {
        let path = self.output_dir.join(JSON_FILE);
        table.save(&path)?;
        info!("✓ JSON saved: {}", path.display());
        Ok(path)
    }

    pub fn write_csv(&self, table: &MetricTable) -> Result<PathBuf> {
        let path = self.output_dir.join(CSV_FILE);
        let (headers, rows) = flatten(table);

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(&headers)?;
        for row in rows {
            let mut record = vec![row.name, row.ticker, row.industry];
            record.extend(
                row.values
                    .iter()
                    .map(|value| value.as_ref().map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&record)?;
        }
        writer.flush()?;

        info!("✓ CSV saved: {}", path.display());
        Ok(path)
    }

    pub fn write_excel(&self, table: &MetricTable) -> Result<PathBuf> {
        let path = self.output_dir.join(EXCEL_FILE);
        let (headers, rows) = flatten(table);

        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Metrics")?;

        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header, &bold)?;
        }

        for (idx, row) in rows.iter().enumerate() {
            let excel_row = (idx + 1) as u32;
            worksheet.write_string(excel_row, 0, &row.name)?;
            worksheet.write_string(excel_row, 1, &row.ticker)?;
            worksheet.write_string(excel_row, 2, &row.industry)?;
            for (offset, value) in row.values.iter().enumerate() {
                let col = (FIXED_COLUMNS.len() + offset) as u16;
                match value {
                    Some(MetricValue::Number(n)) => {
                        worksheet.write_number(excel_row, col, *n)?;
                    }
                    Some(MetricValue::Text(s)) => {
                        worksheet.write_string(excel_row, col, s)?;
                    }
                    None => {}
                }
            }
        }

        workbook.save(&path)?;
        info!("✓ Excel saved: {}", path.display());
        Ok(path)
    }

    pub fn write_summary(&self, table: &MetricTable, summary: &ExtractionSummary) -> Result<PathBuf> {
        let path = self.output_dir.join(REPORT_FILE);
        fs::write(&path, render_summary(table, summary))?;
        info!("✓ Report saved: {}", path.display());
        Ok(path)
    }
}

/// Plain-text report of an extraction run
pub fn render_summary(table: &MetricTable, summary: &ExtractionSummary) -> String {
    let rule = "=".repeat(70);
    let mut out = String::new();

    let _ = writeln!(out, "FINANCIAL METRIC EXTRACTION REPORT");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Generated: {}", Utc::now().format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(out);
    let _ = writeln!(out, "Workbooks found: {}", summary.files_found);
    let _ = writeln!(out, "Files processed: {}", summary.processed.len());
    let _ = writeln!(out, "Files skipped: {}", summary.skipped.len());
    for skipped in &summary.skipped {
        let _ = writeln!(out, "  - {}: {}", skipped.file, skipped.reason);
    }
    let unmatched: Vec<&str> = summary.unmatched().map(|p| p.file.as_str()).collect();
    if !unmatched.is_empty() {
        let _ = writeln!(out, "Without company reference: {}", unmatched.join(", "));
    }
    let _ = writeln!(out, "Companies: {}", table.len());

    for company in table.companies() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{} ({})", company.name, company.ticker);
        let _ = writeln!(out, "  Industry: {}", company.industry);
        let _ = writeln!(out, "  Metrics extracted: {}", company.filled_metric_count());

        let missing: IndexSet<&str> = summary
            .processed
            .iter()
            .filter(|p| p.company == company.name)
            .flat_map(|p| p.missing_metrics.iter().map(String::as_str))
            .filter(|metric| !company.metrics.contains_key(*metric))
            .collect();
        if !missing.is_empty() {
            let missing: Vec<&str> = missing.into_iter().collect();
            let _ = writeln!(out, "  Missing: {}", missing.join(", "));
        }
    }

    out
}
