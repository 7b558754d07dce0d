//! Financial metric extraction from a directory of workbooks.
//!
//! Each workbook is matched to a company reference by its filename, then
//! every sheet category is located through its aliases and the target
//! metrics are read row by row into a [`MetricTable`]. A workbook that
//! cannot be processed is logged and skipped; the scan always continues.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub mod categories;
pub mod matching;
pub mod values;
pub mod workbook;

pub use categories::SheetCategory;
pub use workbook::{CalamineWorkbook, Cell, MemoryWorkbook, SheetGrid, WorkbookSource};

use crate::errors::{PortfolioError, Result};
use crate::models::{CompanyRef, MetricTable, YearValues, NOT_AVAILABLE};
use matching::{candidate_company_name, find_company, find_metric_row, resolve_sheet, LabelMatch};
use values::coerce_cell;

pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

/// Outcome for one workbook that was read
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedFile {
    pub file: String,
    pub company: String,
    pub matched_reference: bool,
    pub sheets_found: usize,
    pub metrics_found: usize,
    pub missing_metrics: Vec<String>,
    pub overwritten_cells: usize,
}

/// A workbook that could not be processed
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

/// Counters for the whole scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionSummary {
    pub files_found: usize,
    pub processed: Vec<ProcessedFile>,
    pub skipped: Vec<SkippedFile>,
}

impl ExtractionSummary {
    pub fn unmatched(&self) -> impl Iterator<Item = &ProcessedFile> {
        self.processed.iter().filter(|p| !p.matched_reference)
    }
}

/// Loads the company reference list.
///
/// Accepts a bare array, the stock store layout (`{"stocks": [...]}`) or an
/// object keyed by company name. Malformed entries are skipped with a warning.
pub fn load_company_refs(path: &Path) -> Result<Vec<CompanyRef>> {
    if !path.exists() {
        error!("Company reference file not found: {}", path.display());
        return Err(PortfolioError::ConfigMissing {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    let root: Value = serde_json::from_str(&content)
        .map_err(|e| PortfolioError::malformed(path.display().to_string(), e))?;

    let entries: Vec<(Option<String>, Value)> = match root {
        Value::Array(items) => items.into_iter().map(|item| (None, item)).collect(),
        Value::Object(mut map) => match map.remove("stocks") {
            Some(Value::Array(items)) => items.into_iter().map(|item| (None, item)).collect(),
            _ => map.into_iter().map(|(key, item)| (Some(key), item)).collect(),
        },
        _ => {
            return Err(PortfolioError::malformed(
                path.display().to_string(),
                "expected an array or an object of companies",
            ))
        }
    };

    let mut companies = Vec::with_capacity(entries.len());
    for (idx, (key, mut item)) in entries.into_iter().enumerate() {
        // Object-keyed lists carry the name in the key
        if let (Some(key), Value::Object(fields)) = (&key, &mut item) {
            if !fields.contains_key("name") && !fields.contains_key("nom") {
                fields.insert("name".to_string(), Value::String(key.clone()));
            }
        }
        match serde_json::from_value::<CompanyRef>(item) {
            Ok(company) if !company.name.trim().is_empty() => companies.push(company),
            Ok(_) => warn!("⚠️  Company entry #{} has an empty name, skipped", idx),
            Err(e) => warn!("⚠️  Company entry #{} is malformed, skipped: {}", idx, e),
        }
    }

    info!("✅ Loaded {} company references from {}", companies.len(), path.display());
    Ok(companies)
}

/// Workbooks in `dir`, sorted by file name; lock files (`~$…`) are ignored
pub fn list_workbooks(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PortfolioError::ConfigMissing {
            path: dir.to_path_buf(),
        });
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            !name.starts_with('~') && WORKBOOK_EXTENSIONS.contains(&extension.as_str())
        })
        .collect();
    files.sort();
    Ok(files)
}

pub struct MetricExtractor {
    companies: Vec<CompanyRef>,
}

impl MetricExtractor {
    pub fn new(companies: Vec<CompanyRef>) -> Self {
        Self { companies }
    }

    pub fn companies(&self) -> &[CompanyRef] {
        &self.companies
    }

    /// Scans `dir` and merges every readable workbook into `table`
    pub fn extract_directory(&self, dir: &Path, table: &mut MetricTable) -> Result<ExtractionSummary> {
        let files = list_workbooks(dir)?;
        info!("📂 {} workbook(s) found in {}", files.len(), dir.display());

        let mut summary = ExtractionSummary {
            files_found: files.len(),
            ..Default::default()
        };

        for path in files {
            let file = display_name(&path);
            match self.extract_file(&path, table) {
                Ok(processed) => summary.processed.push(processed),
                Err(e) => {
                    error!("❌ Skipping {}: {}", file, e);
                    summary.skipped.push(SkippedFile {
                        file,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "✅ Extraction finished: {} processed, {} skipped",
            summary.processed.len(),
            summary.skipped.len()
        );
        Ok(summary)
    }

    pub fn extract_file(&self, path: &Path, table: &mut MetricTable) -> Result<ProcessedFile> {
        let mut workbook = CalamineWorkbook::open(path)?;
        self.extract_workbook(&display_name(path), &mut workbook, table)
    }

    /// Extracts one workbook. Rows merged before a sheet read error stay in the table.
    pub fn extract_workbook<W: WorkbookSource>(
        &self,
        file: &str,
        workbook: &mut W,
        table: &mut MetricTable,
    ) -> Result<ProcessedFile> {
        info!("📄 Processing {}", file);

        let candidate = candidate_company_name(file);
        let (company, matched_reference) = match find_company(&candidate, &self.companies) {
            Some(company) => {
                info!("🏢 {} -> {} ({})", file, company.name, company.ticker);
                (company.clone(), true)
            }
            None => {
                warn!("⚠️  No company reference matches '{}', keeping it as is", candidate);
                (CompanyRef::new(&candidate, NOT_AVAILABLE, NOT_AVAILABLE), false)
            }
        };
        table.company_entry(&company);

        let sheet_names = workbook.sheet_names();
        debug!("Sheets in {}: {:?}", file, sheet_names);

        let mut processed = ProcessedFile {
            file: file.to_string(),
            company: company.name.clone(),
            matched_reference,
            sheets_found: 0,
            metrics_found: 0,
            missing_metrics: Vec::new(),
            overwritten_cells: 0,
        };

        for category in SheetCategory::ALL {
            let Some(sheet_name) = resolve_sheet(category, &sheet_names) else {
                warn!("⚠️  {}: no {} sheet", file, category.label());
                processed
                    .missing_metrics
                    .extend(category.metrics().iter().map(|m| m.to_string()));
                continue;
            };
            processed.sheets_found += 1;

            let grid = workbook.read_sheet(sheet_name)?;
            if grid.is_empty() {
                warn!("⚠️  {}: sheet '{}' is empty", file, sheet_name);
            }

            for metric in category.metrics() {
                match extract_metric_row(&grid, metric) {
                    Some((values, how)) if values.is_empty() => {
                        warn!("  ⚠️  {}: '{}' has no values ({:?} match)", file, metric, how);
                        processed.missing_metrics.push(metric.to_string());
                    }
                    Some((values, how)) => {
                        debug!("  ✓ {} ({:?}, {} years)", metric, how, values.len());
                        processed.metrics_found += 1;
                        processed.overwritten_cells += table.merge_metric(&company, metric, values, file);
                    }
                    None => {
                        warn!("  ⚠️  {}: '{}' not found in '{}'", file, metric, sheet_name);
                        processed.missing_metrics.push(metric.to_string());
                    }
                }
            }
        }

        info!(
            "✓ {}: {} metric(s) from {} sheet(s)",
            file, processed.metrics_found, processed.sheets_found
        );
        Ok(processed)
    }
}

/// Year -> value pairs for the row labelled `metric`, if any
pub fn extract_metric_row(grid: &SheetGrid, metric: &str) -> Option<(YearValues, LabelMatch)> {
    let labels = grid.labels();
    let (row_idx, how) = find_metric_row(&labels, metric)?;
    let row = &grid.body()[row_idx];
    let header = grid.header();

    let mut values = YearValues::new();
    for (col, cell) in row.iter().enumerate().skip(1) {
        let year = header.get(col).map(Cell::as_label).unwrap_or_default();
        if year.is_empty() {
            continue;
        }
        if let Some(value) = coerce_cell(cell) {
            values.insert(year, value);
        }
    }
    Some((values, how))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
