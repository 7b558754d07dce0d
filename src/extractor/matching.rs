//! Name heuristics: workbook file -> company, category -> sheet, metric -> row.

use std::path::Path;

use super::categories::SheetCategory;
use crate::models::CompanyRef;

/// Filename decorations removed before matching a workbook to a company
pub const STRIPPED_SUFFIXES: &[&str] = &["_financials", "_data", "_metrics", "-financials", "-data"];

/// How a metric label was found in the first column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMatch {
    Exact,
    Normalized,
    Partial,
}

/// Candidate company name for a workbook: stem without the known suffixes, trimmed
pub fn candidate_company_name(file_name: &str) -> String {
    let mut stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());

    for suffix in STRIPPED_SUFFIXES {
        if stem.contains(suffix) {
            stem = stem.replace(suffix, "");
        }
    }
    stem.trim().to_string()
}

/// First reference whose name contains the candidate, or is contained in it (case-insensitive)
pub fn find_company<'a>(candidate: &str, companies: &'a [CompanyRef]) -> Option<&'a CompanyRef> {
    let candidate = candidate.trim().to_lowercase();
    if candidate.is_empty() {
        return None;
    }

    companies.iter().find(|company| {
        let name = company.name.trim().to_lowercase();
        !name.is_empty() && (name.contains(&candidate) || candidate.contains(&name))
    })
}

/// Lowercase and keep only `[a-z0-9/]`; the slash separates "Valeur entreprise" from "Valeur entreprise / EBITDA"
pub fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '/')
        .collect()
}

/// First alias of the category present in the workbook (trimmed, case-insensitive)
pub fn resolve_sheet<'a>(category: SheetCategory, sheet_names: &'a [String]) -> Option<&'a str> {
    category.aliases().iter().find_map(|alias| {
        let alias = alias.to_lowercase();
        sheet_names
            .iter()
            .find(|name| name.trim().to_lowercase() == alias)
            .map(String::as_str)
    })
}

/// Row index of `metric` in the label column.
///
/// Exact match wins over a normalized match, which wins over a
/// case-insensitive containment; within a tier the first row wins.
pub fn find_metric_row(labels: &[String], metric: &str) -> Option<(usize, LabelMatch)> {
    if let Some(idx) = labels.iter().position(|label| label.trim() == metric) {
        return Some((idx, LabelMatch::Exact));
    }

    let wanted = normalize_label(metric);
    if !wanted.is_empty() {
        if let Some(idx) = labels.iter().position(|label| normalize_label(label) == wanted) {
            return Some((idx, LabelMatch::Normalized));
        }
    }

    let wanted = metric.to_lowercase();
    labels
        .iter()
        .position(|label| label.to_lowercase().contains(&wanted))
        .map(|idx| (idx, LabelMatch::Partial))
}
