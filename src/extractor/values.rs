//! Cell value coercion.
//!
//! Spreadsheets pasted from market-data sites mix real numbers with
//! formatted text such as "12,5 %", "3,2 Md", "450 M" or "18,4x". Anything
//! that cannot be read as a number is kept as text.

use super::workbook::Cell;
use crate::models::MetricValue;

const BILLION: f64 = 1_000_000_000.0;
const MILLION: f64 = 1_000_000.0;

/// Placeholders that mean "no value"
const EMPTY_MARKERS: &[&str] = &["-", "--", "—", "n/a", "nan"];

pub fn coerce_cell(cell: &Cell) -> Option<MetricValue> {
    match cell {
        Cell::Empty => None,
        Cell::Number(n) => Some(MetricValue::Number(*n)),
        Cell::Text(text) => coerce_text(text),
    }
}

pub fn coerce_text(raw: &str) -> Option<MetricValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || EMPTY_MARKERS.contains(&trimmed.to_lowercase().as_str()) {
        return None;
    }

    let compact: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            ',' => '.',
            '−' => '-',
            other => other,
        })
        .collect();

    let parsed = if let Some(number) = compact.strip_suffix('%') {
        parse_number(number)
    } else if let Some(number) = compact.strip_suffix("Md") {
        parse_number(number).map(|n| n * BILLION)
    } else if let Some(number) = compact.strip_suffix('M') {
        parse_number(number).map(|n| n * MILLION)
    } else if let Some(number) = compact.strip_suffix(['x', 'X']) {
        parse_number(number)
    } else {
        parse_number(&compact)
    };

    Some(match parsed {
        Some(n) => MetricValue::Number(n),
        None => MetricValue::Text(trimmed.to_string()),
    })
}

fn parse_number(text: &str) -> Option<f64> {
    let value: f64 = text.parse().ok()?;
    value.is_finite().then_some(value)
}
