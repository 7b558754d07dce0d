use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::{CompanyRef, MetricValue, QuoteSnapshot, YearValues};
use crate::errors::{PortfolioError, Result};

/// Everything extracted for one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyMetrics {
    pub name: String,
    pub ticker: String,
    pub industry: String,
    #[serde(default)]
    pub metrics: IndexMap<String, YearValues>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<QuoteSnapshot>,
}

impl CompanyMetrics {
    pub fn new(company: &CompanyRef) -> Self {
        Self {
            name: company.name.clone(),
            ticker: company.ticker.clone(),
            industry: company.industry.clone(),
            metrics: IndexMap::new(),
            sources: Vec::new(),
            current: None,
        }
    }

    /// Number of metrics with at least one value
    pub fn filled_metric_count(&self) -> usize {
        self.metrics.values().filter(|years| !years.is_empty()).count()
    }

    pub fn has_ticker(&self) -> bool {
        !self.ticker.trim().is_empty() && self.ticker != super::NOT_AVAILABLE
    }

    /// Numeric value of a metric for one year
    pub fn value(&self, metric: &str, year: &str) -> Option<f64> {
        self.metrics.get(metric)?.get(year)?.as_f64()
    }

    /// Numeric values of a metric keyed by integer year, ascending
    pub fn yearly_series(&self, metric: &str) -> Vec<(i32, f64)> {
        let mut series: Vec<(i32, f64)> = self
            .metrics
            .get(metric)
            .map(|years| {
                years
                    .iter()
                    .filter_map(|(year, value)| Some((parse_year(year)?, value.as_f64()?)))
                    .collect()
            })
            .unwrap_or_default();
        series.sort_by_key(|(year, _)| *year);
        series
    }

    /// Value shown in the flat exports: the greatest integer year with a value,
    /// falling back to the last column when no header looks like a year.
    pub fn latest_value(&self, metric: &str) -> Option<&MetricValue> {
        let years = self.metrics.get(metric)?;
        years
            .iter()
            .filter_map(|(year, value)| parse_year(year).map(|y| (y, value)))
            .max_by_key(|(year, _)| *year)
            .map(|(_, value)| value)
            .or_else(|| years.last().map(|(_, value)| value))
    }
}

/// Parses year headers such as "2024", "2024.0" or " 2024 "
pub fn parse_year(header: &str) -> Option<i32> {
    let trimmed = header.trim();
    let trimmed = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    trimmed.parse::<i32>().ok()
}

/// company name -> metric label -> year -> value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricTable {
    companies: IndexMap<String, CompanyMetrics>,
}

impl MetricTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a table previously written by the report writer
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PortfolioError::ConfigMissing {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        let table: MetricTable = serde_json::from_str(&content)
            .map_err(|e| PortfolioError::malformed(path.display().to_string(), e))?;
        info!("Loaded {} companies from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    pub fn get(&self, company: &str) -> Option<&CompanyMetrics> {
        self.companies.get(company)
    }

    pub fn get_mut(&mut self, company: &str) -> Option<&mut CompanyMetrics> {
        self.companies.get_mut(company)
    }

    pub fn companies(&self) -> impl Iterator<Item = &CompanyMetrics> {
        self.companies.values()
    }

    pub fn companies_mut(&mut self) -> impl Iterator<Item = &mut CompanyMetrics> {
        self.companies.values_mut()
    }

    /// Metric labels across all companies, first-seen order
    pub fn metric_labels(&self) -> Vec<String> {
        let mut labels: IndexMap<&str, ()> = IndexMap::new();
        for company in self.companies.values() {
            for label in company.metrics.keys() {
                labels.entry(label.as_str()).or_insert(());
            }
        }
        labels.keys().map(|label| label.to_string()).collect()
    }

    /// Returns the entry for a company, creating it on first sight
    pub fn company_entry(&mut self, company: &CompanyRef) -> &mut CompanyMetrics {
        self.companies
            .entry(company.name.clone())
            .or_insert_with(|| CompanyMetrics::new(company))
    }

    /// Merges one metric row into the table.
    ///
    /// A cell that is already filled is replaced by the newer value (last file
    /// wins); a warning is logged when the two values differ. Returns the number
    /// of cells that were overwritten with a different value.
    pub fn merge_metric(
        &mut self,
        company: &CompanyRef,
        metric: &str,
        values: YearValues,
        source: &str,
    ) -> usize {
        let entry = self.company_entry(company);
        if !source.is_empty() && !entry.sources.iter().any(|s| s == source) {
            entry.sources.push(source.to_string());
        }

        let cells = entry.metrics.entry(metric.to_string()).or_default();
        let mut overwritten = 0;
        for (year, value) in values {
            match cells.get(&year) {
                Some(previous) if *previous != value => {
                    warn!(
                        "⚠️  {} / {} / {}: {} replaced by {} from {}",
                        company.name, metric, year, previous, value, source
                    );
                    overwritten += 1;
                }
                _ => {}
            }
            cells.insert(year, value);
        }
        overwritten
    }

    /// Merges another table into this one with the same last-write-wins rule
    pub fn merge_table(&mut self, other: MetricTable) -> usize {
        let mut overwritten = 0;
        for (_, company) in other.companies {
            let reference = CompanyRef::new(&company.name, &company.ticker, &company.industry);
            let entry = self.company_entry(&reference);
            for source in &company.sources {
                if !entry.sources.contains(source) {
                    entry.sources.push(source.clone());
                }
            }
            let source = company.sources.last().cloned().unwrap_or_default();
            for (metric, values) in company.metrics {
                overwritten += self.merge_metric(&reference, &metric, values, &source);
            }
            if company.current.is_some() {
                self.company_entry(&reference).current = company.current;
            }
        }
        overwritten
    }
}
