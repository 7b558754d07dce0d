//! Country -> ticker suffix resolution.
//!
//! The suffix map is read from a JSON file the first time it is needed and
//! cached for the lifetime of the resolver.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use indexmap::IndexMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, error};

use crate::errors::{PortfolioError, Result};

/// Country display name -> ticker suffix (empty for the home market)
pub type MarketSuffixMap = IndexMap<String, String>;

const MAX_SUGGESTIONS: usize = 3;

pub struct MarketResolver {
    config_file: PathBuf,
    markets: OnceLock<MarketSuffixMap>,
}

impl MarketResolver {
    pub fn new(config_file: impl AsRef<Path>) -> Self {
        Self {
            config_file: config_file.as_ref().to_path_buf(),
            markets: OnceLock::new(),
        }
    }

    /// Builds a resolver around an already loaded map
    pub fn from_map(markets: MarketSuffixMap) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(markets);
        Self {
            config_file: PathBuf::new(),
            markets: cell,
        }
    }

    /// Loads (once) and returns the suffix map
    pub fn markets(&self) -> Result<&MarketSuffixMap> {
        if let Some(markets) = self.markets.get() {
            return Ok(markets);
        }
        let loaded = load_markets(&self.config_file)?;
        Ok(self.markets.get_or_init(|| loaded))
    }

    /// Countries whose name contains `fragment`, case-insensitively.
    ///
    /// A blank fragment matches nothing. No match is an empty list, not an error.
    pub fn find_matching_countries(&self, fragment: &str) -> Result<Vec<String>> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .markets()?
            .keys()
            .filter(|country| country.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    pub fn get_suffix(&self, country: &str) -> Result<Option<String>> {
        Ok(self.markets()?.get(country).cloned())
    }

    /// All countries with their suffix, sorted by country name
    pub fn countries(&self) -> Result<Vec<(String, String)>> {
        let mut all: Vec<(String, String)> = self
            .markets()?
            .iter()
            .map(|(country, suffix)| (country.clone(), suffix.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(all)
    }

    /// Closest country names by fuzzy score, used when the substring search is empty
    pub fn suggest(&self, fragment: &str) -> Result<Vec<String>> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Ok(Vec::new());
        }

        let matcher = SkimMatcherV2::default().ignore_case();
        let mut scored: Vec<(i64, &String)> = self
            .markets()?
            .keys()
            .filter_map(|country| matcher.fuzzy_match(country, fragment).map(|score| (score, country)))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

        Ok(scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, country)| country.clone())
            .collect())
    }
}

/// Reads the market configuration.
///
/// Accepts a flat `{country: suffix}` object or the same object wrapped in
/// a `markets` key. Non-string suffixes are rejected.
pub fn load_markets(path: &Path) -> Result<MarketSuffixMap> {
    if !path.exists() {
        error!("Market configuration not found: {}", path.display());
        return Err(PortfolioError::ConfigMissing {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path)?;
    let root: Value = serde_json::from_str(&content).map_err(|e| {
        error!("Failed to parse market configuration {}: {}", path.display(), e);
        PortfolioError::malformed(path.display().to_string(), e)
    })?;

    let object = match root.get("markets") {
        Some(inner) => inner,
        None => &root,
    }
    .as_object()
    .ok_or_else(|| PortfolioError::malformed(path.display().to_string(), "expected a JSON object"))?;

    let mut markets = MarketSuffixMap::new();
    for (country, suffix) in object {
        let suffix = suffix.as_str().ok_or_else(|| {
            PortfolioError::malformed(
                path.display().to_string(),
                format!("suffix for '{}' is not a string", country),
            )
        })?;
        markets.insert(country.clone(), suffix.to_string());
    }

    debug!("Loaded {} markets from {}", markets.len(), path.display());
    Ok(markets)
}
