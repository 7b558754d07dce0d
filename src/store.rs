//! Flat JSON store of stock records, keyed by ticker.
//!
//! The file layout is `{"stocks": [StockRecord, ...]}`. Every operation
//! re-reads the file so the store never works on a stale copy.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::errors::{PortfolioError, Result};
use crate::models::StockRecord;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StockFile {
    #[serde(default)]
    stocks: Vec<StockRecord>,
}

/// Result of an append attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added { ticker: String, total: usize },
    Duplicate { ticker: String },
}

impl std::fmt::Display for AddOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddOutcome::Added { ticker, total } => write!(f, "Stock {} added (total: {})", ticker, total),
            AddOutcome::Duplicate { ticker } => write!(f, "Stock {} is already in the store", ticker),
        }
    }
}

pub struct StockStore {
    path: PathBuf,
}

impl StockStore {
    /// Opens the store, creating the parent directory if needed
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
                debug!("Store directory ready: {}", parent.display());
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all records. A missing file is an empty store; a corrupt file is an error.
    pub fn load_stocks(&self) -> Result<Vec<StockRecord>> {
        if !self.path.exists() {
            info!("No store at {} yet, starting empty", self.path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let file: StockFile = serde_json::from_str(&content).map_err(|e| {
            error!("Failed to read store {}: {}", self.path.display(), e);
            PortfolioError::malformed(self.path.display().to_string(), e)
        })?;
        Ok(file.stocks)
    }

    /// Writes the full record list, replacing the file
    pub fn save_stocks(&self, stocks: &[StockRecord]) -> Result<()> {
        let file = StockFile {
            stocks: stocks.to_vec(),
        };
        let content = serde_json::to_string_pretty(&file)?;

        // Sibling temp file, then rename over the store
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;

        info!("Store saved ({} stocks)", stocks.len());
        Ok(())
    }

    pub fn ticker_exists(&self, ticker: &str) -> Result<bool> {
        Ok(self.load_stocks()?.iter().any(|s| s.ticker == ticker))
    }

    /// Appends a record unless its ticker is already present; a duplicate leaves the file untouched
    pub fn add_stock(&self, record: StockRecord) -> Result<AddOutcome> {
        let mut stocks = self.load_stocks()?;

        if stocks.iter().any(|s| s.ticker == record.ticker) {
            return Ok(AddOutcome::Duplicate {
                ticker: record.ticker,
            });
        }

        let ticker = record.ticker.clone();
        stocks.push(record);
        self.save_stocks(&stocks)?;

        Ok(AddOutcome::Added {
            ticker,
            total: stocks.len(),
        })
    }
}
