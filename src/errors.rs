use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the portfolio library.
///
/// Binaries wrap these in `anyhow` at the top level; the library keeps the
/// distinction between a missing configuration (fatal), malformed data
/// (skipped by the caller) and a failed lookup (reported, user retries).
#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("configuration file missing: {}", path.display())]
    ConfigMissing { path: PathBuf },

    #[error("malformed data in {context}: {reason}")]
    DataMalformed { context: String, reason: String },

    #[error("lookup failed for {ticker}: {reason}")]
    Lookup { ticker: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("workbook error in {}: {reason}", path.display())]
    Workbook { path: PathBuf, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel export error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),
}

impl PortfolioError {
    pub fn malformed(context: impl Into<String>, reason: impl ToString) -> Self {
        PortfolioError::DataMalformed {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    pub fn lookup(ticker: impl Into<String>, reason: impl ToString) -> Self {
        PortfolioError::Lookup {
            ticker: ticker.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PortfolioError>;
