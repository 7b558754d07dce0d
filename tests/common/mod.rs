//! Common test utilities and helpers


pub use provider::StubProvider;

/// Test data utilities
pub mod test_data {
    use portfolio_tools::models::{CompanyRef, StockRecord};
    use serde_json::json;
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Create a test stock record
    pub fn create_test_stock(ticker: &str, name: &str) -> StockRecord {
        StockRecord {
            ticker: ticker.to_string(),
            name: name.to_string(),
            sector: "Technology".to_string(),
            industry: "Semiconductors".to_string(),
            country: "Netherlands".to_string(),
            market_cap: Some(250_000_000_000),
            currency: "EUR".to_string(),
        }
    }

    pub fn create_company_refs() -> Vec<CompanyRef> {
        vec![
            CompanyRef::new("ASML Holding", "ASML.AS", "Semiconductors"),
            CompanyRef::new("Airbus", "AIR.PA", "Aerospace & Defense"),
        ]
    }

    /// Writes a markets file wrapped the way the stock manager ships it
    pub fn write_markets_file(dir: &Path) -> PathBuf {
        let path = dir.join("suffixe.json");
        let content = json!({
            "markets": {
                "États-Unis": "",
                "France": ".PA",
                "Pays-Bas": ".AS",
                "Finlande": ".HE"
            }
        });
        fs::write(&path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
        path
    }

    /// Writes the company reference list as a bare array using the French field names
    pub fn write_companies_file(dir: &Path) -> PathBuf {
        let path = dir.join("companies.json");
        let content = json!([
            {"nom": "ASML Holding", "ticker": "ASML.AS", "industrie": "Semiconductors"},
            {"nom": "Airbus", "ticker": "AIR.PA", "industrie": "Aerospace & Defense"}
        ]);
        fs::write(&path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
        path
    }
}

/// Logging utilities for tests
pub mod logging {
    use std::sync::Once;
    use tracing::{debug, info};

    static INIT: Once = Once::new();

    /// Initialize test logging
    pub fn init_test_logging() {
        INIT.call_once(|| {
            // Already initialized by test-log is fine
            let _ = tracing::subscriber::set_global_default(
                tracing_subscriber::fmt()
                    .with_env_filter("portfolio_tools=debug,test=debug")
                    .with_test_writer()
                    .finish(),
            );
        });
    }

    /// Log test step
    pub fn log_test_step(step: &str) {
        info!("🧪 Test Step: {}", step);
    }

    /// Log test data
    pub fn log_test_data<T: std::fmt::Debug>(label: &str, data: &T) {
        debug!("📊 {}: {:?}", label, data);
    }
}
