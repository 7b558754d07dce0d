//! Market resolver against a real configuration file

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use test_log::test;

use crate::common::{logging, test_data};
use portfolio_tools::market::MarketResolver;
use portfolio_tools::PortfolioError;

#[test]
fn test_wrapped_markets_file_is_loaded_lazily() {
    logging::init_test_logging();
    let dir = tempdir().unwrap();
    let path = test_data::write_markets_file(dir.path());
    let resolver = MarketResolver::new(&path);

    // Deleting the file after the first load proves the map is cached
    assert_eq!(resolver.get_suffix("France").unwrap(), Some(".PA".to_string()));
    std::fs::remove_file(&path).unwrap();

    assert_eq!(resolver.get_suffix("États-Unis").unwrap(), Some(String::new()));
    assert_eq!(resolver.countries().unwrap().len(), 4);
}

#[test]
fn test_fragment_matching() {
    let dir = tempdir().unwrap();
    let resolver = MarketResolver::new(test_data::write_markets_file(dir.path()));

    assert_eq!(resolver.find_matching_countries("FRAN").unwrap(), vec!["France"]);
    let mut ambiguous = resolver.find_matching_countries("f").unwrap();
    ambiguous.sort();
    assert_eq!(ambiguous, vec!["Finlande", "France"]);
    assert!(resolver.find_matching_countries("   ").unwrap().is_empty());
    assert!(resolver.find_matching_countries("zz").unwrap().is_empty());
}

#[test]
fn test_missing_markets_file_is_config_missing() {
    let dir = tempdir().unwrap();
    let resolver = MarketResolver::new(dir.path().join("absent.json"));

    assert_matches!(
        resolver.find_matching_countries("France"),
        Err(PortfolioError::ConfigMissing { .. })
    );
}

#[test]
fn test_non_string_suffix_is_malformed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("suffixe.json");
    std::fs::write(&path, r#"{"France": 33}"#).unwrap();

    assert_matches!(
        MarketResolver::new(&path).markets(),
        Err(PortfolioError::DataMalformed { .. })
    );
}
