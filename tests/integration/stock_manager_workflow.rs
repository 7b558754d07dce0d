//! Scripted sessions of the interactive stock manager

use pretty_assertions::assert_eq;
use std::io::Cursor;
use tempfile::tempdir;

use crate::common::{logging, test_data, StubProvider};
use portfolio_tools::cli::{RoundOutcome, StockManagerCli};
use portfolio_tools::market::MarketResolver;
use portfolio_tools::store::StockStore;

#[tokio::test]
async fn test_session_adds_two_stocks_and_rejects_duplicate() {
    logging::init_test_logging();
    logging::log_test_step("Scripted stock manager session");

    let dir = tempdir().unwrap();
    let markets = MarketResolver::new(test_data::write_markets_file(dir.path()));
    let store = StockStore::new(dir.path().join("name_action.json")).unwrap();
    let provider = StubProvider::new()
        .with_stock(test_data::create_test_stock("ASML.AS", "ASML Holding"))
        .with_stock(test_data::create_test_stock("AIR.PA", "Airbus"));

    let script = [
        "liste",   // show every country
        "pays",    // Pays-Bas
        "asml",
        "yes",
        "o",       // another
        "France",
        "air",
        "oui",
        "y",
        "pays-bas",
        "ASML",    // already stored, no lookup
        "non",
    ]
    .join("\n");

    let mut output = Vec::new();
    let added = StockManagerCli::new(&store, &markets, &provider, Cursor::new(script), &mut output)
        .run()
        .await
        .unwrap();

    assert_eq!(added, 2);
    assert_eq!(provider.calls(), 2);

    let tickers: Vec<String> = store.load_stocks().unwrap().into_iter().map(|s| s.ticker).collect();
    assert_eq!(tickers, vec!["ASML.AS", "AIR.PA"]);

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("Available countries"));
    assert!(text.contains("(suffix: none)"));
    assert!(text.contains("ASML.AS is already in the store"));
}

#[tokio::test]
async fn test_lookup_failure_does_not_touch_store() {
    let dir = tempdir().unwrap();
    let markets = MarketResolver::new(test_data::write_markets_file(dir.path()));
    let store = StockStore::new(dir.path().join("name_action.json")).unwrap();
    let provider = StubProvider::new().failing_on("NOKIA.HE");

    let mut cli = StockManagerCli::new(
        &store,
        &markets,
        &provider,
        Cursor::new("finlande\nnokia\n"),
        Vec::new(),
    );

    assert_eq!(cli.add_stock_round().await.unwrap(), RoundOutcome::Skipped);
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_quit_at_confirmation_prompt() {
    let dir = tempdir().unwrap();
    let markets = MarketResolver::new(test_data::write_markets_file(dir.path()));
    let store = StockStore::new(dir.path().join("name_action.json")).unwrap();
    let provider = StubProvider::new().with_stock(test_data::create_test_stock("AIR.PA", "Airbus"));

    let mut output = Vec::new();
    let added = StockManagerCli::new(
        &store,
        &markets,
        &provider,
        Cursor::new("france\nair\nQUITTER\n"),
        &mut output,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(added, 0);
    assert!(store.load_stocks().unwrap().is_empty());
}
