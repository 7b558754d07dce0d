//! Interactive add-a-stock workflow.
//!
//! Reads answers line by line from any `BufRead` and writes prompts to any
//! `Write`, so the whole dialogue can be scripted in tests. Every prompt
//! accepts the quit tokens; end of input counts as quitting.

use std::io::{BufRead, Write};
use tracing::info;

use crate::api::{lookup_stock, StockInfoProvider};
use crate::errors::Result;
use crate::market::MarketResolver;
use crate::models::StockRecord;
use crate::store::{AddOutcome, StockStore};
use crate::utils::format_thousands;

pub const QUIT_COMMANDS: &[&str] = &["q", "quit", "exit", "quitter"];
pub const POSITIVE_RESPONSES: &[&str] = &["oui", "o", "yes", "y"];
pub const LIST_COMMAND: &str = "liste";

pub fn is_quit(answer: &str) -> bool {
    QUIT_COMMANDS.contains(&answer.trim().to_lowercase().as_str())
}

pub fn is_positive(answer: &str) -> bool {
    POSITIVE_RESPONSES.contains(&answer.trim().to_lowercase().as_str())
}

/// How one add-a-stock round ended
#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    Added(String),
    Skipped,
    Quit,
}

enum Choice {
    Picked(String),
    Invalid,
    Quit,
}

pub struct StockManagerCli<'a, R, W> {
    store: &'a StockStore,
    markets: &'a MarketResolver,
    provider: &'a dyn StockInfoProvider,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> StockManagerCli<'a, R, W> {
    pub fn new(
        store: &'a StockStore,
        markets: &'a MarketResolver,
        provider: &'a dyn StockInfoProvider,
        input: R,
        output: W,
    ) -> Self {
        Self {
            store,
            markets,
            provider,
            input,
            output,
        }
    }

    /// Runs rounds until the user quits or declines to continue; returns the number of stocks added
    pub async fn run(&mut self) -> Result<usize> {
        writeln!(self.output, "{}", "=".repeat(50))?;
        writeln!(self.output, "📊 STOCK MANAGER")?;
        writeln!(self.output, "{}", "=".repeat(50))?;
        writeln!(self.output, "Type 'q' or 'quit' at any prompt to leave\n")?;

        let mut added = 0;
        loop {
            match self.add_stock_round().await? {
                RoundOutcome::Quit => break,
                RoundOutcome::Added(_) => added += 1,
                RoundOutcome::Skipped => {}
            }

            match self.prompt("\n➕ Add another stock? (yes/no): ")? {
                Some(answer) if is_positive(&answer) => continue,
                _ => {
                    writeln!(self.output, "\n✅ Done!")?;
                    break;
                }
            }
        }

        info!("Stock manager finished, {} stock(s) added", added);
        Ok(added)
    }

    pub async fn add_stock_round(&mut self) -> Result<RoundOutcome> {
        writeln!(self.output, "\n{}", "-".repeat(50))?;
        writeln!(self.output, "➕ ADD A STOCK")?;
        writeln!(self.output, "{}", "-".repeat(50))?;

        let Some(country) = self.select_country()? else {
            return Ok(RoundOutcome::Quit);
        };

        let Some(suffix) = self.markets.get_suffix(&country)? else {
            writeln!(self.output, "❌ No suffix configured for {}", country)?;
            return Ok(RoundOutcome::Skipped);
        };

        let Some(ticker) = self.prompt("Ticker: ")? else {
            return Ok(RoundOutcome::Quit);
        };
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            writeln!(self.output, "❌ The ticker cannot be empty")?;
            return Ok(RoundOutcome::Skipped);
        }
        // Suffixes come from a hand-edited file and may be lowercase
        let full_ticker = format!("{}{}", ticker, suffix).to_uppercase();

        if self.store.ticker_exists(&full_ticker)? {
            writeln!(self.output, "⚠️  {} is already in the store!", full_ticker)?;
            return Ok(RoundOutcome::Skipped);
        }

        let Some(record) = lookup_stock(self.provider, &full_ticker).await else {
            writeln!(self.output, "❌ {} not found or lookup failed", full_ticker)?;
            return Ok(RoundOutcome::Skipped);
        };

        self.display_stock_info(&record)?;

        match self.prompt("\n✓ Confirm? (yes/no): ")? {
            None => return Ok(RoundOutcome::Quit),
            Some(answer) if !is_positive(&answer) => {
                writeln!(self.output, "❌ Cancelled")?;
                return Ok(RoundOutcome::Skipped);
            }
            Some(_) => {}
        }

        match self.store.add_stock(record)? {
            AddOutcome::Added { ticker, total } => {
                writeln!(self.output, "✅ Stock {} added (total: {})", ticker, total)?;
                Ok(RoundOutcome::Added(ticker))
            }
            outcome @ AddOutcome::Duplicate { .. } => {
                writeln!(self.output, "❌ {}", outcome)?;
                Ok(RoundOutcome::Skipped)
            }
        }
    }

    /// Prints `message` and reads one answer; `None` on a quit token or end of input
    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let answer = line.trim().to_string();
        if is_quit(&answer) {
            return Ok(None);
        }
        Ok(Some(answer))
    }

    fn select_country(&mut self) -> Result<Option<String>> {
        loop {
            let Some(answer) = self.prompt(&format!("\nCountry (or '{}' to see all): ", LIST_COMMAND))? else {
                return Ok(None);
            };

            if answer.is_empty() {
                writeln!(self.output, "❌ Please enter a country")?;
                continue;
            }

            if answer.to_lowercase() == LIST_COMMAND {
                self.display_countries()?;
                continue;
            }

            let matches = self.markets.find_matching_countries(&answer)?;
            match matches.len() {
                0 => {
                    writeln!(self.output, "❌ No country found for '{}'", answer)?;
                    let suggestions = self.markets.suggest(&answer)?;
                    if !suggestions.is_empty() {
                        writeln!(self.output, "💡 Did you mean: {}?", suggestions.join(", "))?;
                    }
                    writeln!(self.output, "💡 Type '{}' to see every available country", LIST_COMMAND)?;
                }
                1 => {
                    writeln!(self.output, "✓ Selected country: {}", matches[0])?;
                    return Ok(Some(matches[0].clone()));
                }
                _ => match self.choose_from_list(&matches)? {
                    Choice::Picked(country) => {
                        writeln!(self.output, "✓ Selected country: {}", country)?;
                        return Ok(Some(country));
                    }
                    Choice::Invalid => writeln!(self.output, "❌ Invalid choice")?,
                    Choice::Quit => return Ok(None),
                },
            }
        }
    }

    fn choose_from_list(&mut self, options: &[String]) -> Result<Choice> {
        writeln!(self.output, "\n🔍 Several countries match:")?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}. {}", i + 1, option)?;
        }

        let Some(answer) = self.prompt("Choice (number or full name): ")? else {
            return Ok(Choice::Quit);
        };

        if let Ok(number) = answer.parse::<usize>() {
            if (1..=options.len()).contains(&number) {
                return Ok(Choice::Picked(options[number - 1].clone()));
            }
        }

        Ok(options
            .iter()
            .find(|option| **option == answer)
            .map(|option| Choice::Picked(option.clone()))
            .unwrap_or(Choice::Invalid))
    }

    fn display_countries(&mut self) -> Result<()> {
        writeln!(self.output, "\n📋 Available countries:")?;
        for (i, (country, suffix)) in self.markets.countries()?.iter().enumerate() {
            let suffix = if suffix.is_empty() { "none" } else { suffix.as_str() };
            writeln!(self.output, "  {:2}. {:20} (suffix: {})", i + 1, country, suffix)?;
        }
        writeln!(self.output)?;
        Ok(())
    }

    fn display_stock_info(&mut self, record: &StockRecord) -> Result<()> {
        let rule = "=".repeat(50);
        writeln!(self.output, "\n{}", rule)?;
        writeln!(self.output, "📈 STOCK INFORMATION")?;
        writeln!(self.output, "{}", rule)?;
        writeln!(self.output, "Ticker:     {}", record.ticker)?;
        writeln!(self.output, "Name:       {}", record.name)?;
        writeln!(self.output, "Sector:     {}", record.sector)?;
        writeln!(self.output, "Industry:   {}", record.industry)?;
        writeln!(self.output, "Country:    {}", record.country)?;
        if let Some(cap) = record.market_cap {
            writeln!(self.output, "Market cap: {} {}", format_thousands(cap), record.currency)?;
        }
        writeln!(self.output, "{}", rule)?;
        Ok(())
    }
}
