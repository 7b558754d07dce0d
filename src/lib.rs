pub mod api;
pub mod cli;
pub mod errors;
pub mod extractor;
pub mod fair_value;
pub mod market;
pub mod models;
pub mod refresh;
pub mod report;
pub mod store;
pub mod utils;

pub use errors::{PortfolioError, Result};
