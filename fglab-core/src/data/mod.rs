//! Data layer: providers, fallback orchestration, normalization, tables.

pub mod alpha_vantage;
pub mod fear_greed;
pub mod fetch;
pub mod normalize;
pub mod pacer;
pub mod provider;
pub mod tables;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageProvider;
pub use fetch::{fetch_ticker, fetch_universe, FetchSummary};
pub use normalize::normalize_series;
pub use pacer::CallPacer;
pub use provider::{DataError, FetchOutcome, FetchProgress, PriceProvider, StdoutProgress};
pub use tables::{
    read_price_table, read_sentiment_table, write_price_table, write_sentiment_table,
};
pub use yahoo::YahooProvider;
