//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over daily-close sources (Alpha
//! Vantage, Yahoo Finance) so the fallback orchestrator can try them in
//! order and tests can inject fakes. Each attempt reports a uniform
//! outcome: bars, a recoverable rate limit, or a hard error that aborts
//! the provider and falls through to the next one.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::PriceBar;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("symbol not found: {ticker}")]
    SymbolNotFound { ticker: String },

    #[error("malformed payload from {provider}: {detail}")]
    MalformedPayload { provider: String, detail: String },

    #[error("all configured providers exhausted for {ticker}")]
    SourceUnavailable { ticker: String },

    #[error("invalid close {close} for {ticker} on {date}")]
    InvalidPrice {
        ticker: String,
        date: NaiveDate,
        close: f64,
    },

    #[error("table I/O error: {0}")]
    Table(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a single fetch attempt against one provider.
///
/// `RateLimited` is recoverable: the caller sleeps a bounded backoff and
/// retries once. `HardError` aborts this provider immediately.
#[derive(Debug)]
pub enum FetchOutcome {
    Bars(Vec<PriceBar>),
    RateLimited,
    HardError(DataError),
}

/// A source of daily close series for a ticker.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily closes for a ticker over a date range.
    ///
    /// Providers do not reliably honor the bounds server-side; the caller
    /// truncates to `[start, end]` after normalization.
    fn fetch(&self, ticker: &str, start: NaiveDate, end: Option<NaiveDate>) -> FetchOutcome;
}

/// Progress callback for multi-ticker fetches.
pub trait FetchProgress: Send {
    /// Called when starting to fetch a ticker.
    fn on_start(&self, ticker: &str, index: usize, total: usize);

    /// Called when a ticker fetch completes.
    fn on_complete(&self, ticker: &str, index: usize, total: usize, result: &Result<usize, DataError>);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    fn on_start(&self, ticker: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {ticker}...", index + 1, total);
    }

    fn on_complete(
        &self,
        ticker: &str,
        _index: usize,
        _total: usize,
        result: &Result<usize, DataError>,
    ) {
        match result {
            Ok(n) => println!("  OK: {ticker} ({n} bars)"),
            Err(e) => println!("  FAIL: {ticker}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nFetch complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}
