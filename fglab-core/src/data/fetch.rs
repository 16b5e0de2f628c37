//! Multi-provider fetch orchestration.
//!
//! Providers are tried in configured order. A rate-limited attempt earns
//! one bounded-backoff retry against the same provider; a hard error
//! moves on to the next provider immediately. Only after every provider
//! has been exhausted does a ticker fail with `SourceUnavailable`, and
//! the batch loop treats that as fatal for the ticker but not the run.

use chrono::NaiveDate;

use super::normalize::normalize_series;
use super::pacer::CallPacer;
use super::provider::{DataError, FetchOutcome, FetchProgress, PriceProvider};
use crate::domain::PriceBar;

/// Fetch and normalize one ticker's close series.
///
/// The pacer serializes live calls across tickers and providers; the
/// caller may parallelize everything downstream of the fetch, but calls
/// into the same rate-budgeted provider must stay ordered.
pub fn fetch_ticker(
    providers: &[&dyn PriceProvider],
    pacer: &CallPacer,
    ticker: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Result<Vec<PriceBar>, DataError> {
    for provider in providers {
        pacer.pace();
        match provider.fetch(ticker, start, end) {
            FetchOutcome::Bars(bars) => return normalize_series(bars, start, end),
            FetchOutcome::RateLimited => {
                let backoff = pacer.backoff();
                tracing::warn!(
                    ticker,
                    provider = provider.name(),
                    backoff_secs = backoff.as_secs_f64(),
                    "rate limited, retrying once after backoff"
                );
                std::thread::sleep(backoff);
                pacer.pace();
                match provider.fetch(ticker, start, end) {
                    FetchOutcome::Bars(bars) => return normalize_series(bars, start, end),
                    FetchOutcome::RateLimited => {
                        tracing::warn!(
                            ticker,
                            provider = provider.name(),
                            "still rate limited after retry, trying next provider"
                        );
                    }
                    FetchOutcome::HardError(e) => {
                        tracing::warn!(ticker, provider = provider.name(), error = %e,
                            "provider failed, trying next provider");
                    }
                }
            }
            FetchOutcome::HardError(e) => {
                tracing::warn!(ticker, provider = provider.name(), error = %e,
                    "provider failed, trying next provider");
            }
        }
    }

    Err(DataError::SourceUnavailable {
        ticker: ticker.to_string(),
    })
}

/// Summary of a multi-ticker fetch.
#[derive(Debug)]
pub struct FetchSummary {
    pub bars: Vec<PriceBar>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(String, DataError)>,
}

impl FetchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Fetch every ticker in the universe, skipping tickers whose providers
/// are all exhausted and continuing with the rest.
pub fn fetch_universe(
    providers: &[&dyn PriceProvider],
    pacer: &CallPacer,
    tickers: &[String],
    start: NaiveDate,
    end: Option<NaiveDate>,
    progress: &dyn FetchProgress,
) -> FetchSummary {
    let total = tickers.len();
    let mut bars = Vec::new();
    let mut succeeded = 0;
    let mut failed = 0;
    let mut errors: Vec<(String, DataError)> = Vec::new();

    for (i, ticker) in tickers.iter().enumerate() {
        progress.on_start(ticker, i, total);

        let result = fetch_ticker(providers, pacer, ticker, start, end);
        let report = result.as_ref().map(|b| b.len()).map_err(clone_error);
        progress.on_complete(ticker, i, total, &report);

        match result {
            Ok(series) => {
                bars.extend(series);
                succeeded += 1;
            }
            Err(e) => {
                errors.push((ticker.clone(), e));
                failed += 1;
            }
        }
    }

    progress.on_batch_complete(succeeded, failed, total);

    FetchSummary {
        bars,
        total,
        succeeded,
        failed,
        errors,
    }
}

// DataError is not Clone (it wraps I/O errors); progress callbacks get a
// structural copy good enough for display.
fn clone_error(e: &DataError) -> DataError {
    match e {
        DataError::NetworkUnreachable(s) => DataError::NetworkUnreachable(s.clone()),
        DataError::SymbolNotFound { ticker } => DataError::SymbolNotFound {
            ticker: ticker.clone(),
        },
        DataError::MalformedPayload { provider, detail } => DataError::MalformedPayload {
            provider: provider.clone(),
            detail: detail.clone(),
        },
        DataError::SourceUnavailable { ticker } => DataError::SourceUnavailable {
            ticker: ticker.clone(),
        },
        DataError::InvalidPrice {
            ticker,
            date,
            close,
        } => DataError::InvalidPrice {
            ticker: ticker.clone(),
            date: *date,
            close: *close,
        },
        other => DataError::NetworkUnreachable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct QueueProvider {
        name: &'static str,
        outcomes: Mutex<Vec<FetchOutcome>>,
        calls: Mutex<usize>,
    }

    impl QueueProvider {
        fn new(name: &'static str, outcomes: Vec<FetchOutcome>) -> Self {
            Self {
                name,
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl PriceProvider for QueueProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn fetch(&self, ticker: &str, _start: NaiveDate, _end: Option<NaiveDate>) -> FetchOutcome {
            *self.calls.lock().unwrap() += 1;
            let mut queue = self.outcomes.lock().unwrap();
            if queue.is_empty() {
                FetchOutcome::HardError(DataError::SymbolNotFound {
                    ticker: ticker.to_string(),
                })
            } else {
                queue.remove(0)
            }
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_bars() -> Vec<PriceBar> {
        vec![
            PriceBar::new(date("2024-01-02"), "SPY", 100.0),
            PriceBar::new(date("2024-01-03"), "SPY", 101.0),
        ]
    }

    #[test]
    fn rate_limit_then_success_stays_on_primary() {
        let primary = QueueProvider::new(
            "primary",
            vec![FetchOutcome::RateLimited, FetchOutcome::Bars(sample_bars())],
        );
        let secondary = QueueProvider::new("secondary", vec![]);
        let pacer = CallPacer::unthrottled();

        let bars = fetch_ticker(
            &[&primary, &secondary],
            &pacer,
            "SPY",
            date("2024-01-01"),
            None,
        )
        .unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(primary.call_count(), 2);
        assert_eq!(secondary.call_count(), 0);
    }

    #[test]
    fn hard_error_falls_through_to_secondary() {
        let primary = QueueProvider::new(
            "primary",
            vec![FetchOutcome::HardError(DataError::SymbolNotFound {
                ticker: "SPY".into(),
            })],
        );
        let secondary = QueueProvider::new("secondary", vec![FetchOutcome::Bars(sample_bars())]);
        let pacer = CallPacer::unthrottled();

        let bars = fetch_ticker(
            &[&primary, &secondary],
            &pacer,
            "SPY",
            date("2024-01-01"),
            None,
        )
        .unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(primary.call_count(), 1);
        assert_eq!(secondary.call_count(), 1);
    }

    #[test]
    fn persistent_rate_limit_moves_on_after_one_retry() {
        let primary = QueueProvider::new(
            "primary",
            vec![FetchOutcome::RateLimited, FetchOutcome::RateLimited],
        );
        let secondary = QueueProvider::new("secondary", vec![FetchOutcome::Bars(sample_bars())]);
        let pacer = CallPacer::unthrottled();

        let bars = fetch_ticker(
            &[&primary, &secondary],
            &pacer,
            "SPY",
            date("2024-01-01"),
            None,
        )
        .unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(primary.call_count(), 2);
        assert_eq!(secondary.call_count(), 1);
    }

    #[test]
    fn all_exhausted_is_source_unavailable() {
        let primary = QueueProvider::new("primary", vec![]);
        let pacer = CallPacer::unthrottled();

        let err = fetch_ticker(&[&primary], &pacer, "SPY", date("2024-01-01"), None).unwrap_err();
        assert!(matches!(err, DataError::SourceUnavailable { ticker } if ticker == "SPY"));
    }

    #[test]
    fn universe_skips_failed_ticker_and_continues() {
        let provider = QueueProvider::new(
            "primary",
            vec![
                FetchOutcome::HardError(DataError::SymbolNotFound {
                    ticker: "BAD".into(),
                }),
                FetchOutcome::Bars(sample_bars()),
            ],
        );
        let pacer = CallPacer::unthrottled();

        struct SilentProgress;
        impl FetchProgress for SilentProgress {
            fn on_start(&self, _: &str, _: usize, _: usize) {}
            fn on_complete(&self, _: &str, _: usize, _: usize, _: &Result<usize, DataError>) {}
            fn on_batch_complete(&self, _: usize, _: usize, _: usize) {}
        }

        let summary = fetch_universe(
            &[&provider],
            &pacer,
            &["BAD".to_string(), "SPY".to_string()],
            date("2024-01-01"),
            None,
            &SilentProgress,
        );

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.bars.len(), 2);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].0, "BAD");
        assert!(!summary.all_succeeded());
    }
}
