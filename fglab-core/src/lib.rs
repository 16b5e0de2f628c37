//! fglab Core — domain types, data providers, and feature derivation.
//!
//! This crate contains everything upstream of aggregation:
//! - Domain types (price bars, sentiment readings, merged records)
//! - Price providers with ordered fallback and call pacing
//! - CNN fear & greed history ingestion
//! - Series normalization and schema-stable CSV tables
//! - Return features, rolling highs, divergence detection
//! - The date-keyed inner join of prices and sentiment

pub mod data;
pub mod domain;
pub mod features;
pub mod merge;

pub use data::{DataError, FetchOutcome, PriceProvider};
pub use domain::{DivergenceEvent, FgBucket, MergedRecord, PriceBar, ReturnRecord, SentimentReading};
pub use features::{compute_returns, detect_divergences, DEFAULT_HORIZONS};
pub use merge::merge_records;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything crossing the rayon boundary in the
    /// runner is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::ReturnRecord>();
        require_sync::<domain::ReturnRecord>();
        require_send::<domain::SentimentReading>();
        require_sync::<domain::SentimentReading>();
        require_send::<domain::MergedRecord>();
        require_sync::<domain::MergedRecord>();
        require_send::<domain::DivergenceEvent>();
        require_sync::<domain::DivergenceEvent>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();
    }
}
