//! End-to-end analysis pipeline: join, detect, aggregate.
//!
//! The fetch stage is upstream of this module; the pipeline consumes
//! already-built return records and sentiment history, which makes it a
//! pure function of its inputs and lets the whole thing run under test
//! without a network.

use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use fglab_core::data::{read_price_table, read_sentiment_table, DataError};
use fglab_core::domain::{DivergenceEvent, MergedRecord, PriceBar, ReturnRecord, SentimentReading};
use fglab_core::features::{compute_returns, detect_divergences, group_by_ticker};
use fglab_core::merge::merge_records;

use crate::aggregate::{
    best_per_bucket, bucket_summaries, divergence_summaries, ticker_bucket_summaries,
    BucketSummary, DivergenceSummary, TickerBucketSummary,
};
use crate::correlation::{correlation_summaries, CorrelationSummary};

/// Bumped whenever the artifact bundle layout or any CSV schema changes.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// One side of the date join contributed no usable rows.
    #[error("nothing to join: no rows on the {side} side")]
    MissingJoinKey { side: &'static str },

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Everything one analysis run produces, prior to export.
#[derive(Debug, Serialize)]
pub struct AnalysisResult {
    pub tickers: Vec<String>,
    pub window: usize,
    pub merged: Vec<MergedRecord>,
    pub events: Vec<DivergenceEvent>,
    pub bucket_summary: Vec<BucketSummary>,
    pub ticker_bucket_summary: Vec<TickerBucketSummary>,
    pub best_per_bucket: Vec<TickerBucketSummary>,
    pub correlations: Vec<CorrelationSummary>,
    pub divergence_summary: Vec<DivergenceSummary>,
    /// Content hash of the merged table, for artifact provenance.
    pub dataset_hash: String,
}

/// Build per-ticker return records from a mixed bar collection.
pub fn build_price_table(
    bars: Vec<PriceBar>,
    horizons: &[usize],
) -> Result<Vec<ReturnRecord>, DataError> {
    let mut records = Vec::new();
    for (_, series) in group_by_ticker(bars) {
        records.extend(compute_returns(&series, horizons)?);
    }
    Ok(records)
}

/// Run the full analysis over prepared inputs.
///
/// Divergence detection runs per ticker in parallel; everything else is
/// cheap enough to stay sequential. Output ordering is deterministic
/// regardless of thread scheduling.
pub fn run_analysis(
    returns: &[ReturnRecord],
    sentiment: &[SentimentReading],
    window: usize,
) -> Result<AnalysisResult, PipelineError> {
    if returns.is_empty() {
        return Err(PipelineError::MissingJoinKey { side: "price" });
    }
    if sentiment.is_empty() {
        return Err(PipelineError::MissingJoinKey { side: "sentiment" });
    }

    let merged = merge_records(returns, sentiment);
    if merged.is_empty() {
        return Err(PipelineError::MissingJoinKey { side: "joined" });
    }

    let mut tickers: Vec<String> = merged.iter().map(|r| r.ticker.clone()).collect();
    tickers.sort();
    tickers.dedup();

    // merged is sorted by (ticker, date), so per-ticker slices are
    // contiguous and each one is a valid chronological series.
    let mut events: Vec<DivergenceEvent> = tickers
        .par_iter()
        .flat_map(|ticker| {
            let series: Vec<MergedRecord> = merged
                .iter()
                .filter(|r| r.ticker == *ticker)
                .cloned()
                .collect();
            detect_divergences(&series, window)
        })
        .collect();
    events.sort_by(|a, b| {
        a.record
            .ticker
            .cmp(&b.record.ticker)
            .then(a.record.date.cmp(&b.record.date))
    });

    let ticker_bucket_summary = ticker_bucket_summaries(&merged);
    let best = best_per_bucket(&ticker_bucket_summary);

    Ok(AnalysisResult {
        bucket_summary: bucket_summaries(&merged),
        best_per_bucket: best,
        correlations: correlation_summaries(&merged),
        divergence_summary: divergence_summaries(&tickers, &events),
        dataset_hash: dataset_hash(&merged),
        ticker_bucket_summary,
        events,
        merged,
        window,
        tickers,
    })
}

/// Run the analysis from cached CSV tables on disk.
pub fn run_from_files(
    price_table: &Path,
    sentiment_table: &Path,
    window: usize,
) -> Result<AnalysisResult, PipelineError> {
    let returns = read_price_table(price_table)?;
    let sentiment = read_sentiment_table(sentiment_table)?;
    run_analysis(&returns, &sentiment, window)
}

fn dataset_hash(merged: &[MergedRecord]) -> String {
    match serde_json::to_vec(merged) {
        Ok(bytes) => blake3::hash(&bytes).to_hex().to_string(),
        Err(_) => String::new(),
    }
}
