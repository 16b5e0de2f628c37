//! Bucketed aggregation of merged records and divergence events.
//!
//! All aggregates treat missing forward returns as absent, not zero:
//! a record with no `fwdH` is excluded from both the numerator and the
//! denominator of every `fwdH` statistic. Records whose score does not
//! classify (NaN) are excluded entirely and counted in a warning.

use serde::Serialize;

use fglab_core::domain::{DivergenceEvent, FgBucket, MergedRecord};

/// Per-bucket statistics over the whole universe.
#[derive(Debug, Clone, Serialize)]
pub struct BucketSummary {
    pub bucket: FgBucket,
    pub count: usize,
    pub avg_fwd1: Option<f64>,
    pub avg_fwd5: Option<f64>,
    pub avg_fwd20: Option<f64>,
    pub std_fwd20: Option<f64>,
    pub min_fwd20: Option<f64>,
    pub max_fwd20: Option<f64>,
}

/// Per-ticker, per-bucket statistics.
///
/// Carries the same distribution columns as `BucketSummary` plus the
/// per-ticker hit rate and median used by the best-per-bucket ranking.
#[derive(Debug, Clone, Serialize)]
pub struct TickerBucketSummary {
    pub ticker: String,
    pub bucket: FgBucket,
    pub count: usize,
    pub avg_fwd1: Option<f64>,
    pub med_fwd1: Option<f64>,
    pub hit_fwd1: Option<f64>,
    pub avg_fwd5: Option<f64>,
    pub avg_fwd20: Option<f64>,
    pub std_fwd20: Option<f64>,
    pub min_fwd20: Option<f64>,
    pub max_fwd20: Option<f64>,
}

/// Per-ticker outcome statistics conditional on a divergence event.
#[derive(Debug, Clone, Serialize)]
pub struct DivergenceSummary {
    pub ticker: String,
    pub count_divergences: usize,
    pub prob_down_fwd1: Option<f64>,
    pub prob_down_fwd5: Option<f64>,
    pub prob_down_fwd20: Option<f64>,
    pub avg_fwd1: Option<f64>,
    pub avg_fwd5: Option<f64>,
    pub avg_fwd20: Option<f64>,
    pub median_fwd20: Option<f64>,
    pub worst_fwd20: Option<f64>,
    pub best_fwd20: Option<f64>,
}

fn forwards(records: &[&MergedRecord], h: usize) -> Vec<f64> {
    records.iter().filter_map(|r| r.forward(h)).collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n - 1); needs at least two values.
fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Fraction of values strictly above zero.
fn hit_rate(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().filter(|&&v| v > 0.0).count() as f64 / values.len() as f64)
}

/// Fraction of values strictly below zero.
fn down_rate(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().filter(|&&v| v < 0.0).count() as f64 / values.len() as f64)
}

fn classified(records: &[MergedRecord]) -> Vec<(&MergedRecord, FgBucket)> {
    let mut unclassified = 0usize;
    let kept: Vec<_> = records
        .iter()
        .filter_map(|r| match r.bucket() {
            Some(bucket) => Some((r, bucket)),
            None => {
                unclassified += 1;
                None
            }
        })
        .collect();
    if unclassified > 0 {
        tracing::warn!(unclassified, "dropping rows with unclassifiable sentiment");
    }
    kept
}

/// Universe-wide statistics per bucket, one row per bucket in ascending
/// bucket order. Empty buckets are omitted.
pub fn bucket_summaries(records: &[MergedRecord]) -> Vec<BucketSummary> {
    let classified = classified(records);
    FgBucket::ALL
        .iter()
        .filter_map(|&bucket| {
            let rows: Vec<&MergedRecord> = classified
                .iter()
                .filter(|(_, b)| *b == bucket)
                .map(|(r, _)| *r)
                .collect();
            if rows.is_empty() {
                return None;
            }
            let fwd20 = forwards(&rows, 20);
            Some(BucketSummary {
                bucket,
                count: rows.len(),
                avg_fwd1: mean(&forwards(&rows, 1)),
                avg_fwd5: mean(&forwards(&rows, 5)),
                avg_fwd20: mean(&fwd20),
                std_fwd20: std_dev(&fwd20),
                min_fwd20: min(&fwd20),
                max_fwd20: max(&fwd20),
            })
        })
        .collect()
}

/// Per-ticker, per-bucket statistics, sorted by bucket ascending and
/// `avg_fwd1` descending within each bucket.
pub fn ticker_bucket_summaries(records: &[MergedRecord]) -> Vec<TickerBucketSummary> {
    let classified = classified(records);
    let mut tickers: Vec<String> = classified.iter().map(|(r, _)| r.ticker.clone()).collect();
    tickers.sort();
    tickers.dedup();

    let mut out = Vec::new();
    for bucket in FgBucket::ALL {
        for ticker in &tickers {
            let rows: Vec<&MergedRecord> = classified
                .iter()
                .filter(|(r, b)| *b == bucket && r.ticker == *ticker)
                .map(|(r, _)| *r)
                .collect();
            if rows.is_empty() {
                continue;
            }
            let fwd1 = forwards(&rows, 1);
            let fwd20 = forwards(&rows, 20);
            out.push(TickerBucketSummary {
                ticker: ticker.clone(),
                bucket,
                count: rows.len(),
                avg_fwd1: mean(&fwd1),
                med_fwd1: median(&fwd1),
                hit_fwd1: hit_rate(&fwd1),
                avg_fwd5: mean(&forwards(&rows, 5)),
                avg_fwd20: mean(&fwd20),
                std_fwd20: std_dev(&fwd20),
                min_fwd20: min(&fwd20),
                max_fwd20: max(&fwd20),
            });
        }
    }

    out.sort_by(|a, b| {
        a.bucket.cmp(&b.bucket).then(
            b.avg_fwd1
                .unwrap_or(f64::NEG_INFINITY)
                .partial_cmp(&a.avg_fwd1.unwrap_or(f64::NEG_INFINITY))
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });
    out
}

/// The best ticker (by `avg_fwd1`) in each non-empty bucket.
pub fn best_per_bucket(summaries: &[TickerBucketSummary]) -> Vec<TickerBucketSummary> {
    FgBucket::ALL
        .iter()
        .filter_map(|&bucket| {
            summaries
                .iter()
                .filter(|s| s.bucket == bucket)
                .max_by(|a, b| {
                    a.avg_fwd1
                        .unwrap_or(f64::NEG_INFINITY)
                        .partial_cmp(&b.avg_fwd1.unwrap_or(f64::NEG_INFINITY))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .cloned()
        })
        .collect()
}

/// One summary row per ticker in the given universe order, including a
/// zero-count row for tickers with no events.
pub fn divergence_summaries(
    tickers: &[String],
    events: &[DivergenceEvent],
) -> Vec<DivergenceSummary> {
    tickers
        .iter()
        .map(|ticker| {
            let rows: Vec<&MergedRecord> = events
                .iter()
                .filter(|e| e.record.ticker == *ticker)
                .map(|e| &e.record)
                .collect();
            let fwd1 = forwards(&rows, 1);
            let fwd5 = forwards(&rows, 5);
            let fwd20 = forwards(&rows, 20);
            DivergenceSummary {
                ticker: ticker.clone(),
                count_divergences: rows.len(),
                prob_down_fwd1: down_rate(&fwd1),
                prob_down_fwd5: down_rate(&fwd5),
                prob_down_fwd20: down_rate(&fwd20),
                avg_fwd1: mean(&fwd1),
                avg_fwd5: mean(&fwd5),
                avg_fwd20: mean(&fwd20),
                median_fwd20: median(&fwd20),
                worst_fwd20: min(&fwd20),
                best_fwd20: max(&fwd20),
            }
        })
        .collect()
}
