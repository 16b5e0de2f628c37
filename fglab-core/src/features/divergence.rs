//! Bearish divergence detection.
//!
//! A divergence fires at bar t when the W-bar rolling high of price
//! strictly rose versus t-1 while the W-bar rolling high of sentiment
//! strictly fell. Both rolling highs must be defined at t and t-1, so
//! the earliest possible event is at index W (0-based) of a ticker's
//! merged series.

use crate::domain::{DivergenceEvent, MergedRecord};

use super::rolling::rolling_max;

/// Scan one ticker's chronologically sorted merged series for bearish
/// divergence events.
///
/// The caller must not mix tickers in `records`; rolling windows never
/// span a ticker boundary.
pub fn detect_divergences(records: &[MergedRecord], window: usize) -> Vec<DivergenceEvent> {
    if window == 0 || records.len() <= window {
        return Vec::new();
    }

    let closes: Vec<f64> = records.iter().map(|r| r.close).collect();
    let scores: Vec<f64> = records.iter().map(|r| r.fg_score).collect();
    let price_high = rolling_max(&closes, window);
    let fg_high = rolling_max(&scores, window);

    let mut events = Vec::new();
    for t in 1..records.len() {
        let defined = !price_high[t].is_nan()
            && !price_high[t - 1].is_nan()
            && !fg_high[t].is_nan()
            && !fg_high[t - 1].is_nan();
        if defined && price_high[t] > price_high[t - 1] && fg_high[t] < fg_high[t - 1] {
            events.push(DivergenceEvent {
                record: records[t].clone(),
            });
        }
    }
    events
}
