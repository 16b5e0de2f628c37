//! Trailing and forward return features.
//!
//! All computation is strictly per ticker over a chronologically sorted
//! bar slice; horizons never cross a ticker boundary. `fwdH` is absent
//! for the final H bars of a series, which is expected and not an error.

use std::collections::BTreeMap;

use crate::data::DataError;
use crate::domain::{PriceBar, ReturnRecord};

/// The horizons the standard output tables carry.
pub const DEFAULT_HORIZONS: [usize; 3] = [1, 5, 20];

/// Derive `ret1` and `fwdH` for one ticker's sorted bar sequence.
///
/// `ret1[t] = close[t]/close[t-1] - 1` (absent at t = 0).
/// `fwdH[t] = close[t+H]/close[t] - 1` (absent for the last H bars).
///
/// The normalizer guarantees positive closes; if that invariant is
/// violated this fails with `InvalidPrice` rather than silently
/// propagating an infinity.
pub fn compute_returns(
    bars: &[PriceBar],
    horizons: &[usize],
) -> Result<Vec<ReturnRecord>, DataError> {
    for bar in bars {
        if !bar.is_valid() {
            return Err(DataError::InvalidPrice {
                ticker: bar.ticker.clone(),
                date: bar.date,
                close: bar.close,
            });
        }
    }

    let n = bars.len();
    let mut out = Vec::with_capacity(n);

    for (t, bar) in bars.iter().enumerate() {
        let ret1 = (t > 0).then(|| bar.close / bars[t - 1].close - 1.0);

        let mut fwd = BTreeMap::new();
        for &h in horizons {
            if h == 0 {
                continue;
            }
            if let Some(future) = bars.get(t + h) {
                fwd.insert(h, future.close / bar.close - 1.0);
            }
        }

        out.push(ReturnRecord {
            date: bar.date,
            ticker: bar.ticker.clone(),
            close: bar.close,
            ret1,
            fwd,
        });
    }

    Ok(out)
}

/// Group bars by ticker, preserving each ticker's chronological order.
pub fn group_by_ticker(bars: Vec<PriceBar>) -> BTreeMap<String, Vec<PriceBar>> {
    let mut grouped: BTreeMap<String, Vec<PriceBar>> = BTreeMap::new();
    for bar in bars {
        grouped.entry(bar.ticker.clone()).or_default().push(bar);
    }
    grouped
}
