//! PriceBar and ReturnRecord, the per-ticker daily data units.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily closing price for a single ticker.
///
/// After normalization there is at most one bar per (ticker, date), closes
/// are strictly positive, and dates strictly increase within a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub ticker: String,
    pub close: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, ticker: impl Into<String>, close: f64) -> Self {
        Self {
            date,
            ticker: ticker.into(),
            close,
        }
    }

    /// Returns true if the close satisfies the price invariant.
    pub fn is_valid(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// A price bar enriched with trailing and forward returns.
///
/// `ret1` is absent on the first bar of a ticker's series. `fwd` holds one
/// entry per configured horizon H and is absent for the final H bars; that
/// is expected, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnRecord {
    pub date: NaiveDate,
    pub ticker: String,
    pub close: f64,
    pub ret1: Option<f64>,
    pub fwd: BTreeMap<usize, f64>,
}

impl ReturnRecord {
    /// Forward return over horizon `h`, if bar t+h existed.
    pub fn forward(&self, h: usize) -> Option<f64> {
        self.fwd.get(&h).copied()
    }
}
