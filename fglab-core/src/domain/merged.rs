//! MergedRecord — the inner join of price features and sentiment on date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::sentiment::FgBucket;

/// One row of the merged price/sentiment table.
///
/// Only dates present in both input series produce a record; a date with
/// price but no sentiment (or vice versa) contributes no analytics.
/// Forward returns are absent for the final H bars of each ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub date: NaiveDate,
    pub ticker: String,
    pub close: f64,
    pub fg_score: f64,
    pub fg_rating: String,
    pub ret1: Option<f64>,
    pub fwd1: Option<f64>,
    pub fwd5: Option<f64>,
    pub fwd20: Option<f64>,
}

impl MergedRecord {
    /// Derived bucket; never stored independently of the score.
    pub fn bucket(&self) -> Option<FgBucket> {
        FgBucket::classify(self.fg_score)
    }

    /// Forward return for one of the standard horizons (1, 5, 20).
    pub fn forward(&self, h: usize) -> Option<f64> {
        match h {
            1 => self.fwd1,
            5 => self.fwd5,
            20 => self.fwd20,
            _ => None,
        }
    }
}

/// A merged record at which the bearish divergence pattern held: price made
/// a new rolling high while the sentiment rolling high strictly fell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergenceEvent {
    pub record: MergedRecord,
}
