//! Sentiment readings and the five-regime classifier.
//!
//! The bucket is always a pure function of the stored score, derived at
//! read time. It is never persisted without its originating score, so a
//! reclassification rule change cannot leave the two out of sync.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One fear & greed reading on a trading day.
///
/// `score` is in [0, 100]; a missing or unparseable source value is stored
/// as NaN and classifies to `None` (unclassified), never to a bucket.
/// `rating` is the label carried from the source table, kept for reference
/// alongside the derived bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    pub date: NaiveDate,
    pub score: f64,
    pub rating: String,
}

impl SentimentReading {
    pub fn bucket(&self) -> Option<FgBucket> {
        FgBucket::classify(self.score)
    }
}

/// The five ordered sentiment regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FgBucket {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl FgBucket {
    /// All buckets in ascending order.
    pub const ALL: [FgBucket; 5] = [
        FgBucket::ExtremeFear,
        FgBucket::Fear,
        FgBucket::Neutral,
        FgBucket::Greed,
        FgBucket::ExtremeGreed,
    ];

    /// Classify a score using half-open boundaries:
    /// `[0,25)` extreme fear, `[25,45)` fear, `[45,55)` neutral,
    /// `[55,75)` greed, `[75,100]` extreme greed.
    ///
    /// NaN yields `None`; downstream aggregation excludes such rows rather
    /// than bucketing them.
    pub fn classify(score: f64) -> Option<FgBucket> {
        if score.is_nan() {
            return None;
        }
        Some(if score < 25.0 {
            FgBucket::ExtremeFear
        } else if score < 45.0 {
            FgBucket::Fear
        } else if score < 55.0 {
            FgBucket::Neutral
        } else if score < 75.0 {
            FgBucket::Greed
        } else {
            FgBucket::ExtremeGreed
        })
    }

    /// The label used in CSV tables ("extreme fear", "fear", ...).
    pub fn label(&self) -> &'static str {
        match self {
            FgBucket::ExtremeFear => "extreme fear",
            FgBucket::Fear => "fear",
            FgBucket::Neutral => "neutral",
            FgBucket::Greed => "greed",
            FgBucket::ExtremeGreed => "extreme greed",
        }
    }
}

impl fmt::Display for FgBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
