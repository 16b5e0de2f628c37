//! Domain types: price bars, return records, sentiment readings, merged rows.

pub mod bar;
pub mod merged;
pub mod sentiment;

pub use bar::{PriceBar, ReturnRecord};
pub use merged::{DivergenceEvent, MergedRecord};
pub use sentiment::{FgBucket, SentimentReading};
