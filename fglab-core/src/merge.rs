//! Inner join of price features and sentiment history on calendar date.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{MergedRecord, ReturnRecord, SentimentReading};

/// Join per-ticker return records with the sentiment history.
///
/// The join is an inner join on date: rows without a counterpart on the
/// other side are dropped silently, since the two calendars legitimately
/// differ (market holidays, feed gaps). Duplicate sentiment dates keep
/// the first reading. Output is sorted by ticker, then date.
pub fn merge_records(
    returns: &[ReturnRecord],
    sentiment: &[SentimentReading],
) -> Vec<MergedRecord> {
    let mut by_date: BTreeMap<NaiveDate, &SentimentReading> = BTreeMap::new();
    for reading in sentiment {
        by_date.entry(reading.date).or_insert(reading);
    }

    let mut merged: Vec<MergedRecord> = returns
        .iter()
        .filter_map(|rec| {
            by_date.get(&rec.date).map(|reading| MergedRecord {
                date: rec.date,
                ticker: rec.ticker.clone(),
                close: rec.close,
                fg_score: reading.score,
                fg_rating: reading.rating.clone(),
                ret1: rec.ret1,
                fwd1: rec.forward(1),
                fwd5: rec.forward(5),
                fwd20: rec.forward(20),
            })
        })
        .collect();

    merged.sort_by(|a, b| a.ticker.cmp(&b.ticker).then(a.date.cmp(&b.date)));
    merged
}
