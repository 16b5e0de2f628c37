//! CNN fear & greed history ingestion.
//!
//! The feed is a JSON document whose `fear_and_greed_historical.data`
//! array holds `{x: epoch_millis, y: score}` points. Timestamps are
//! converted to US-Eastern calendar dates and weekend readings are
//! shifted to the preceding Friday (Saturday minus one day, Sunday minus
//! two). When a shift collides two readings onto the same Friday the
//! first reading in feed order is kept.
//!
//! Eastern conversion uses a fixed UTC-5 offset; the feed emits daily
//! points well away from midnight, where the DST hour cannot move the
//! calendar date.

use std::time::Duration;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;

use super::provider::DataError;
use crate::domain::{FgBucket, SentimentReading};

pub const FEAR_GREED_URL: &str =
    "https://production.dataviz.cnn.io/index/fearandgreed/graphdata";

#[derive(Debug, Deserialize)]
struct GraphData {
    fear_and_greed_historical: Historical,
}

#[derive(Debug, Deserialize)]
struct Historical {
    data: Vec<Point>,
}

#[derive(Debug, Deserialize)]
pub struct Point {
    /// Epoch milliseconds (the feed emits these as floats).
    pub x: f64,
    /// Sentiment score in [0, 100].
    pub y: f64,
}

/// Fetch and rebuild the full sentiment history from the CNN feed.
pub fn fetch_history() -> Result<Vec<SentimentReading>, DataError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(20))
        .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 13_0_0)")
        .build()
        .expect("failed to build HTTP client");

    let resp = client
        .get(FEAR_GREED_URL)
        .header("Accept", "application/json")
        .send()
        .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(DataError::MalformedPayload {
            provider: "fear_greed".into(),
            detail: format!("HTTP {status}"),
        });
    }

    let graph: GraphData = resp.json().map_err(|e| DataError::MalformedPayload {
        provider: "fear_greed".into(),
        detail: format!("failed to parse feed: {e}"),
    })?;

    Ok(build_history(&graph.fear_and_greed_historical.data))
}

/// Convert raw feed points into a clean trading-day history:
/// weekend-shifted dates, one reading per date (first wins), sorted
/// ascending, rating labels derived from the score.
pub fn build_history(points: &[Point]) -> Vec<SentimentReading> {
    let mut by_date = std::collections::BTreeMap::new();
    for point in points {
        let date = market_date(point.x as i64);
        by_date.entry(date).or_insert(point.y);
    }

    by_date
        .into_iter()
        .filter(|(date, _)| date.weekday().number_from_monday() <= 5)
        .map(|(date, score)| SentimentReading {
            date,
            score,
            rating: FgBucket::classify(score).map(|b| b.label().to_string()).unwrap_or_default(),
        })
        .collect()
}

/// Map an epoch-millisecond timestamp to its US market date, shifting
/// weekend readings back to the preceding Friday.
fn market_date(epoch_ms: i64) -> NaiveDate {
    let utc = chrono::DateTime::from_timestamp(epoch_ms / 1000, 0)
        .unwrap_or_else(|| chrono::DateTime::from_timestamp(0, 0).unwrap());
    let eastern = utc - chrono::Duration::hours(5);
    let date = eastern.date_naive();
    match date.weekday() {
        Weekday::Sat => date - chrono::Duration::days(1),
        Weekday::Sun => date - chrono::Duration::days(2),
        _ => date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    // 2024-01-02 (Tue), 2024-01-06 (Sat), 2024-01-07 (Sun), noon UTC.
    const TUE_MS: f64 = 1_704_196_800_000.0;
    const SAT_MS: f64 = 1_704_542_400_000.0;
    const SUN_MS: f64 = 1_704_628_800_000.0;

    #[test]
    fn weekday_maps_to_itself() {
        assert_eq!(market_date(TUE_MS as i64), date("2024-01-02"));
    }

    #[test]
    fn saturday_shifts_back_one_day() {
        assert_eq!(market_date(SAT_MS as i64), date("2024-01-05"));
    }

    #[test]
    fn sunday_shifts_back_two_days() {
        assert_eq!(market_date(SUN_MS as i64), date("2024-01-05"));
    }

    #[test]
    fn collision_keeps_first_reading() {
        // Friday reading arrives first; the shifted Saturday reading for
        // the same market date must not overwrite it.
        let friday_ms = 1_704_456_000_000.0; // 2024-01-05 noon UTC
        let points = vec![
            Point { x: friday_ms, y: 40.0 },
            Point { x: SAT_MS, y: 55.0 },
        ];
        let history = build_history(&points);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].date, date("2024-01-05"));
        assert_eq!(history[0].score, 40.0);
    }

    #[test]
    fn history_is_sorted_and_rated() {
        let points = vec![
            Point { x: SAT_MS, y: 80.0 },
            Point { x: TUE_MS, y: 20.0 },
        ];
        let history = build_history(&points);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, date("2024-01-02"));
        assert_eq!(history[0].rating, "extreme fear");
        assert_eq!(history[1].date, date("2024-01-05"));
        assert_eq!(history[1].rating, "extreme greed");
    }

    #[test]
    fn nan_score_gets_empty_rating() {
        let points = vec![Point { x: TUE_MS, y: f64::NAN }];
        let history = build_history(&points);
        assert_eq!(history[0].rating, "");
    }

    #[test]
    fn feed_payload_parses() {
        let json = r#"{"fear_and_greed_historical": {"data": [
            {"x": 1704196800000.0, "y": 61.5}
        ]}}"#;
        let graph: GraphData = serde_json::from_str(json).unwrap();
        let history = build_history(&graph.fear_and_greed_historical.data);
        assert_eq!(history[0].score, 61.5);
        assert_eq!(history[0].rating, "greed");
    }
}
