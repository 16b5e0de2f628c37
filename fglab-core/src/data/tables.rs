//! Schema-stable CSV tables: sentiment history and price history.
//!
//! These are the engine's file interfaces. Column order is part of the
//! contract consumers rely on:
//! - sentiment: `date, fg_score, fg_rating`
//! - prices:    `date, ticker, close, ret1, fwd1, fwd5, fwd20`
//!
//! The `fwd20` column is optional on read (older price tables carried
//! only fwd1/fwd5). A blank `fg_score` cell becomes NaN, which the
//! classifier maps to the unclassified sentinel.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::provider::DataError;
use crate::domain::{ReturnRecord, SentimentReading};

#[derive(Debug, Serialize, Deserialize)]
struct SentimentRow {
    date: NaiveDate,
    fg_score: Option<f64>,
    fg_rating: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct PriceRow {
    date: NaiveDate,
    ticker: String,
    close: f64,
    ret1: Option<f64>,
    fwd1: Option<f64>,
    fwd5: Option<f64>,
    #[serde(default)]
    fwd20: Option<f64>,
}

/// Read the sentiment history table.
pub fn read_sentiment_table(path: &Path) -> Result<Vec<SentimentReading>, DataError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for row in reader.deserialize::<SentimentRow>() {
        let row = row?;
        out.push(SentimentReading {
            date: row.date,
            score: row.fg_score.unwrap_or(f64::NAN),
            rating: row.fg_rating,
        });
    }
    Ok(out)
}

/// Write the sentiment history table.
pub fn write_sentiment_table(
    path: &Path,
    readings: &[SentimentReading],
) -> Result<(), DataError> {
    let mut writer = csv::Writer::from_path(path)?;
    for r in readings {
        writer.serialize(SentimentRow {
            date: r.date,
            fg_score: if r.score.is_nan() { None } else { Some(r.score) },
            fg_rating: r.rating.clone(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Read the per-ticker price history table.
pub fn read_price_table(path: &Path) -> Result<Vec<ReturnRecord>, DataError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for row in reader.deserialize::<PriceRow>() {
        let row = row?;
        let fwd = [(1, row.fwd1), (5, row.fwd5), (20, row.fwd20)]
            .into_iter()
            .filter_map(|(h, v)| v.map(|v| (h, v)))
            .collect();
        out.push(ReturnRecord {
            date: row.date,
            ticker: row.ticker,
            close: row.close,
            ret1: row.ret1,
            fwd,
        });
    }
    Ok(out)
}

/// Write the per-ticker price history table.
pub fn write_price_table(path: &Path, records: &[ReturnRecord]) -> Result<(), DataError> {
    let mut writer = csv::Writer::from_path(path)?;
    for r in records {
        writer.serialize(PriceRow {
            date: r.date,
            ticker: r.ticker.clone(),
            close: r.close,
            ret1: r.ret1,
            fwd1: r.forward(1),
            fwd5: r.forward(5),
            fwd20: r.forward(20),
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn sentiment_rows_parse_blank_score_as_nan() {
        let csv_data = "date,fg_score,fg_rating\n2024-01-02,61.5,greed\n2024-01-03,,\n";
        let mut reader = csv::Reader::from_reader(csv_data.as_bytes());
        let rows: Vec<SentimentRow> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows[0].fg_score, Some(61.5));
        assert_eq!(rows[1].fg_score, None);
    }

    #[test]
    fn price_rows_tolerate_missing_fwd20_column() {
        let csv_data = "date,ticker,close,ret1,fwd1,fwd5\n\
                        2024-01-02,SPY,470.5,0.002,0.01,0.03\n";
        let mut reader = csv::Reader::from_reader(csv_data.as_bytes());
        let rows: Vec<PriceRow> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows[0].fwd1, Some(0.01));
        assert_eq!(rows[0].fwd20, None);
    }

    #[test]
    fn price_rows_parse_blank_forward_cells() {
        let csv_data = "date,ticker,close,ret1,fwd1,fwd5,fwd20\n\
                        2024-01-02,SPY,470.5,,0.01,,\n";
        let mut reader = csv::Reader::from_reader(csv_data.as_bytes());
        let rows: Vec<PriceRow> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows[0].ret1, None);
        assert_eq!(rows[0].fwd1, Some(0.01));
        assert_eq!(rows[0].fwd5, None);
    }

    #[test]
    fn price_row_roundtrip_preserves_horizon_map() {
        let rec = ReturnRecord {
            date: date("2024-01-02"),
            ticker: "SPY".into(),
            close: 470.5,
            ret1: Some(0.002),
            fwd: [(1, 0.01), (20, -0.02)].into_iter().collect(),
        };

        let mut writer = csv::Writer::from_writer(vec![]);
        writer
            .serialize(PriceRow {
                date: rec.date,
                ticker: rec.ticker.clone(),
                close: rec.close,
                ret1: rec.ret1,
                fwd1: rec.forward(1),
                fwd5: rec.forward(5),
                fwd20: rec.forward(20),
            })
            .unwrap();
        let data = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let row: PriceRow = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(row.fwd1, Some(0.01));
        assert_eq!(row.fwd5, None);
        assert_eq!(row.fwd20, Some(-0.02));
    }
}
