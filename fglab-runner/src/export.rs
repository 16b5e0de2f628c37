//! CSV artifact generation and the run manifest.
//!
//! Every run produces a timestamped bundle directory containing the
//! merged table, the aggregate tables, and a `manifest.json` that pins
//! the schema version, parameters, and dataset hash. Unknown schema
//! versions are rejected on load.
//!
//! Column order in each CSV is part of the external contract; blank
//! cells mean "not defined", never zero.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::pipeline::{AnalysisResult, SCHEMA_VERSION};

fn cell(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.6}")).unwrap_or_default()
}

// ─── CSV tables ─────────────────────────────────────────────────────

/// Columns: date, ticker, close, fg_score, fg_rating, fg_bucket, ret1,
/// fwd1, fwd5, fwd20. The bucket is derived from the score at write
/// time, never stored upstream.
pub fn merged_csv(result: &AnalysisResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date", "ticker", "close", "fg_score", "fg_rating", "fg_bucket", "ret1", "fwd1", "fwd5",
        "fwd20",
    ])?;
    for r in &result.merged {
        let score = if r.fg_score.is_nan() {
            String::new()
        } else {
            format!("{:.2}", r.fg_score)
        };
        wtr.write_record([
            &r.date.to_string(),
            &r.ticker,
            &format!("{:.6}", r.close),
            &score,
            &r.fg_rating,
            &r.bucket().map(|b| b.label().to_string()).unwrap_or_default(),
            &cell(r.ret1),
            &cell(r.fwd1),
            &cell(r.fwd5),
            &cell(r.fwd20),
        ])?;
    }
    finish(wtr)
}

pub fn bucket_summary_csv(result: &AnalysisResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "fg_bucket", "count", "avg_fwd1", "avg_fwd5", "avg_fwd20", "std_fwd20", "min_fwd20",
        "max_fwd20",
    ])?;
    for s in &result.bucket_summary {
        wtr.write_record([
            s.bucket.label(),
            &s.count.to_string(),
            &cell(s.avg_fwd1),
            &cell(s.avg_fwd5),
            &cell(s.avg_fwd20),
            &cell(s.std_fwd20),
            &cell(s.min_fwd20),
            &cell(s.max_fwd20),
        ])?;
    }
    finish(wtr)
}

/// Same distribution columns as the bucket summary, keyed additionally
/// by ticker.
pub fn ticker_bucket_summary_csv(result: &AnalysisResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "ticker", "fg_bucket", "count", "avg_fwd1", "avg_fwd5", "avg_fwd20", "std_fwd20",
        "min_fwd20", "max_fwd20",
    ])?;
    for s in &result.ticker_bucket_summary {
        wtr.write_record([
            s.ticker.as_str(),
            s.bucket.label(),
            &s.count.to_string(),
            &cell(s.avg_fwd1),
            &cell(s.avg_fwd5),
            &cell(s.avg_fwd20),
            &cell(s.std_fwd20),
            &cell(s.min_fwd20),
            &cell(s.max_fwd20),
        ])?;
    }
    finish(wtr)
}

/// The winning ticker per bucket, with the ranking statistics.
pub fn best_per_bucket_csv(result: &AnalysisResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "fg_bucket", "ticker", "count", "avg_fwd1", "med_fwd1", "hit_fwd1", "avg_fwd5",
        "avg_fwd20",
    ])?;
    for s in &result.best_per_bucket {
        wtr.write_record([
            s.bucket.label(),
            s.ticker.as_str(),
            &s.count.to_string(),
            &cell(s.avg_fwd1),
            &cell(s.med_fwd1),
            &cell(s.hit_fwd1),
            &cell(s.avg_fwd5),
            &cell(s.avg_fwd20),
        ])?;
    }
    finish(wtr)
}

pub fn correlation_csv(result: &AnalysisResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["metric", "value"])?;
    for s in &result.correlations {
        wtr.write_record([s.metric, &cell(s.value)])?;
    }
    finish(wtr)
}

/// The merged rows at which the divergence pattern held, one per event:
/// the full merged-row schema with `is_divergence` appended.
pub fn divergence_events_csv(result: &AnalysisResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date", "ticker", "close", "fg_score", "fg_rating", "fg_bucket", "ret1", "fwd1", "fwd5",
        "fwd20", "is_divergence",
    ])?;
    for e in &result.events {
        let r = &e.record;
        let score = if r.fg_score.is_nan() {
            String::new()
        } else {
            format!("{:.2}", r.fg_score)
        };
        wtr.write_record([
            &r.date.to_string(),
            &r.ticker,
            &format!("{:.6}", r.close),
            &score,
            &r.fg_rating,
            &r.bucket().map(|b| b.label().to_string()).unwrap_or_default(),
            &cell(r.ret1),
            &cell(r.fwd1),
            &cell(r.fwd5),
            &cell(r.fwd20),
            "true",
        ])?;
    }
    finish(wtr)
}

pub fn divergence_summary_csv(result: &AnalysisResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "ticker",
        "count_divergences",
        "prob_down_fwd1",
        "prob_down_fwd5",
        "prob_down_fwd20",
        "avg_fwd1",
        "avg_fwd5",
        "avg_fwd20",
        "median_fwd20",
        "worst_fwd20",
        "best_fwd20",
    ])?;
    for s in &result.divergence_summary {
        wtr.write_record([
            s.ticker.as_str(),
            &s.count_divergences.to_string(),
            &cell(s.prob_down_fwd1),
            &cell(s.prob_down_fwd5),
            &cell(s.prob_down_fwd20),
            &cell(s.avg_fwd1),
            &cell(s.avg_fwd5),
            &cell(s.avg_fwd20),
            &cell(s.median_fwd20),
            &cell(s.worst_fwd20),
            &cell(s.best_fwd20),
        ])?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Provenance record written alongside the CSV tables.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub created_at: String,
    pub tickers: Vec<String>,
    pub divergence_window: usize,
    pub merged_rows: usize,
    pub divergence_events: usize,
    pub dataset_hash: String,
}

impl RunManifest {
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            created_at: chrono::Local::now().to_rfc3339(),
            tickers: result.tickers.clone(),
            divergence_window: result.window,
            merged_rows: result.merged.len(),
            divergence_events: result.events.len(),
            dataset_hash: result.dataset_hash.clone(),
        }
    }
}

/// Save the full artifact set for one analysis run.
///
/// Creates `run_{timestamp}/` under `output_dir` containing
/// `manifest.json` and the seven CSV tables. Returns the created path.
pub fn save_artifacts(result: &AnalysisResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!("run_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let manifest = serde_json::to_string_pretty(&RunManifest::from_result(result))
        .context("failed to serialize run manifest")?;
    std::fs::write(run_dir.join("manifest.json"), manifest)?;

    let tables: [(&str, String); 7] = [
        ("merged_fg_prices.csv", merged_csv(result)?),
        ("bucket_summary.csv", bucket_summary_csv(result)?),
        ("ticker_bucket_summary.csv", ticker_bucket_summary_csv(result)?),
        ("best_per_bucket.csv", best_per_bucket_csv(result)?),
        ("correlation_summary.csv", correlation_csv(result)?),
        ("divergence_events.csv", divergence_events_csv(result)?),
        ("divergence_summary.csv", divergence_summary_csv(result)?),
    ];
    for (name, data) in tables {
        std::fs::write(run_dir.join(name), data)
            .with_context(|| format!("failed to write {name}"))?;
    }

    Ok(run_dir)
}

/// Load a bundle's manifest, rejecting unknown schema versions.
pub fn load_manifest(dir: &Path) -> Result<RunManifest> {
    let path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let manifest: RunManifest =
        serde_json::from_str(&json).context("failed to parse run manifest")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{build_price_table, run_analysis};
    use chrono::NaiveDate;
    use fglab_core::domain::{PriceBar, SentimentReading};

    fn sample_result() -> AnalysisResult {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars: Vec<PriceBar> = [100.0, 101.0, 99.0, 105.0, 110.0]
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::new(base + chrono::Duration::days(i as i64), "SPY", c))
            .collect();
        let returns = build_price_table(bars, &[1, 5, 20]).unwrap();
        let sentiment: Vec<SentimentReading> = [80.0, 78.0, 75.0, 70.0, 65.0]
            .iter()
            .enumerate()
            .map(|(i, &score)| SentimentReading {
                date: base + chrono::Duration::days(i as i64),
                score,
                rating: String::new(),
            })
            .collect();
        run_analysis(&returns, &sentiment, 3).unwrap()
    }

    #[test]
    fn merged_csv_has_contract_header_and_blank_missing_cells() {
        let csv_text = merged_csv(&sample_result()).unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,ticker,close,fg_score,fg_rating,fg_bucket,ret1,fwd1,fwd5,fwd20"
        );
        // First row: ret1 undefined, fwd5/fwd20 undefined in a 5-bar series.
        let first = lines.next().unwrap();
        assert!(first.starts_with("2024-01-01,SPY,"));
        assert!(first.ends_with("0.010000,,"));
        assert!(first.contains("extreme greed"));
    }

    #[test]
    fn divergence_events_carry_the_merged_schema_plus_flag() {
        let result = sample_result();
        let csv_text = divergence_events_csv(&result).unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,ticker,close,fg_score,fg_rating,fg_bucket,ret1,fwd1,fwd5,fwd20,is_divergence"
        );
        let rows: Vec<&str> = lines.collect();
        assert_eq!(rows.len(), result.events.len());
        assert!(rows.iter().all(|r| r.ends_with(",true")));
        // The first event is 2024-01-04 (score 70, greed, ret1 defined).
        assert!(rows[0].starts_with("2024-01-04,SPY,105.000000,70.00,,greed,"));
    }

    #[test]
    fn bundle_roundtrip() {
        let result = sample_result();
        let tmp = tempfile::tempdir().unwrap();

        let run_dir = save_artifacts(&result, tmp.path()).unwrap();
        for name in [
            "manifest.json",
            "merged_fg_prices.csv",
            "bucket_summary.csv",
            "ticker_bucket_summary.csv",
            "best_per_bucket.csv",
            "correlation_summary.csv",
            "divergence_events.csv",
            "divergence_summary.csv",
        ] {
            assert!(run_dir.join(name).exists(), "{name} missing");
        }

        let manifest = load_manifest(&run_dir).unwrap();
        assert_eq!(manifest.schema_version, SCHEMA_VERSION);
        assert_eq!(manifest.merged_rows, result.merged.len());
        assert_eq!(manifest.dataset_hash, result.dataset_hash);
    }

    #[test]
    fn future_schema_version_is_rejected() {
        let result = sample_result();
        let tmp = tempfile::tempdir().unwrap();
        let run_dir = save_artifacts(&result, tmp.path()).unwrap();

        let mut manifest = load_manifest(&run_dir).unwrap();
        manifest.schema_version = SCHEMA_VERSION + 1;
        std::fs::write(
            run_dir.join("manifest.json"),
            serde_json::to_string(&manifest).unwrap(),
        )
        .unwrap();

        assert!(load_manifest(&run_dir).is_err());
    }
}
