//! fglab Runner — pipeline orchestration, aggregation, and artifacts.
//!
//! This crate builds on `fglab-core` to provide:
//! - Serializable run configuration with content-hash run IDs
//! - The end-to-end analysis pipeline (join, detect, aggregate)
//! - Bucketed and per-ticker aggregation tables
//! - Sentiment/return correlation summaries
//! - CSV artifact bundles with a schema-versioned manifest

pub mod aggregate;
pub mod config;
pub mod correlation;
pub mod export;
pub mod pipeline;

pub use aggregate::{
    best_per_bucket, bucket_summaries, divergence_summaries, ticker_bucket_summaries,
    BucketSummary, DivergenceSummary, TickerBucketSummary,
};
pub use config::{AnalysisConfig, ConfigError, RunId};
pub use correlation::{correlation_summaries, pearson, spearman, CorrelationSummary};
pub use export::{load_manifest, save_artifacts, RunManifest};
pub use pipeline::{
    build_price_table, run_analysis, run_from_files, AnalysisResult, PipelineError,
    SCHEMA_VERSION,
};
