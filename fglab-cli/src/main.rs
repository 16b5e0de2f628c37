//! fglab CLI — fetch, sentiment, and analysis commands.
//!
//! Commands:
//! - `fetch` — download and normalize the price universe into the cache
//! - `sentiment` — rebuild the fear & greed history table from the feed
//! - `run` — join cached tables, detect divergences, export artifacts

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fglab_core::data::{
    fear_greed, fetch_universe, write_price_table, write_sentiment_table, AlphaVantageProvider,
    CallPacer, PriceProvider, StdoutProgress, YahooProvider,
};
use fglab_runner::{
    build_price_table, run_from_files, save_artifacts, AnalysisConfig, AnalysisResult,
};

#[derive(Parser)]
#[command(
    name = "fglab",
    about = "fglab CLI — fear & greed vs. price divergence analysis"
)]
struct Cli {
    /// Path to a TOML config file; defaults apply if the file is absent.
    #[arg(long, default_value = "fglab.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the price universe and cache the return table.
    Fetch {
        /// Override the configured ticker universe (e.g., SPY QQQ).
        tickers: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to the configured start.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,
    },
    /// Rebuild the sentiment history table from the CNN feed.
    Sentiment,
    /// Run the analysis over cached tables and export an artifact bundle.
    Run {
        /// Override the configured divergence window.
        #[arg(long)]
        window: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Fetch {
            tickers,
            start,
            end,
        } => run_fetch(&config, tickers, start.as_deref(), end.as_deref()),
        Commands::Sentiment => run_sentiment(&config),
        Commands::Run { window } => run_analysis_cmd(&config, window),
    }
}

fn load_config(path: &Path) -> Result<AnalysisConfig> {
    if path.exists() {
        AnalysisConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))
    } else {
        tracing::info!(path = %path.display(), "config file not found, using defaults");
        Ok(AnalysisConfig::default())
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date {s:?}, expected YYYY-MM-DD"))
}

/// Alpha Vantage first when a key is configured, Yahoo as fallback.
fn build_providers(config: &AnalysisConfig) -> Vec<Box<dyn PriceProvider>> {
    let mut providers: Vec<Box<dyn PriceProvider>> = Vec::new();
    match std::env::var(&config.api_key_env) {
        Ok(key) if !key.is_empty() => {
            providers.push(Box::new(AlphaVantageProvider::new(key)));
        }
        _ => {
            tracing::info!(
                env = config.api_key_env,
                "no API key in environment, using fallback provider only"
            );
        }
    }
    providers.push(Box::new(YahooProvider::default()));
    providers
}

fn price_table_path(config: &AnalysisConfig) -> PathBuf {
    config.data_dir.join("prices.csv")
}

fn sentiment_table_path(config: &AnalysisConfig) -> PathBuf {
    config.data_dir.join("sentiment.csv")
}

fn run_fetch(
    config: &AnalysisConfig,
    tickers: Vec<String>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<()> {
    let tickers = if tickers.is_empty() {
        config.tickers.clone()
    } else {
        tickers
    };
    let start = match start {
        Some(s) => parse_date(s)?,
        None => config.start,
    };
    let end = match end {
        Some(s) => Some(parse_date(s)?),
        None => config.end,
    };

    let providers = build_providers(config);
    let provider_refs: Vec<&dyn PriceProvider> = providers.iter().map(|p| p.as_ref()).collect();
    let pacer = CallPacer::from_calls_per_min(config.calls_per_min);

    let summary = fetch_universe(
        &provider_refs,
        &pacer,
        &tickers,
        start,
        end,
        &StdoutProgress,
    );

    if summary.bars.is_empty() {
        for (ticker, err) in &summary.errors {
            eprintln!("Error for {ticker}: {err}");
        }
        bail!("no ticker could be fetched");
    }

    let all_succeeded = summary.all_succeeded();
    let returns = build_price_table(summary.bars, &config.horizons)?;
    std::fs::create_dir_all(&config.data_dir)?;
    let path = price_table_path(config);
    write_price_table(&path, &returns)?;
    println!(
        "Cached {} rows for {}/{} tickers to {}",
        returns.len(),
        summary.succeeded,
        summary.total,
        path.display()
    );

    if !all_succeeded {
        for (ticker, err) in &summary.errors {
            eprintln!("Error for {ticker}: {err}");
        }
        std::process::exit(1);
    }
    Ok(())
}

fn run_sentiment(config: &AnalysisConfig) -> Result<()> {
    let history = fear_greed::fetch_history().context("failed to fetch fear & greed history")?;
    if history.is_empty() {
        bail!("sentiment feed returned no usable readings");
    }

    std::fs::create_dir_all(&config.data_dir)?;
    let path = sentiment_table_path(config);
    write_sentiment_table(&path, &history)?;
    println!("Cached {} sentiment readings to {}", history.len(), path.display());
    Ok(())
}

fn run_analysis_cmd(config: &AnalysisConfig, window: Option<usize>) -> Result<()> {
    let prices = price_table_path(config);
    let sentiment = sentiment_table_path(config);
    if !prices.exists() {
        bail!("price table {} not found; run `fglab fetch` first", prices.display());
    }
    if !sentiment.exists() {
        bail!(
            "sentiment table {} not found; run `fglab sentiment` first",
            sentiment.display()
        );
    }

    let window = window.unwrap_or(config.divergence_window);
    let result = run_from_files(&prices, &sentiment, window)
        .context("analysis failed over cached tables")?;

    print_summary(&result);

    let run_dir = save_artifacts(&result, &config.output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn print_summary(result: &AnalysisResult) {
    println!(
        "Merged {} rows across {} tickers ({} divergence events, window {})",
        result.merged.len(),
        result.tickers.len(),
        result.events.len(),
        result.window
    );

    println!("\nBy bucket:");
    for s in &result.bucket_summary {
        println!(
            "  {:<14} n={:<6} avg_fwd1={} avg_fwd20={}",
            s.bucket.label(),
            s.count,
            fmt_pct(s.avg_fwd1),
            fmt_pct(s.avg_fwd20),
        );
    }

    println!("\nDivergences:");
    for s in &result.divergence_summary {
        println!(
            "  {:<6} n={:<4} p(down fwd5)={} avg_fwd20={}",
            s.ticker,
            s.count_divergences,
            fmt_pct(s.prob_down_fwd5),
            fmt_pct(s.avg_fwd20),
        );
    }
}

fn fmt_pct(v: Option<f64>) -> String {
    v.map(|v| format!("{:+.2}%", v * 100.0))
        .unwrap_or_else(|| "n/a".into())
}
