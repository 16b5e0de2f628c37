//! Yahoo Finance daily-close provider (secondary source).
//!
//! Fetches daily bars from Yahoo's v8 chart API and keeps only the close
//! column (adjusted close preferred). Yahoo has no official API and is
//! subject to unannounced format changes, which is why it sits behind the
//! keyed primary provider rather than in front of it.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use super::provider::{DataError, FetchOutcome, PriceProvider};
use crate::domain::PriceBar;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .expect("failed to build HTTP client");

        Self { client }
    }

    /// Build the chart API URL for a ticker and date range.
    fn chart_url(ticker: &str, start: NaiveDate, end: Option<NaiveDate>) -> String {
        let start_ts = start.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        let end_ts = end
            .map(|d| d.and_hms_opt(23, 59, 59).unwrap().and_utc().timestamp())
            .unwrap_or_else(|| chrono::Utc::now().timestamp());
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{ticker}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true"
        )
    }

    /// Parse the chart API response into price bars.
    fn parse_response(ticker: &str, resp: ChartResponse) -> Result<Vec<PriceBar>, DataError> {
        let malformed = |detail: String| DataError::MalformedPayload {
            provider: "yahoo_finance".into(),
            detail,
        };

        let result = match resp.chart.result {
            Some(r) => r,
            None => {
                return Err(match resp.chart.error {
                    Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                        ticker: ticker.to_string(),
                    },
                    Some(err) => malformed(format!("{}: {}", err.code, err.description)),
                    None => malformed("empty result with no error".into()),
                });
            }
        };

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| malformed("result array is empty".into()))?;

        let timestamps = data
            .timestamp
            .ok_or_else(|| malformed("no timestamps".into()))?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| malformed("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| malformed(format!("invalid timestamp: {ts}")))?;

            // Prefer adjusted close; skip holiday rows with no close at all.
            let close = adj_closes
                .as_ref()
                .and_then(|v| v.get(i).copied().flatten())
                .or_else(|| quote.close.get(i).copied().flatten());

            if let Some(close) = close {
                bars.push(PriceBar::new(date, ticker.to_uppercase(), close));
            }
        }

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                ticker: ticker.to_string(),
            });
        }

        Ok(bars)
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, ticker: &str, start: NaiveDate, end: Option<NaiveDate>) -> FetchOutcome {
        let url = Self::chart_url(ticker, start, end);

        let resp = match self.client.get(&url).send() {
            Ok(resp) => resp,
            Err(e) => {
                return FetchOutcome::HardError(DataError::NetworkUnreachable(e.to_string()))
            }
        };

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return FetchOutcome::RateLimited;
        }
        if !status.is_success() {
            return FetchOutcome::HardError(DataError::MalformedPayload {
                provider: "yahoo_finance".into(),
                detail: format!("HTTP {status} for {ticker}"),
            });
        }

        let chart: ChartResponse = match resp.json() {
            Ok(chart) => chart,
            Err(e) => {
                return FetchOutcome::HardError(DataError::MalformedPayload {
                    provider: "yahoo_finance".into(),
                    detail: format!("failed to parse response for {ticker}: {e}"),
                })
            }
        };

        match Self::parse_response(ticker, chart) {
            Ok(bars) => FetchOutcome::Bars(bars),
            Err(e) => FetchOutcome::HardError(e),
        }
    }
}
