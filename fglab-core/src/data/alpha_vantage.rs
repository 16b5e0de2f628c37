//! Alpha Vantage daily-close provider (primary source).
//!
//! Tries the adjusted daily series first, then the raw daily series. The
//! payload is JSON keyed by date string; each entry may carry
//! "5. adjusted close" and always carries "4. close", so the parser
//! prefers the adjusted key and falls back to the raw one. A "Note"
//! field marks a temporary rate limit; an "Error Message" field (bad
//! symbol, unsupported call) is a hard error that aborts this provider.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use super::provider::{DataError, FetchOutcome, PriceProvider};
use crate::domain::PriceBar;

const ALPHA_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage daily time-series response.
///
/// Exactly one of `series`, `note`, or `error_message` is populated on a
/// well-behaved response; anything else is a malformed payload.
#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    series: Option<BTreeMap<String, DailyEntry>>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyEntry {
    #[serde(rename = "5. adjusted close")]
    adjusted_close: Option<String>,
    #[serde(rename = "4. close")]
    close: Option<String>,
}

/// Alpha Vantage data provider. Requires an API key.
pub struct AlphaVantageProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            base_url: ALPHA_URL.to_string(),
        }
    }

    /// Provider pointed at a stand-in endpoint, for wire-level tests.
    #[cfg(test)]
    fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::new(api_key)
        }
    }

    /// Parse one daily series payload into price bars (unsorted, unvalidated).
    fn parse_series(
        ticker: &str,
        series: &BTreeMap<String, DailyEntry>,
    ) -> Result<Vec<PriceBar>, DataError> {
        let mut bars = Vec::with_capacity(series.len());
        for (date_str, entry) in series {
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                DataError::MalformedPayload {
                    provider: "alpha_vantage".into(),
                    detail: format!("bad date key '{date_str}': {e}"),
                }
            })?;

            // Prefer adjusted close; fall back to the raw close.
            let raw = entry
                .adjusted_close
                .as_deref()
                .or(entry.close.as_deref())
                .ok_or_else(|| DataError::MalformedPayload {
                    provider: "alpha_vantage".into(),
                    detail: format!("no close field for {date_str}"),
                })?;

            let close = raw.parse::<f64>().map_err(|e| DataError::MalformedPayload {
                provider: "alpha_vantage".into(),
                detail: format!("unparseable close '{raw}' for {date_str}: {e}"),
            })?;

            bars.push(PriceBar::new(date, ticker.to_uppercase(), close));
        }
        Ok(bars)
    }

    fn request(&self, function: &str, ticker: &str) -> Result<DailyResponse, DataError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", function),
                ("symbol", ticker),
                ("outputsize", "full"),
                ("datatype", "json"),
                ("apikey", &self.api_key),
            ])
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::MalformedPayload {
                provider: "alpha_vantage".into(),
                detail: format!("HTTP {status} for {ticker}"),
            });
        }

        resp.json::<DailyResponse>()
            .map_err(|e| DataError::MalformedPayload {
                provider: "alpha_vantage".into(),
                detail: format!("failed to parse response for {ticker}: {e}"),
            })
    }

    /// Classify a response body: bars, rate-limit marker, or hard error.
    fn classify(ticker: &str, resp: &DailyResponse) -> Option<FetchOutcome> {
        if let Some(series) = &resp.series {
            return Some(match Self::parse_series(ticker, series) {
                Ok(bars) => FetchOutcome::Bars(bars),
                Err(e) => FetchOutcome::HardError(e),
            });
        }
        if let Some(msg) = &resp.error_message {
            tracing::warn!(ticker, %msg, "alpha vantage rejected the symbol");
            return Some(FetchOutcome::HardError(DataError::SymbolNotFound {
                ticker: ticker.to_string(),
            }));
        }
        // A "Note" body is the rate-limit marker. It is signaled as
        // RateLimited only after the raw-series variant has also been tried,
        // so it is not an outcome on its own.
        None
    }
}

impl PriceProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn fetch(&self, ticker: &str, _start: NaiveDate, _end: Option<NaiveDate>) -> FetchOutcome {
        let mut saw_note = false;

        for function in ["TIME_SERIES_DAILY_ADJUSTED", "TIME_SERIES_DAILY"] {
            match self.request(function, ticker) {
                Ok(resp) => match Self::classify(ticker, &resp) {
                    Some(outcome) => return outcome,
                    None => saw_note = resp.note.is_some() || saw_note,
                },
                Err(e) => return FetchOutcome::HardError(e),
            }
        }

        if saw_note {
            FetchOutcome::RateLimited
        } else {
            FetchOutcome::HardError(DataError::MalformedPayload {
                provider: "alpha_vantage".into(),
                detail: "no series, note, or error message in either variant".into(),
            })
        }
    }
}
