//! Series normalization: sort, dedupe, validate, truncate.
//!
//! Raw provider output arrives in arbitrary order, may repeat dates, and
//! rarely honors the requested bounds server-side. Normalization turns it
//! into the canonical form every downstream stage assumes: at most one
//! bar per date, strictly increasing dates, strictly positive closes, and
//! only dates inside `[start, end]`.

use chrono::NaiveDate;

use super::provider::DataError;
use crate::domain::PriceBar;

/// Canonicalize one ticker's raw bars.
///
/// Duplicates keep the first occurrence (in input order). A non-positive
/// or non-numeric close fails with `InvalidPrice` rather than letting an
/// infinity propagate through the return math later.
pub fn normalize_series(
    bars: Vec<PriceBar>,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Result<Vec<PriceBar>, DataError> {
    let mut seen = std::collections::BTreeMap::new();
    for bar in bars {
        if !bar.is_valid() {
            return Err(DataError::InvalidPrice {
                ticker: bar.ticker,
                date: bar.date,
                close: bar.close,
            });
        }
        seen.entry(bar.date).or_insert(bar);
    }

    Ok(seen
        .into_values()
        .filter(|b| b.date >= start && end.map_or(true, |e| b.date <= e))
        .collect())
}
