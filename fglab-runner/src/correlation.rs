//! Sentiment/forward-return correlation.
//!
//! Correlations are computed over the full merged set, not grouped by
//! ticker or bucket. Pairs are formed from (fg_score, fwdH); any pair
//! with a missing forward return or a NaN score is excluded before
//! computing either coefficient. Fewer than two surviving pairs, or a
//! degenerate (constant) series, yields no coefficient rather than NaN.

use serde::Serialize;

use fglab_core::domain::MergedRecord;

/// One correlation metric over the full merged set.
///
/// `metric` is one of `pearson_fwd1`, `pearson_fwd5`, `spearman_fwd1`,
/// `spearman_fwd5`; `n` is the number of surviving pairs.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationSummary {
    pub metric: &'static str,
    pub n: usize,
    pub value: Option<f64>,
}

/// Pearson product-moment correlation.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mx = xs.iter().sum::<f64>() / n;
    let my = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx.sqrt() * vy.sqrt()))
}

/// Spearman rank correlation: Pearson over average ranks, so ties are
/// handled exactly rather than via the shortcut formula.
pub fn spearman(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    pearson(&average_ranks(xs), &average_ranks(ys))
}

/// 1-based ranks; tied values share the mean of the ranks they span.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // Positions i..=j hold the same value; each gets the mean rank.
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }
    ranks
}

fn pairs(records: &[MergedRecord], h: usize) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for r in records {
        if r.fg_score.is_nan() {
            continue;
        }
        if let Some(fwd) = r.forward(h) {
            xs.push(r.fg_score);
            ys.push(fwd);
        }
    }
    (xs, ys)
}

/// The four standard metrics: both Pearson rows first, then both
/// Spearman rows.
pub fn correlation_summaries(records: &[MergedRecord]) -> Vec<CorrelationSummary> {
    let (x1, y1) = pairs(records, 1);
    let (x5, y5) = pairs(records, 5);
    vec![
        CorrelationSummary {
            metric: "pearson_fwd1",
            n: x1.len(),
            value: pearson(&x1, &y1),
        },
        CorrelationSummary {
            metric: "pearson_fwd5",
            n: x5.len(),
            value: pearson(&x5, &y5),
        },
        CorrelationSummary {
            metric: "spearman_fwd1",
            n: x1.len(),
            value: spearman(&x1, &y1),
        },
        CorrelationSummary {
            metric: "spearman_fwd5",
            n: x5.len(),
            value: spearman(&x5, &y5),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn pearson_of_perfect_line_is_one() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&xs, &ys).unwrap() - 1.0).abs() < 1e-12);

        let neg: Vec<f64> = ys.iter().map(|y| -y).collect();
        assert!((pearson(&xs, &neg).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_series_has_no_coefficient() {
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0], &[2.0]), None);
    }

    #[test]
    fn spearman_sees_monotone_not_linear() {
        // y = x^3 is monotone but not linear: spearman 1, pearson < 1.
        let xs: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys: Vec<f64> = xs.iter().map(|x| x.powi(3)).collect();
        assert!((spearman(&xs, &ys).unwrap() - 1.0).abs() < 1e-12);
        assert!(pearson(&xs, &ys).unwrap() < 1.0);
    }

    #[test]
    fn tied_values_share_average_ranks() {
        assert_eq!(average_ranks(&[10.0, 20.0, 20.0, 30.0]), vec![1.0, 2.5, 2.5, 4.0]);
    }

    #[test]
    fn summaries_cover_the_four_metrics_and_exclude_missing_pairs() {
        let record = |score: f64, fwd1: Option<f64>| MergedRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            ticker: "SPY".into(),
            close: 100.0,
            fg_score: score,
            fg_rating: String::new(),
            ret1: None,
            fwd1,
            fwd5: None,
            fwd20: None,
        };
        let records = vec![
            record(10.0, Some(0.02)),
            record(f64::NAN, Some(0.01)),
            record(60.0, None),
            record(80.0, Some(-0.01)),
            record(40.0, Some(0.005)),
        ];

        let rows = correlation_summaries(&records);
        let metrics: Vec<&str> = rows.iter().map(|r| r.metric).collect();
        assert_eq!(
            metrics,
            vec!["pearson_fwd1", "pearson_fwd5", "spearman_fwd1", "spearman_fwd5"]
        );
        assert_eq!(rows[0].n, 3);
        assert!(rows[0].value.is_some());
        assert_eq!(rows[1].n, 0);
        assert_eq!(rows[1].value, None);
    }
}
