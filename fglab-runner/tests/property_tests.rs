//! Property tests for aggregation invariants.
//!
//! Uses proptest to verify:
//! 1. Bucket counts partition the classifiable rows exactly
//! 2. Probability statistics stay in [0, 1] and are absent exactly
//!    when no forward value survived
//! 3. Aggregation is a pure function: identical inputs yield
//!    identical summary rows

use chrono::NaiveDate;
use proptest::prelude::*;

use fglab_core::domain::{DivergenceEvent, MergedRecord};
use fglab_runner::{bucket_summaries, divergence_summaries, ticker_bucket_summaries};

fn arb_score() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => (0.0..=100.0_f64).prop_map(|s| (s * 10.0).round() / 10.0),
        1 => Just(f64::NAN),
    ]
}

fn arb_fwd() -> impl Strategy<Value = Option<f64>> {
    proptest::option::of((-0.5..0.5_f64).prop_map(|v| (v * 1e4).round() / 1e4))
}

fn arb_record() -> impl Strategy<Value = MergedRecord> {
    (0i64..500, arb_score(), arb_fwd(), arb_fwd(), arb_fwd()).prop_map(
        |(day, score, fwd1, fwd5, fwd20)| MergedRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(day),
            ticker: "SPY".into(),
            close: 100.0,
            fg_score: score,
            fg_rating: String::new(),
            ret1: None,
            fwd1,
            fwd5,
            fwd20,
        },
    )
}

proptest! {
    /// Every classifiable row lands in exactly one bucket; NaN-score
    /// rows land in none.
    #[test]
    fn bucket_counts_partition_classified_rows(
        records in proptest::collection::vec(arb_record(), 0..60),
    ) {
        let classifiable = records.iter().filter(|r| r.bucket().is_some()).count();
        let total: usize = bucket_summaries(&records).iter().map(|s| s.count).sum();
        prop_assert_eq!(total, classifiable);

        let per_ticker: usize = ticker_bucket_summaries(&records)
            .iter()
            .map(|s| s.count)
            .sum();
        prop_assert_eq!(per_ticker, classifiable);
    }

    /// prob_down and the per-horizon averages are present exactly when
    /// at least one forward value survived, and probabilities stay in
    /// [0, 1].
    #[test]
    fn divergence_probabilities_are_bounded(
        records in proptest::collection::vec(arb_record(), 0..40),
    ) {
        let events: Vec<DivergenceEvent> = records
            .iter()
            .map(|r| DivergenceEvent { record: r.clone() })
            .collect();
        let rows = divergence_summaries(&["SPY".to_string()], &events);
        prop_assert_eq!(rows.len(), 1);
        let row = &rows[0];
        prop_assert_eq!(row.count_divergences, events.len());

        let has_fwd1 = records.iter().any(|r| r.fwd1.is_some());
        prop_assert_eq!(row.prob_down_fwd1.is_some(), has_fwd1);
        prop_assert_eq!(row.avg_fwd1.is_some(), has_fwd1);
        for p in [row.prob_down_fwd1, row.prob_down_fwd5, row.prob_down_fwd20]
            .into_iter()
            .flatten()
        {
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }

    /// Re-running aggregation on identical rows yields identical
    /// summaries (no hidden state, no iteration-order dependence).
    #[test]
    fn aggregation_is_deterministic(
        records in proptest::collection::vec(arb_record(), 0..60),
    ) {
        let a = serde_json::to_string(&bucket_summaries(&records)).unwrap();
        let b = serde_json::to_string(&bucket_summaries(&records)).unwrap();
        prop_assert_eq!(a, b);

        let a = serde_json::to_string(&ticker_bucket_summaries(&records)).unwrap();
        let b = serde_json::to_string(&ticker_bucket_summaries(&records)).unwrap();
        prop_assert_eq!(a, b);
    }
}
