//! Rolling-window primitives.

/// Rolling maximum over a trailing window of `window` values, inclusive
/// of the current position.
///
/// The first `window - 1` slots are NaN because the window has not
/// filled yet. A NaN inside a filled window poisons that window's
/// output, so gaps in the input never masquerade as highs.
pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 {
        return out;
    }
    for t in (window - 1)..values.len() {
        let slice = &values[t + 1 - window..=t];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[t] = slice.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_slots_are_nan_until_window_fills() {
        let out = rolling_max(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_eq!(out[2], 3.0);
        assert_eq!(out[3], 4.0);
    }

    #[test]
    fn max_tracks_the_trailing_window() {
        let out = rolling_max(&[5.0, 1.0, 2.0, 3.0], 2);
        assert_eq!(out[1], 5.0);
        assert_eq!(out[2], 2.0);
        assert_eq!(out[3], 3.0);
    }

    #[test]
    fn nan_poisons_its_window_only() {
        let out = rolling_max(&[1.0, f64::NAN, 3.0, 4.0, 5.0], 2);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert_eq!(out[3], 4.0);
        assert_eq!(out[4], 5.0);
    }

    #[test]
    fn window_of_one_is_identity() {
        let out = rolling_max(&[2.0, 1.0, 3.0], 1);
        assert_eq!(out, vec![2.0, 1.0, 3.0]);
    }

    #[test]
    fn window_longer_than_series_is_all_nan() {
        let out = rolling_max(&[1.0, 2.0], 5);
        assert!(out.iter().all(|v| v.is_nan()));
    }
}
