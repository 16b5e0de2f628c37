//! Derived features: returns, rolling windows, divergence detection.

pub mod divergence;
pub mod returns;
pub mod rolling;

pub use divergence::detect_divergences;
pub use returns::{compute_returns, group_by_ticker, DEFAULT_HORIZONS};
pub use rolling::rolling_max;
