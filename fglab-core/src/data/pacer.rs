//! Call pacing for provider rate budgets.
//!
//! Providers meter requests per minute. The pacer enforces a minimum gap
//! between successive live calls regardless of which ticker triggered
//! them, and derives the bounded backoff slept after a rate-limit
//! response. This is cross-call state shared by the whole download loop,
//! not a per-call concern.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Enforces an inter-call delay derived from a calls-per-minute budget.
#[derive(Debug)]
pub struct CallPacer {
    min_gap: Duration,
    extra_backoff: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl CallPacer {
    /// Pacer for a provider budget of `calls_per_min` requests per minute.
    pub fn from_calls_per_min(calls_per_min: u32) -> Self {
        let gap = Duration::from_secs_f64(60.0 / calls_per_min.max(1) as f64);
        Self {
            min_gap: gap,
            extra_backoff: Duration::from_secs(2),
            last_call: Mutex::new(None),
        }
    }

    /// Pacer with no delays, for tests and offline table-only runs.
    pub fn unthrottled() -> Self {
        Self {
            min_gap: Duration::ZERO,
            extra_backoff: Duration::ZERO,
            last_call: Mutex::new(None),
        }
    }

    /// Sleep slept after a provider reports a rate limit, before the one
    /// permitted retry.
    pub fn backoff(&self) -> Duration {
        self.min_gap + self.extra_backoff
    }

    /// Block until the minimum gap since the previous call has elapsed,
    /// then record this call.
    pub fn pace(&self) {
        let mut last = self.last_call.lock().unwrap();
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_gap {
                std::thread::sleep(self.min_gap - elapsed);
            }
        }
        *last = Some(Instant::now());
    }
}
