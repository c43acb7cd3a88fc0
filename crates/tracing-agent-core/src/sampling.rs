// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Budget-based sampling of new trace starts.
//!
//! The limiter grants at most `sample_n_per_window` new traces per fixed
//! window, replenishing at window boundaries of a monotonic clock. All
//! bookkeeping lives in a single packed atomic so concurrent callers on the
//! hot path never contend on a lock and the budget is never oversubscribed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Replenishment window for the sampling budget.
pub const SAMPLING_WINDOW: Duration = Duration::from_secs(3);

/// Decides whether a non-forced trace start is sampled.
///
/// Window index and in-window grant count are packed into one `AtomicU64`
/// (index in the high half, count in the low half) and advanced with a
/// single compare-and-swap loop.
#[derive(Debug)]
pub struct Sampler {
    /// Grants per window; 0 means the limiter is off and every call grants.
    budget: u32,
    /// Monotonic anchor for window arithmetic; wall-clock adjustments do not
    /// affect replenishment.
    epoch: Instant,
    state: AtomicU64,
}

impl Sampler {
    /// A non-positive `sample_n_per_window` disables the limiter.
    pub fn new(sample_n_per_window: i32) -> Sampler {
        Sampler {
            budget: u32::try_from(sample_n_per_window).unwrap_or(0),
            epoch: Instant::now(),
            state: AtomicU64::new(0),
        }
    }

    /// Consumes one unit of the current window's budget, or returns false if
    /// the window is exhausted. Exhaustion is not an error; the caller reads
    /// false as "do not trace this occurrence".
    ///
    /// The decision is independent of operation identity; every call counts
    /// against the shared budget.
    pub fn try_sampling(&self, _operation_name: &str) -> bool {
        if self.budget == 0 {
            return true;
        }

        let window = (self.epoch.elapsed().as_millis() / SAMPLING_WINDOW.as_millis()) as u64;

        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |packed| {
                let (stored_window, used) = (packed >> 32, packed & u64::from(u32::MAX));
                if stored_window != window {
                    // First grant of a fresh window.
                    Some((window << 32) | 1)
                } else if used < u64::from(self.budget) {
                    Some((stored_window << 32) | (used + 1))
                } else {
                    None
                }
            })
            .is_ok()
    }

    /// Grants consumed in the current window, for introspection in tests.
    #[cfg(test)]
    fn used_in_current_window(&self) -> u64 {
        let window = (self.epoch.elapsed().as_millis() / SAMPLING_WINDOW.as_millis()) as u64;
        let packed = self.state.load(Ordering::Acquire);
        if packed >> 32 == window {
            packed & u64::from(u32::MAX)
        } else {
            0
        }
    }
}
