//! Token-bucket admission control for agents.

use governor::clock::DefaultClock;
use governor::middleware::StateInformationMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, StateInformationMiddleware>;

/// Per-agent admission control.
///
/// `allow` atomically consumes one token if available. `tokens` reports the
/// currently available count and must not consume anything; agents use it to
/// derive the `Unavailable` state and for status reporting.
pub trait RateGate: Send + Sync {
    /// Atomically consume one token if available.
    fn allow(&self) -> bool;
    /// Currently available tokens, for reporting only.
    fn tokens(&self) -> f64;
}

/// A `RateGate` backed by a `governor` rate limiter.
///
/// Admission decisions come straight from the limiter. The token count is an
/// estimate: the remaining burst capacity observed at the last admission
/// check, advanced by elapsed-time replenishment and clamped to the burst
/// size. This matches the limiter's own arithmetic, so the estimate converges
/// between checks instead of going stale.
pub struct GovernorGate {
    limiter: DirectLimiter,
    burst: u32,
    replenish: Duration,
    observed: Mutex<Observed>,
}

struct Observed {
    remaining: f64,
    at: Instant,
}

impl GovernorGate {
    /// Create a gate enforcing the given quota. The bucket starts full.
    pub fn new(quota: Quota) -> Self {
        let burst = quota.burst_size().get();
        Self {
            burst,
            replenish: quota.replenish_interval(),
            limiter: RateLimiter::direct(quota).with_middleware::<StateInformationMiddleware>(),
            observed: Mutex::new(Observed {
                remaining: burst as f64,
                at: Instant::now(),
            }),
        }
    }
}

impl RateGate for GovernorGate {
    fn allow(&self) -> bool {
        let mut observed = self.observed.lock();
        match self.limiter.check() {
            Ok(snapshot) => {
                observed.remaining = snapshot.remaining_burst_capacity() as f64;
                observed.at = Instant::now();
                true
            }
            Err(_) => {
                observed.remaining = 0.0;
                observed.at = Instant::now();
                false
            }
        }
    }

    fn tokens(&self) -> f64 {
        let observed = self.observed.lock();
        let replenished =
            observed.at.elapsed().as_secs_f64() / self.replenish.as_secs_f64().max(f64::MIN_POSITIVE);
        (observed.remaining + replenished).min(self.burst as f64)
    }
}
