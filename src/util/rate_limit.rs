//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Queue join/leave requests accepted per second across the ingestion surface
pub const QUEUE_RATE_LIMIT: u32 = 50;

/// Match report messages (positions, damage, eliminations) accepted per second
pub const REPORT_RATE_LIMIT: u32 = 2_000;

/// Limiters guarding the HTTP ingestion endpoints
#[derive(Clone)]
pub struct IngestLimiters {
    queue: Arc<Limiter>,
    reports: Arc<Limiter>,
}

impl IngestLimiters {
    pub fn new() -> Self {
        Self {
            queue: create_limiter(QUEUE_RATE_LIMIT),
            reports: create_limiter(REPORT_RATE_LIMIT),
        }
    }

    /// Check if a queue request is allowed (returns true if allowed)
    pub fn check_queue(&self) -> bool {
        self.queue.check().is_ok()
    }

    /// Check if a match report is allowed (returns true if allowed)
    pub fn check_report(&self) -> bool {
        self.reports.check().is_ok()
    }
}

impl Default for IngestLimiters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_exhausts_burst() {
        let limiter = create_limiter(2);
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
