//! # Recovery Primitives
//!
//! Driver-side error recovery: exponential backoff for timeout-class
//! errors and a circuit breaker that opens after consecutive failures.
//! Both are pure state machines; the caller supplies the clock.

use std::time::Duration;

// =============================================================================
// RETRY POLICY
// =============================================================================

/// Exponential backoff schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Ceiling applied after multiplication.
    pub max_delay: Duration,
    /// Multiplier applied per attempt.
    pub multiplier: f64,
    /// Attempts after which the caller should give up.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based), or `None` once the
    /// attempt budget is spent.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = self.multiplier.powi(attempt as i32);
        let millis = (self.base_delay.as_millis() as f64 * factor)
            .min(self.max_delay.as_millis() as f64);
        Some(Duration::from_millis(millis as u64))
    }
}

// =============================================================================
// CIRCUIT BREAKER
// =============================================================================

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Calls pass through; failures are counted.
    Closed,
    /// Calls are rejected until the cooldown elapses.
    Open,
    /// One probe call is allowed; its outcome decides the next state.
    HalfOpen,
}

/// Opens after N consecutive failures, probes after a cooldown.
///
/// Time is supplied by the caller as milliseconds on every query, which
/// keeps the breaker deterministic under test.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown_ms: u64,
    consecutive_failures: u32,
    state: BreakerState,
    opened_at_ms: u64,
}

impl CircuitBreaker {
    /// Creates a closed breaker.
    #[must_use]
    pub fn new(failure_threshold: u32, cooldown_ms: u64) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown_ms,
            consecutive_failures: 0,
            state: BreakerState::Closed,
            opened_at_ms: 0,
        }
    }

    /// Current state, advancing `Open → HalfOpen` when the cooldown elapsed.
    pub fn state(&mut self, now_ms: u64) -> BreakerState {
        if self.state == BreakerState::Open
            && now_ms.saturating_sub(self.opened_at_ms) >= self.cooldown_ms
        {
            self.state = BreakerState::HalfOpen;
        }
        self.state
    }

    /// True if a call may proceed at `now_ms`.
    pub fn allow(&mut self, now_ms: u64) -> bool {
        self.state(now_ms) != BreakerState::Open
    }

    /// Reports a successful call.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.state = BreakerState::Closed;
    }

    /// Reports a failed call at `now_ms`.
    pub fn record_failure(&mut self, now_ms: u64) {
        match self.state {
            BreakerState::HalfOpen => {
                // Failed probe reopens immediately.
                self.state = BreakerState::Open;
                self.opened_at_ms = now_ms;
            }
            BreakerState::Closed => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.failure_threshold {
                    self.state = BreakerState::Open;
                    self.opened_at_ms = now_ms;
                    tracing::warn!(
                        failures = self.consecutive_failures,
                        "circuit breaker opened"
                    );
                }
            }
            BreakerState::Open => {}
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_for(1), Some(Duration::from_millis(200)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_millis(400)));
        assert_eq!(policy.delay_for(5), None);
    }

    #[test]
    fn test_backoff_ceiling() {
        let policy = RetryPolicy {
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(15),
            multiplier: 4.0,
            max_attempts: 10,
        };
        assert_eq!(policy.delay_for(3), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_breaker_opens_after_threshold() {
        let mut breaker = CircuitBreaker::new(3, 1000);
        assert!(breaker.allow(0));

        breaker.record_failure(10);
        breaker.record_failure(20);
        assert_eq!(breaker.state(30), BreakerState::Closed);

        breaker.record_failure(30);
        assert_eq!(breaker.state(31), BreakerState::Open);
        assert!(!breaker.allow(31));
    }

    #[test]
    fn test_breaker_probes_after_cooldown() {
        let mut breaker = CircuitBreaker::new(1, 1000);
        breaker.record_failure(0);
        assert!(!breaker.allow(500));
        assert_eq!(breaker.state(1000), BreakerState::HalfOpen);
        assert!(breaker.allow(1000));

        // Successful probe closes the breaker.
        breaker.record_success();
        assert_eq!(breaker.state(1001), BreakerState::Closed);
    }

    #[test]
    fn test_failed_probe_reopens() {
        let mut breaker = CircuitBreaker::new(1, 1000);
        breaker.record_failure(0);
        assert_eq!(breaker.state(1000), BreakerState::HalfOpen);

        breaker.record_failure(1000);
        assert_eq!(breaker.state(1500), BreakerState::Open);
        assert_eq!(breaker.state(2000), BreakerState::HalfOpen);
    }

    #[test]
    fn test_success_resets_failure_count() {
        let mut breaker = CircuitBreaker::new(2, 1000);
        breaker.record_failure(0);
        breaker.record_success();
        breaker.record_failure(10);
        assert_eq!(breaker.state(20), BreakerState::Closed);
    }
}
