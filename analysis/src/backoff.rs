//! Backoff policies for the retry loops.
//!
//! The two analysis modes intentionally differ: the blocking client backs
//! off exponentially (5s, 10s, 20s, 40s), while the streaming client waits
//! a flat 10s between attempts so an interactive caller is never left
//! waiting out a long schedule. Both are pure functions of the attempt
//! index.

use std::time::Duration;

/// Delay policy applied between retry attempts after a rate-limit signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffPolicy {
    /// `base * 2^attempt`.
    Exponential { base: Duration },
    /// The same interval for every attempt.
    Fixed { interval: Duration },
}

impl BackoffPolicy {
    /// Policy for the blocking analysis path: 5s, 10s, 20s, 40s, ...
    #[must_use]
    pub fn blocking() -> Self {
        Self::Exponential {
            base: Duration::from_secs(5),
        }
    }

    /// Policy for the streaming analysis path: a flat 10s.
    #[must_use]
    pub fn streaming() -> Self {
        Self::Fixed {
            interval: Duration::from_secs(10),
        }
    }

    /// Delay before retrying after the failed attempt with this index.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Exponential { base } => {
                base.saturating_mul(2u32.saturating_pow(attempt.min(31)))
            }
            Self::Fixed { interval } => *interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocking_schedule_doubles_from_five_seconds() {
        let policy = BackoffPolicy::blocking();
        let schedule: Vec<u64> = (0..4).map(|a| policy.delay(a).as_secs()).collect();
        assert_eq!(schedule, vec![5, 10, 20, 40]);
    }

    #[test]
    fn streaming_schedule_is_flat() {
        let policy = BackoffPolicy::streaming();
        for attempt in 0..4 {
            assert_eq!(policy.delay(attempt), Duration::from_secs(10));
        }
    }

    #[test]
    fn exponential_saturates_instead_of_overflowing() {
        let policy = BackoffPolicy::blocking();
        assert!(policy.delay(u32::MAX) >= policy.delay(31));
    }
}
