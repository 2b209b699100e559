//! Probabilistic traffic model.
//!
//! All randomness flows through the injected `Rng`, so the model is fully
//! deterministic under a seeded generator. The severity mixture is an
//! explicit cumulative-probability table to keep the distribution auditable.

use std::time::Duration;

use lens_core::types::{LogLevel, NewLogEntry};
use rand::Rng;
use rand::seq::SliceRandom;

/// Fixed service set the generator attributes events to.
pub const SERVICES: [&str; 5] = [
    "auth-service",
    "payment-gateway",
    "db-shard-01",
    "frontend-proxy",
    "recommendation-engine",
];

const NORMAL_MESSAGES: [&str; 6] = [
    "Health check passed",
    "User login successful",
    "Payment processed successfully",
    "Cache refreshed",
    "Request served in 45ms",
    "Index updated",
];

const WARNING_MESSAGES: [&str; 4] = [
    "High memory usage detected (85%)",
    "Response time degraded (>500ms)",
    "Rate limit approaching for user 123",
    "Deprecated API usage detected",
];

const ERROR_MESSAGES: [&str; 5] = [
    "Database connection timeout",
    "Payment provider returned 502 Bad Gateway",
    "NullPointerException in user_handler",
    "Disk space critical on /var/log",
    "Failed to send email notification",
];

/// The two correlated messages emitted as a pair during an incident burst.
pub const INCIDENT_PRIMARY: &str = "Connection refused: upstream dependency unavailable";
pub const INCIDENT_RETRY: &str = "Retry attempt failed";

/// Probability of entering incident mode on a normal-mode iteration.
pub const INCIDENT_PROBABILITY: f64 = 0.1;

/// Cumulative severity mixture for normal-pattern entries: 80% INFO,
/// 15% WARN, 5% ERROR.
const SEVERITY_TABLE: [(f64, LogLevel); 3] = [
    (0.80, LogLevel::Info),
    (0.95, LogLevel::Warn),
    (1.00, LogLevel::Error),
];

const PAIR_DELAY: Duration = Duration::from_millis(200);
const POST_INCIDENT_PAUSE: Duration = Duration::from_secs(2);

/// Generator mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Incident,
}

/// What one iteration produced: the entries to deliver and the pause to
/// apply before the next iteration.
#[derive(Debug)]
pub struct Emission {
    pub entries: Vec<NewLogEntry>,
    pub pause: Duration,
}

/// Per-generator incident state machine. Independent per running instance;
/// never reads external state.
#[derive(Debug)]
pub struct IncidentState {
    mode: Mode,
    target: Option<&'static str>,
    remaining: u32,
}

impl IncidentState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: Mode::Normal,
            target: None,
            remaining: 0,
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Advances the generator by one iteration.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> Emission {
        if self.mode == Mode::Normal && rng.r#gen::<f64>() < INCIDENT_PROBABILITY {
            let target = *SERVICES.choose(rng).unwrap_or(&SERVICES[0]);
            self.mode = Mode::Incident;
            self.target = Some(target);
            self.remaining = rng.gen_range(5..=10);
            tracing::info!(service = target, pairs = self.remaining, "incident triggered");
        }

        match self.mode {
            Mode::Normal => self.normal_emission(rng),
            Mode::Incident => self.incident_emission(),
        }
    }

    fn normal_emission<R: Rng>(&self, rng: &mut R) -> Emission {
        let service = *SERVICES.choose(rng).unwrap_or(&SERVICES[0]);
        let (level, message) = draw_severity(rng);
        Emission {
            entries: vec![NewLogEntry::new(level, service, message)],
            pause: Duration::from_secs_f64(rng.gen_range(0.5..2.0)),
        }
    }

    fn incident_emission(&mut self) -> Emission {
        let target = self.target.unwrap_or(SERVICES[0]);
        let entries = vec![
            NewLogEntry::new(LogLevel::Error, target, INCIDENT_PRIMARY),
            NewLogEntry::new(LogLevel::Error, target, INCIDENT_RETRY),
        ];

        self.remaining -= 1;
        if self.remaining == 0 {
            self.mode = Mode::Normal;
            self.target = None;
            Emission {
                entries,
                pause: POST_INCIDENT_PAUSE,
            }
        } else {
            Emission {
                entries,
                pause: PAIR_DELAY,
            }
        }
    }
}

impl Default for IncidentState {
    fn default() -> Self {
        Self::new()
    }
}

fn draw_severity<R: Rng>(rng: &mut R) -> (LogLevel, &'static str) {
    let roll: f64 = rng.r#gen();
    let level = SEVERITY_TABLE
        .iter()
        .find(|(cumulative, _)| roll < *cumulative)
        .map_or(LogLevel::Error, |(_, level)| *level);

    let message = match level {
        LogLevel::Info => *NORMAL_MESSAGES.choose(rng).unwrap_or(&NORMAL_MESSAGES[0]),
        LogLevel::Warn => *WARNING_MESSAGES.choose(rng).unwrap_or(&WARNING_MESSAGES[0]),
        LogLevel::Error => *ERROR_MESSAGES.choose(rng).unwrap_or(&ERROR_MESSAGES[0]),
    };
    (level, message)
}
