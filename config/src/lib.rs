//! # Configuration
//!
//! Centralized configuration for the loglens monitoring system.
//!
//! - Environment variable loading (12-factor app principles)
//! - Defaults for every setting; only the inference credential is optional
//!   state rather than defaulted
//! - Validation with clear error messages

use errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Context window size for the blocking analysis path.
pub const DEFAULT_BLOCKING_WINDOW: usize = 20;
/// Context window size for the streaming analysis path.
pub const DEFAULT_STREAMING_WINDOW: usize = 10;
/// Attempt budget for the blocking analysis path.
pub const DEFAULT_BLOCKING_ATTEMPTS: u32 = 5;
/// Attempt budget for the streaming analysis path.
///
/// Deliberately smaller than the blocking budget: interactive callers will
/// not sit through long backoff schedules. The two budgets are independent
/// settings and must not be unified.
pub const DEFAULT_STREAMING_ATTEMPTS: u32 = 3;

/// Top-level configuration, aggregating all subsystems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

impl MonitorConfig {
    /// Loads the full configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            ai: AiConfig::from_env(),
            simulator: SimulatorConfig::from_env(),
        }
    }

    /// Validates every subsystem configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.ai.validate()
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind the server to.
    pub host: String,
    /// Port to bind the server to.
    pub port: u16,
    /// SQLite database URL; `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Run the synthetic traffic generator as a background task.
    pub enable_simulator: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database_url: None,
            enable_simulator: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("LOGLENS_HOST").unwrap_or(defaults.host),
            port: std::env::var("LOGLENS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_url: std::env::var("LOGLENS_DATABASE_URL").ok(),
            enable_simulator: std::env::var("LOGLENS_ENABLE_SIMULATOR")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.enable_simulator),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Invalid {
                message: "server host must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Inference pipeline configuration.
///
/// `api_key: None` is a legal, fully handled state: analysis requests then
/// resolve to a canned notice without touching the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub blocking_window: usize,
    pub streaming_window: usize,
    pub blocking_attempts: u32,
    pub streaming_attempts: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            blocking_window: DEFAULT_BLOCKING_WINDOW,
            streaming_window: DEFAULT_STREAMING_WINDOW,
            blocking_attempts: DEFAULT_BLOCKING_ATTEMPTS,
            streaming_attempts: DEFAULT_STREAMING_ATTEMPTS,
        }
    }
}

impl AiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            model: std::env::var("LOGLENS_AI_MODEL").unwrap_or(defaults.model),
            blocking_window: env_usize("LOGLENS_BLOCKING_WINDOW", defaults.blocking_window),
            streaming_window: env_usize("LOGLENS_STREAMING_WINDOW", defaults.streaming_window),
            blocking_attempts: env_u32("LOGLENS_BLOCKING_ATTEMPTS", defaults.blocking_attempts),
            streaming_attempts: env_u32("LOGLENS_STREAMING_ATTEMPTS", defaults.streaming_attempts),
        }
    }

    /// Creates a builder for programmatic construction.
    #[must_use]
    pub fn builder() -> AiConfigBuilder {
        AiConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.is_empty() {
            return Err(ConfigError::Invalid {
                message: "ai model must not be empty".to_string(),
            });
        }
        if self.blocking_window == 0 || self.streaming_window == 0 {
            return Err(ConfigError::Invalid {
                message: "context window sizes must be positive".to_string(),
            });
        }
        if self.blocking_attempts == 0 || self.streaming_attempts == 0 {
            return Err(ConfigError::Invalid {
                message: "attempt budgets must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for `AiConfig`.
#[derive(Default)]
pub struct AiConfigBuilder {
    api_key: Option<String>,
    model: Option<String>,
    blocking_window: Option<usize>,
    streaming_window: Option<usize>,
    blocking_attempts: Option<u32>,
    streaming_attempts: Option<u32>,
}

impl AiConfigBuilder {
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn blocking_window(mut self, n: usize) -> Self {
        self.blocking_window = Some(n);
        self
    }

    #[must_use]
    pub fn streaming_window(mut self, n: usize) -> Self {
        self.streaming_window = Some(n);
        self
    }

    #[must_use]
    pub fn blocking_attempts(mut self, n: u32) -> Self {
        self.blocking_attempts = Some(n);
        self
    }

    #[must_use]
    pub fn streaming_attempts(mut self, n: u32) -> Self {
        self.streaming_attempts = Some(n);
        self
    }

    pub fn build(self) -> Result<AiConfig, ConfigError> {
        let defaults = AiConfig::default();
        let config = AiConfig {
            api_key: self.api_key,
            model: self.model.unwrap_or(defaults.model),
            blocking_window: self.blocking_window.unwrap_or(defaults.blocking_window),
            streaming_window: self.streaming_window.unwrap_or(defaults.streaming_window),
            blocking_attempts: self.blocking_attempts.unwrap_or(defaults.blocking_attempts),
            streaming_attempts: self
                .streaming_attempts
                .unwrap_or(defaults.streaming_attempts),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Synthetic traffic generator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Base URL of a running server to post entries to; `None` means the
    /// generator writes directly into the shared store.
    pub target_url: Option<String>,
    /// RNG seed for reproducible traffic; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl SimulatorConfig {
    pub fn from_env() -> Self {
        Self {
            target_url: std::env::var("LOGLENS_SIMULATOR_TARGET").ok(),
            seed: std::env::var("LOGLENS_SIMULATOR_SEED")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
