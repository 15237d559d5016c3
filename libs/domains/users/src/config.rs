//! Environment-driven settings for the users domain.

use core_config::{ConfigError, FromEnv, env_or_default, env_parse, env_required};
use std::time::Duration;

/// Base URLs of the sibling services the relay calls.
#[derive(Debug, Clone)]
pub struct ServiceClientsConfig {
    pub team_service_url: String,
    pub messaging_service_url: String,
    pub request_timeout: Duration,
}

impl FromEnv for ServiceClientsConfig {
    /// - `TEAM_SERVICE_URL` (required)
    /// - `MESSAGING_SERVICE_URL` (required)
    /// - `SERVICE_REQUEST_TIMEOUT_SECS` (default 10)
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: u64 = env_parse("SERVICE_REQUEST_TIMEOUT_SECS", "10")?;

        Ok(Self {
            team_service_url: trim_base(env_required("TEAM_SERVICE_URL")?),
            messaging_service_url: trim_base(env_required("MESSAGING_SERVICE_URL")?),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Outbox relay pacing and retry budget.
#[derive(Debug, Clone)]
pub struct OutboxConfig {
    pub poll_interval: Duration,
    pub batch_size: usize,
    pub max_attempts: u32,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            batch_size: 20,
            max_attempts: 5,
        }
    }
}

impl FromEnv for OutboxConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let poll_interval_ms: u64 = env_parse("OUTBOX_POLL_INTERVAL_MS", "1000")?;
        let max_attempts: u32 = env_parse("OUTBOX_MAX_ATTEMPTS", "5")?;

        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "OUTBOX_MAX_ATTEMPTS".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            poll_interval: Duration::from_millis(poll_interval_ms),
            batch_size: env_parse("OUTBOX_BATCH_SIZE", "20")?,
            max_attempts,
        })
    }
}

/// Registration settings.
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    /// Public URL of this service, used for the default confirmation link
    pub public_base_url: String,
}

impl RegistrationConfig {
    pub fn default_confirmation_url(&self) -> String {
        format!("{}/api/account/emailconfirmation", self.public_base_url)
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:8080".to_string(),
        }
    }
}

impl FromEnv for RegistrationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            public_base_url: trim_base(env_or_default("PUBLIC_BASE_URL", "http://localhost:8080")),
        })
    }
}
