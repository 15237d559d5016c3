//! JWT settings loaded through `core_config::FromEnv`.

use core_config::{ConfigError, FromEnv, env_or_default, env_parse, env_required};

/// Token signing and validation settings.
///
/// - `JWT_SECRET` (required, at least 32 characters)
/// - `JWT_ISSUER` (default `league-users`)
/// - `JWT_AUDIENCE` (default `league`)
/// - `JWT_EXPIRY_MINUTES` (default 60)
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expiry_minutes: i64,
}

impl JwtConfig {
    /// Builds a config with default issuer, audience and expiry.
    ///
    /// # Panics
    /// Panics if the secret is shorter than 32 characters.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        assert!(
            secret.len() >= 32,
            "JWT secret must be at least 32 characters"
        );
        Self {
            secret,
            issuer: "league-users".to_string(),
            audience: "league".to_string(),
            expiry_minutes: 60,
        }
    }
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;

        if secret.len() < 32 {
            return Err(ConfigError::ParseError {
                key: "JWT_SECRET".to_string(),
                details: format!(
                    "must be at least 32 characters (got {}). Generate one with: openssl rand -base64 32",
                    secret.len()
                ),
            });
        }

        let expiry_minutes: i64 = env_parse("JWT_EXPIRY_MINUTES", "60")?;
        if expiry_minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRY_MINUTES".to_string(),
                details: "must be positive".to_string(),
            });
        }

        Ok(Self {
            secret,
            issuer: env_or_default("JWT_ISSUER", "league-users"),
            audience: env_or_default("JWT_AUDIENCE", "league"),
            expiry_minutes,
        })
    }
}
