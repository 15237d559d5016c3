use axum_helpers::JwtConfig;
use core_config::{
    AppInfo, FromEnv, app_info, database::DatabaseConfig, server::ServerConfig,
};
use domain_users::{OutboxConfig, RegistrationConfig, ServiceClientsConfig};

pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library and the users domain
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub clients: ServiceClientsConfig,
    pub outbox: OutboxConfig,
    pub registration: RegistrationConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?, // HOST=0.0.0.0, PORT=8080 by default
            database: DatabaseConfig::from_env()?, // DATABASE_URL required
            jwt: JwtConfig::from_env()?,           // JWT_SECRET required
            clients: ServiceClientsConfig::from_env()?,
            outbox: OutboxConfig::from_env()?,
            registration: RegistrationConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/users")),
                ("JWT_SECRET", Some("config-test-secret-that-is-long-enough")),
                ("TEAM_SERVICE_URL", Some("http://teams:8080")),
                ("MESSAGING_SERVICE_URL", Some("http://messaging:8080/")),
                ("PORT", Some("9090")),
                ("PUBLIC_BASE_URL", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.app.name, "users-api");
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.clients.messaging_service_url, "http://messaging:8080");
                assert_eq!(config.registration.public_base_url, "http://localhost:8080");
            },
        );
    }

    #[test]
    fn test_config_requires_jwt_secret() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/users")),
                ("JWT_SECRET", None::<&str>),
                ("TEAM_SERVICE_URL", Some("http://teams:8080")),
                ("MESSAGING_SERVICE_URL", Some("http://messaging:8080")),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("JWT_SECRET"));
            },
        );
    }
}
