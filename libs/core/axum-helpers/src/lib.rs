//! # Axum Helpers
//!
//! Shared HTTP plumbing for the league services.
//!
//! - **[`auth`]**: HS256 JWT issuing/verification and the bearer middleware
//! - **[`server`]**: router assembly with docs, health endpoints, graceful shutdown
//! - **[`http`]**: CORS and security headers
//! - **[`errors`]**: JSON error bodies with numeric codes
//! - **[`extractors`]**: `UuidPath` and `ValidatedJson`

pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{BearerToken, JwtAuth, JwtClaims, JwtConfig, jwt_auth_middleware};

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks,
};

pub use http::security_headers;

pub use errors::{AppError, ErrorCode, ErrorResponse, error_response};

pub use extractors::{UuidPath, ValidatedJson};
