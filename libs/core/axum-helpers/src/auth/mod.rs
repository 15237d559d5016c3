//! Bearer-token authentication.
//!
//! - [`JwtAuth`] signs and verifies HS256 tokens with issuer/audience checks
//! - [`jwt_auth_middleware`] rejects requests without a valid token and
//!   exposes [`JwtClaims`] and the raw [`BearerToken`] as request extensions
//!
//! ```ignore
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//! let protected = Router::new()
//!     .route("/me", get(handler))
//!     .layer(axum::middleware::from_fn_with_state(auth, jwt_auth_middleware));
//! ```

pub mod config;
pub mod jwt;
pub mod middleware;

pub use config::JwtConfig;
pub use jwt::{BearerToken, JwtAuth, JwtClaims};
pub use middleware::jwt_auth_middleware;
