use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_helpers::{ErrorCode, error_response};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(Uuid),

    #[error("User not found: {0}")]
    UsernameNotFound(String),

    #[error("Role not found: {0}")]
    RoleNotFound(String),

    #[error("Username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("Email '{0}' is already registered")]
    DuplicateEmail(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email address has not been confirmed")]
    EmailNotConfirmed,

    #[error("Invalid email confirmation request")]
    InvalidConfirmationRequest,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            UserError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                ErrorCode::NotFound,
                format!("User {} not found", id),
            ),
            UserError::UsernameNotFound(_) | UserError::RoleNotFound(_) => {
                (StatusCode::NOT_FOUND, ErrorCode::NotFound, self.to_string())
            }
            UserError::DuplicateUsername(_) | UserError::DuplicateEmail(_) => {
                (StatusCode::CONFLICT, ErrorCode::Conflict, self.to_string())
            }
            UserError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "Invalid username or password".to_string(),
            ),
            UserError::EmailNotConfirmed | UserError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, self.to_string())
            }
            UserError::InvalidConfirmationRequest | UserError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                ErrorCode::ValidationError,
                self.to_string(),
            ),
            UserError::Forbidden(msg) => {
                tracing::info!("Forbidden: {}", msg);
                (StatusCode::FORBIDDEN, ErrorCode::Forbidden, msg.clone())
            }
            UserError::Upstream(msg) => {
                tracing::error!("Upstream error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorCode::BadGateway,
                    ErrorCode::BadGateway.default_message().to_string(),
                )
            }
            UserError::PasswordHash(msg) | UserError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalError,
                    ErrorCode::InternalError.default_message().to_string(),
                )
            }
        };

        error_response(status, message, code)
    }
}
