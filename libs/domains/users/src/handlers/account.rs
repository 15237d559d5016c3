use axum::{
    Json,
    extract::{Query, State},
};
use axum_helpers::{
    ValidatedJson,
    errors::responses::{BadRequestValidationResponse, ConflictResponse, UnauthorizedResponse},
};
use std::sync::Arc;

use crate::error::UserResult;
use crate::models::{
    AuthResponse, CreateUser, EmailConfirmationQuery, LoggedInUserView, LoginRequest,
    MessageResponse,
};
use crate::repository::UserRepository;
use crate::service::UserService;

pub const TAG: &str = "account";

/// Register a new account
#[utoipa::path(
    post,
    path = "/account/create",
    tag = TAG,
    request_body = CreateUser,
    responses(
        (status = 200, description = "Account created; confirmation email queued", body = AuthResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse)
    )
)]
pub async fn create_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> UserResult<Json<AuthResponse>> {
    let response = service.create_user(input).await?;
    Ok(Json(response))
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/account/login",
    tag = TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoggedInUserView),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
pub async fn login<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> UserResult<Json<LoggedInUserView>> {
    let user = service.authenticate(&input.username, &input.password).await?;
    Ok(Json(service.login_user(&user)?))
}

/// Confirm an email address from the link sent at registration
#[utoipa::path(
    get,
    path = "/account/emailconfirmation",
    tag = TAG,
    params(EmailConfirmationQuery),
    responses(
        (status = 200, description = "Email confirmed", body = MessageResponse),
        (status = 400, response = BadRequestValidationResponse)
    )
)]
pub async fn confirm_email<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Query(query): Query<EmailConfirmationQuery>,
) -> UserResult<Json<MessageResponse>> {
    service.confirm_email(query).await?;
    Ok(Json(MessageResponse::new("Email confirmed")))
}
