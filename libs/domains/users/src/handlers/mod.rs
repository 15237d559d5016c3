//! HTTP surface of the users domain.
//!
//! `/account/*` is public; everything under `/user` requires a bearer token
//! verified by [`jwt_auth_middleware`].

pub mod account;
pub mod auth;
pub mod users;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use axum_helpers::{
    JwtAuth,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, ForbiddenResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
    jwt_auth_middleware,
};
use std::sync::Arc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::models::{
    AuthResponse, CreateUser, EditUser, EmailConfirmationQuery, ListUsersResponse,
    LoggedInUserView, LoginRequest, MessageResponse, RoleGrantRequest, RoleView, UserFilter,
    UserView,
};
use crate::repository::UserRepository;
use crate::role::Role;
use crate::service::UserService;

pub use auth::CurrentUser;

/// OpenAPI documentation for the users API
#[derive(OpenApi)]
#[openapi(
    paths(
        account::create_user,
        account::login,
        account::confirm_email,
        users::list_users,
        users::get_user,
        users::get_user_by_username,
        users::get_user_role,
        users::edit_user,
        users::edit_user_role,
        users::delete_user,
        users::get_roles,
        users::get_role_by_id,
    ),
    components(
        schemas(
            AuthResponse,
            CreateUser,
            EditUser,
            EmailConfirmationQuery,
            ListUsersResponse,
            LoggedInUserView,
            LoginRequest,
            MessageResponse,
            Role,
            RoleGrantRequest,
            RoleView,
            UserFilter,
            UserView,
        ),
        responses(
            BadRequestValidationResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            NotFoundResponse,
            ConflictResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = account::TAG, description = "Registration, login and email confirmation"),
        (name = users::TAG, description = "User and role management")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the users router: `/account/*` and `/user/*`
pub fn router<R: UserRepository + 'static>(service: UserService<R>, jwt: JwtAuth) -> Router {
    let shared_service = Arc::new(service);

    let account = Router::new()
        .route("/create", post(account::create_user))
        .route("/login", post(account::login))
        .route("/emailconfirmation", get(account::confirm_email))
        .with_state(shared_service.clone());

    let user = Router::new()
        .route("/", get(users::list_users))
        .route("/roles", get(users::get_roles))
        .route("/roles/{id}", get(users::get_role_by_id))
        .route("/username/{username}", get(users::get_user_by_username))
        .route(
            "/role/{id}",
            get(users::get_user_role).put(users::edit_user_role),
        )
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::edit_user)
                .delete(users::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(jwt, jwt_auth_middleware))
        .with_state(shared_service);

    Router::new().nest("/account", account).nest("/user", user)
}
