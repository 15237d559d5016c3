use axum::{
    Json,
    extract::{Path, Query, State},
};
use axum_helpers::{
    UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, ForbiddenResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
};
use std::sync::Arc;

use super::auth::{ALTER_USERS, CurrentUser, LIST_USERS, MANAGE_ROLES};
use crate::error::{UserError, UserResult};
use crate::models::{
    EditUser, ListUsersResponse, MessageResponse, RoleGrantRequest, RoleView, UserFilter, UserView,
};
use crate::repository::UserRepository;
use crate::service::UserService;

pub const TAG: &str = "users";

/// List users with optional filters
#[utoipa::path(
    get,
    path = "/user",
    tag = TAG,
    params(UserFilter),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Page of users", body = ListUsersResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
pub async fn list_users<R: UserRepository>(
    caller: CurrentUser,
    State(service): State<Arc<UserService<R>>>,
    Query(filter): Query<UserFilter>,
) -> UserResult<Json<ListUsersResponse>> {
    caller.require_any(LIST_USERS)?;
    Ok(Json(service.list_users(filter).await?))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/user/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "User ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User found", body = UserView),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
pub async fn get_user<R: UserRepository>(
    caller: CurrentUser,
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<UserView>> {
    caller.require_confirmed()?;
    service
        .get_user_by_id(id)
        .await?
        .map(Json)
        .ok_or(UserError::NotFound(id))
}

/// Get a user by username
#[utoipa::path(
    get,
    path = "/user/username/{username}",
    tag = TAG,
    params(("username" = String, Path, description = "Username, case-insensitive")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User found", body = UserView),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
pub async fn get_user_by_username<R: UserRepository>(
    caller: CurrentUser,
    State(service): State<Arc<UserService<R>>>,
    Path(username): Path<String>,
) -> UserResult<Json<UserView>> {
    caller.require_confirmed()?;
    service
        .get_user_by_username(&username)
        .await?
        .map(Json)
        .ok_or(UserError::UsernameNotFound(username))
}

/// Get a user's current role
#[utoipa::path(
    get,
    path = "/user/role/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "User ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current role", body = RoleView),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
pub async fn get_user_role<R: UserRepository>(
    caller: CurrentUser,
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<RoleView>> {
    caller.require_any(MANAGE_ROLES)?;
    service
        .get_user_role(id)
        .await?
        .map(|role| Json(role.into()))
        .ok_or(UserError::NotFound(id))
}

/// Edit a user. Blank fields are left unchanged.
#[utoipa::path(
    put,
    path = "/user/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = EditUser,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User updated", body = UserView),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
pub async fn edit_user<R: UserRepository>(
    caller: CurrentUser,
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<EditUser>,
) -> UserResult<Json<UserView>> {
    caller.require_any(ALTER_USERS)?;
    let user = service.edit_user(id, input, &caller.actor()).await?;
    Ok(Json(user))
}

/// Grant a role, or approve the pending request when `role_name` is absent
#[utoipa::path(
    put,
    path = "/user/role/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = RoleGrantRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Role granted", body = UserView),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
pub async fn edit_user_role<R: UserRepository>(
    caller: CurrentUser,
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<RoleGrantRequest>,
) -> UserResult<Json<UserView>> {
    caller.require_any(MANAGE_ROLES)?;
    let actor = caller.actor();

    let user = match input.role_name {
        Some(role) => service.add_user_role(id, role, &actor).await?,
        None => service.approve_user_role(id, &actor).await?,
    };
    Ok(Json(user))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/user/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "User ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
pub async fn delete_user<R: UserRepository>(
    caller: CurrentUser,
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<MessageResponse>> {
    caller.require_any(ALTER_USERS)?;
    service.delete_user(id, &caller.actor()).await?;
    Ok(Json(MessageResponse::new(format!("User {} deleted", id))))
}

/// List every role
#[utoipa::path(
    get,
    path = "/user/roles",
    tag = TAG,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All roles", body = Vec<RoleView>))
)]
pub async fn get_roles<R: UserRepository>(
    _caller: CurrentUser,
    State(service): State<Arc<UserService<R>>>,
) -> Json<Vec<RoleView>> {
    Json(service.get_roles())
}

/// Look up a role by identifier or display name
#[utoipa::path(
    get,
    path = "/user/roles/{id}",
    tag = TAG,
    params(("id" = String, Path, description = "Role identifier, e.g. HeadCoach")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Role found", body = RoleView),
        (status = 404, response = NotFoundResponse)
    )
)]
pub async fn get_role_by_id<R: UserRepository>(
    _caller: CurrentUser,
    State(service): State<Arc<UserService<R>>>,
    Path(id): Path<String>,
) -> UserResult<Json<RoleView>> {
    service
        .get_role_by_id(&id)
        .map(Json)
        .ok_or(UserError::RoleNotFound(id))
}
