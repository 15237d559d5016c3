//! Caller identity taken from the verified bearer token.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_helpers::{BearerToken, JwtClaims};
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::Actor;
use crate::role::Role;

/// Roles allowed to list users.
pub const LIST_USERS: &[Role] = &[
    Role::Admin,
    Role::LeagueManager,
    Role::HeadCoach,
    Role::AssistantCoach,
];

/// Roles allowed to edit or delete accounts, their own included.
pub const ALTER_USERS: &[Role] = &[
    Role::Admin,
    Role::LeagueManager,
    Role::HeadCoach,
    Role::AssistantCoach,
    Role::Parent,
];

/// Roles allowed to read or grant another user's role.
pub const MANAGE_ROLES: &[Role] = &[Role::Admin, Role::LeagueManager, Role::HeadCoach];

/// Authenticated caller. Requires `jwt_auth_middleware` on the route.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub roles: Vec<Role>,
    pub bearer_token: String,
}

impl CurrentUser {
    pub fn require_any(&self, allowed: &[Role]) -> UserResult<()> {
        if self.roles.iter().any(|role| allowed.contains(role)) {
            Ok(())
        } else {
            Err(UserError::Forbidden(format!(
                "Requires one of: {}",
                allowed
                    .iter()
                    .map(|role| role.display_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }

    /// Any role except UnconfirmedUser.
    pub fn require_confirmed(&self) -> UserResult<()> {
        if self.roles.iter().any(|role| role.is_confirmed()) {
            Ok(())
        } else {
            Err(UserError::Forbidden("Account role has not been confirmed".to_string()))
        }
    }

    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.id,
            bearer_token: self.bearer_token.clone(),
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = UserError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<JwtClaims>()
            .ok_or(UserError::Unauthorized)?;
        let BearerToken(token) = parts
            .extensions
            .get::<BearerToken>()
            .cloned()
            .ok_or(UserError::Unauthorized)?;

        let id = Uuid::parse_str(&claims.sub).map_err(|_| UserError::Unauthorized)?;
        let roles = claims
            .roles
            .iter()
            .filter_map(|role| role.parse().ok())
            .collect();

        Ok(Self {
            id,
            roles,
            bearer_token: token,
        })
    }
}
