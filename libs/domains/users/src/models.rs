use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationError};

use crate::role::Role;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._@+-]+$").expect("valid username regex"));

static PHONE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 ().-]{7,20}$").expect("valid phone regex"));

/// User account record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Upper-cased email, kept in step with `email`
    pub normalized_email: String,
    pub phone_number: String,
    pub full_name: String,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Rotated whenever the credential changes
    #[serde(skip_serializing)]
    pub security_stamp: String,
    pub team_id: Option<Uuid>,
    pub role: Role,
    /// Role asked for at registration, pending approval
    pub requested_role: Option<Role>,
    pub email_confirmed: bool,
    #[serde(skip_serializing)]
    pub email_confirmation_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Fresh, unconfirmed account without credentials.
    pub fn new(
        username: String,
        email: String,
        full_name: String,
        phone_number: String,
        team_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            username,
            normalized_email: normalize(&email),
            email,
            phone_number,
            full_name,
            password_hash: String::new(),
            security_stamp: Uuid::new_v4().to_string(),
            team_id,
            role: Role::UnconfirmedUser,
            requested_role: None,
            email_confirmed: false,
            email_confirmation_token_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_email(&mut self, email: String) {
        self.normalized_email = normalize(&email);
        self.email = email;
    }

    pub fn normalized_username(&self) -> String {
        normalize(&self.username)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Case-insensitive lookup key for usernames and emails.
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

/// True when `value` is null, empty or whitespace.
pub fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// The candidate, trimmed, if it is non-blank and differs from `current`.
pub fn changed_value(current: &str, candidate: Option<&str>) -> Option<String> {
    candidate
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != current)
        .map(str::to_string)
}

fn validate_username(value: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("username")
            .with_message("may only contain letters, digits and . _ @ + -".into()))
    }
}

fn validate_phone_number(value: &str) -> Result<(), ValidationError> {
    if PHONE_NUMBER_RE.is_match(value.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("phone_number"))
    }
}

fn validate_blank_or_phone_number(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    validate_phone_number(value)
}

fn validate_blank_or_email(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || value.trim().validate_email() {
        Ok(())
    } else {
        Err(ValidationError::new("email"))
    }
}

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 3, max = 64), custom(function = "validate_username"))]
    pub username: String,
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    pub team_id: Option<Uuid>,
    /// Role to request; granted later by a manager
    pub role_name: Option<Role>,
    /// Where the confirmation link should point
    #[validate(url)]
    pub client_uri: Option<String>,
}

/// Sparse edit. Blank strings leave the field untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct EditUser {
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
    #[validate(custom(function = "validate_blank_or_email"), length(max = 255))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_blank_or_phone_number"))]
    pub phone_number: Option<String>,
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    pub team_id: Option<Uuid>,
    pub role_name: Option<String>,
}

/// Login request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Query of the link sent in the confirmation email
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct EmailConfirmationQuery {
    pub email: String,
    pub token: String,
}

/// Body of `PUT /user/role/{id}`; without a role the pending request is approved.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct RoleGrantRequest {
    pub role_name: Option<Role>,
}

/// Query filters for listing users
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub team_id: Option<Uuid>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

impl Default for UserFilter {
    fn default() -> Self {
        Self {
            role: None,
            team_id: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl UserFilter {
    pub fn with_role(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }

    pub fn matches(&self, user: &User) -> bool {
        self.role.is_none_or(|role| user.role == role)
            && self.team_id.is_none_or(|team| user.team_id == Some(team))
    }
}

/// Public projection of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
    pub team_id: Option<Uuid>,
    pub role_name: Role,
    pub requested_role: Option<Role>,
    pub email_confirmed: bool,
}

/// Login result: the public projection plus a bearer token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoggedInUserView {
    #[serde(flatten)]
    pub user: UserView,
    pub token: String,
}

/// Registration result
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub is_auth_successful: bool,
    pub error_message: Option<String>,
    pub user: Option<UserView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RoleView {
    /// Role identifier, e.g. `HeadCoach`
    pub id: String,
    /// Display name, e.g. `Head Coach`
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListUsersResponse {
    pub data: Vec<UserView>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The authenticated caller of a mutating operation.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    /// Forwarded to sibling services on the caller's behalf
    pub bearer_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> CreateUser {
        CreateUser {
            username: "coach.k".to_string(),
            password: "Whistle#2024".to_string(),
            full_name: "Kim Coach".to_string(),
            phone_number: "+1 (555) 010-2030".to_string(),
            email: "kim@league.test".to_string(),
            team_id: None,
            role_name: Some(Role::HeadCoach),
            client_uri: None,
        }
    }

    #[test]
    fn test_valid_registration_passes() {
        assert!(registration().validate().is_ok());
    }

    #[test]
    fn test_registration_rejects_bad_phone_and_email() {
        let mut input = registration();
        input.phone_number = "call me".to_string();
        input.email = "not-an-email".to_string();

        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("phone_number"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn test_edit_allows_blank_fields() {
        let edit = EditUser {
            email: Some("   ".to_string()),
            phone_number: Some(String::new()),
            ..Default::default()
        };
        assert!(edit.validate().is_ok());
    }

    #[test]
    fn test_edit_rejects_malformed_email() {
        let edit = EditUser {
            email: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(edit.validate().is_err());
    }

    #[test]
    fn test_changed_value() {
        assert_eq!(changed_value("Kim", None), None);
        assert_eq!(changed_value("Kim", Some("")), None);
        assert_eq!(changed_value("Kim", Some("  ")), None);
        assert_eq!(changed_value("Kim", Some("Kim")), None);
        assert_eq!(changed_value("Kim", Some(" Lee ")), Some("Lee".to_string()));
    }

    #[test]
    fn test_set_email_keeps_normalized_in_step() {
        let mut user = User::new(
            "kim".into(),
            "kim@league.test".into(),
            "Kim".into(),
            "5550102030".into(),
            None,
        );
        assert_eq!(user.normalized_email, "KIM@LEAGUE.TEST");

        user.set_email("Lee@League.test".into());
        assert_eq!(user.normalized_email, "LEE@LEAGUE.TEST");
    }

    #[test]
    fn test_filter_defaults_and_matching() {
        let filter = UserFilter::default();
        assert_eq!(filter.limit, 50);

        let mut user = User::new("p".into(), "p@l.test".into(), "P".into(), "5550102030".into(), None);
        user.role = Role::Parent;
        assert!(UserFilter::with_role(Role::Parent).matches(&user));
        assert!(!UserFilter::with_role(Role::Player).matches(&user));
    }
}
