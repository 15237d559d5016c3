//! Token issuance seam between the service and the signing library.

use axum_helpers::JwtAuth;

use crate::error::{UserError, UserResult};
use crate::models::User;

/// Issues bearer tokens carrying the user's id and role list.
#[cfg_attr(test, mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user: &User) -> UserResult<String>;
}

impl TokenIssuer for JwtAuth {
    fn issue(&self, user: &User) -> UserResult<String> {
        self.create_access_token(
            &user.id.to_string(),
            &user.username,
            &user.email,
            &user.full_name,
            &[user.role.to_string()],
        )
        .map_err(|e| UserError::Internal(format!("Failed to sign token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use axum_helpers::JwtConfig;

    #[test]
    fn test_jwt_token_carries_subject_and_role() {
        let auth = JwtAuth::new(&JwtConfig::new("token-issuer-test-secret-long-enough"));
        let mut user = User::new(
            "ac".into(),
            "ac@league.test".into(),
            "Assistant".into(),
            "5550102030".into(),
            None,
        );
        user.role = Role::AssistantCoach;

        let token = auth.issue(&user).unwrap();
        let claims = auth.verify_token(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.roles, vec!["AssistantCoach".to_string()]);
    }
}
