//! Credential handling behind a narrow interface.
//!
//! The store mutates the in-memory [`User`] record only; persisting the
//! result is the repository's job, so a credential change and its
//! side effects land in one commit.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::User;

#[cfg_attr(test, mockall::automock)]
pub trait IdentityStore: Send + Sync {
    /// Checks the password policy and sets the initial credential.
    fn create_account(&self, user: &mut User, password: &str) -> UserResult<()>;

    /// `Ok(false)` on mismatch; errors only on a corrupt stored hash.
    fn verify_credential(&self, user: &User, password: &str) -> UserResult<bool>;

    /// Re-verifies `old_password`, applies the policy to `new_password`,
    /// then replaces the credential and rotates the security stamp.
    fn change_password(&self, user: &mut User, old_password: &str, new_password: &str)
    -> UserResult<()>;

    /// Issues a single-use confirmation token; only its digest is kept.
    fn issue_email_confirmation_token(&self, user: &mut User) -> String;

    /// Marks the email confirmed when `token` matches the pending one.
    fn confirm_email(&self, user: &mut User, token: &str) -> UserResult<()>;
}

/// Argon2id credentials with sha256-digested confirmation tokens.
#[derive(Debug, Default, Clone)]
pub struct Argon2IdentityStore {
    argon2: Argon2<'static>,
}

impl Argon2IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn hash_password(&self, password: &str) -> UserResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::PasswordHash(e.to_string()))
    }

    fn validate_password(password: &str) -> UserResult<()> {
        let rules: [(bool, &str); 6] = [
            (password.chars().count() >= 8, "Password must be at least 8 characters"),
            (password.chars().count() <= 128, "Password cannot exceed 128 characters"),
            (
                password.chars().any(char::is_uppercase),
                "Password must contain at least one uppercase letter",
            ),
            (
                password.chars().any(char::is_lowercase),
                "Password must contain at least one lowercase letter",
            ),
            (
                password.chars().any(|c| c.is_ascii_digit()),
                "Password must contain at least one digit",
            ),
            (
                password.chars().any(|c| !c.is_alphanumeric()),
                "Password must contain at least one special character",
            ),
        ];

        match rules.iter().find(|(ok, _)| !ok) {
            Some((_, message)) => Err(UserError::Validation((*message).to_string())),
            None => Ok(()),
        }
    }
}

fn token_digest(token: &str) -> String {
    const_hex::encode(Sha256::digest(token.as_bytes()))
}

impl IdentityStore for Argon2IdentityStore {
    fn create_account(&self, user: &mut User, password: &str) -> UserResult<()> {
        Self::validate_password(password)?;
        user.password_hash = self.hash_password(password)?;
        Ok(())
    }

    fn verify_credential(&self, user: &User, password: &str) -> UserResult<bool> {
        if user.password_hash.is_empty() {
            return Ok(false);
        }

        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| UserError::PasswordHash(e.to_string()))?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    fn change_password(
        &self,
        user: &mut User,
        old_password: &str,
        new_password: &str,
    ) -> UserResult<()> {
        if !self.verify_credential(user, old_password)? {
            return Err(UserError::InvalidCredentials);
        }

        Self::validate_password(new_password)?;
        user.password_hash = self.hash_password(new_password)?;
        user.security_stamp = Uuid::new_v4().to_string();

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    fn issue_email_confirmation_token(&self, user: &mut User) -> String {
        let bytes: [u8; 32] = std::array::from_fn(|_| rand::random::<u8>());
        let token = const_hex::encode(bytes);

        user.email_confirmation_token_hash = Some(token_digest(&token));
        token
    }

    fn confirm_email(&self, user: &mut User, token: &str) -> UserResult<()> {
        match user.email_confirmation_token_hash.as_deref() {
            Some(expected) if expected == token_digest(token) => {
                user.email_confirmed = true;
                user.email_confirmation_token_hash = None;
                Ok(())
            }
            _ => Err(UserError::InvalidConfirmationRequest),
        }
    }
}
