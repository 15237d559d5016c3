use super::config::JwtConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,        // Subject (user ID)
    pub username: String,   // Login name
    pub email: String,      // User email
    pub name: String,       // Display name
    pub roles: Vec<String>, // Granted roles
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// The raw token the request was authenticated with.
///
/// Forwarded on calls to sibling services that accept the same tokens.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Stateless HS256 token issuer/validator
#[derive(Clone)]
pub struct JwtAuth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwtAuth {
    pub fn new(config: &JwtConfig) -> Self {
        tracing::info!(issuer = %config.issuer, audience = %config.audience, "JWT auth initialized");
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::minutes(config.expiry_minutes),
        }
    }

    /// Signs an access token for the given subject.
    pub fn create_access_token(
        &self,
        user_id: &str,
        username: &str,
        email: &str,
        name: &str,
        roles: &[String],
    ) -> eyre::Result<String> {
        self.create_token(user_id, username, email, name, roles, self.ttl)
    }

    fn create_token(
        &self,
        user_id: &str,
        username: &str,
        email: &str,
        name: &str,
        roles: &[String],
        ttl: Duration,
    ) -> eyre::Result<String> {
        let now = Utc::now();

        let claims = JwtClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            roles: roles.to_vec(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Checks signature, expiry, issuer and audience, returning the claims.
    pub fn verify_token(&self, token: &str) -> eyre::Result<JwtClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new("unit-test-secret-that-is-long-enough!!"))
    }

    #[test]
    fn test_token_round_trip_keeps_roles() {
        let auth = auth();
        let token = auth
            .create_access_token("42", "coach", "coach@league.test", "Head Coach", &["HeadCoach".to_string()])
            .unwrap();

        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.username, "coach");
        assert_eq!(claims.roles, vec!["HeadCoach".to_string()]);
        assert_eq!(claims.iss, "league-users");
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let other = JwtAuth::new(&JwtConfig::new("another-secret-that-is-long-enough-too"));
        let token = other
            .create_access_token("1", "u", "u@league.test", "U", &[])
            .unwrap();

        assert!(auth().verify_token(&token).is_err());
    }

    #[test]
    fn test_token_for_other_audience_is_rejected() {
        let mut config = JwtConfig::new("unit-test-secret-that-is-long-enough!!");
        config.audience = "billing".to_string();
        let token = JwtAuth::new(&config)
            .create_access_token("1", "u", "u@league.test", "U", &[])
            .unwrap();

        assert!(auth().verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let auth = auth();
        let token = auth
            .create_token("1", "u", "u@league.test", "U", &[], Duration::minutes(-10))
            .unwrap();

        assert!(auth.verify_token(&token).is_err());
    }
}
