use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::application::config::auth::AuthConfig;
use crate::application::error::{AppError, Result};

/// Random bytes behind an invite's secret token (rendered as hex).
pub const SECRET_TOKEN_BYTES: usize = 24;

const SESSION_TOKEN_EXPIRE: i64 = 3600; // 1 hour

/// Claims of a sender session token issued by the login service
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Sender user id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// HS256 keys for sender session tokens, built once from [`AuthConfig`].
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: Option<String>,
}

impl SessionKeys {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
        }
    }

    /// Decode and validate a session token
    pub fn decode_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        let token_data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(token_data.claims)
    }

    /// Issue a session token. The login service normally does this; the
    /// server only uses it in tooling and tests.
    pub fn create_token(&self, user_id: i64, email: Option<&str>) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            email: email.map(String::from),
            exp: (now + Duration::seconds(SESSION_TOKEN_EXPIRE)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AppError::from)
    }
}

/// Generate a cryptographically secure random string (hex)
pub fn generate_random_string(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rand::rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}

/// Longest token any generator may hand out; longer input never hits the database.
pub const MAX_TOKEN_LEN: usize = 128;

/// Source of opaque, unguessable invite tokens.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;

    /// Whether `token` could have come from this generator. Tokens failing
    /// this are answered exactly as unknown ones.
    fn accepts(&self, token: &str) -> bool {
        !token.is_empty() && token.len() <= MAX_TOKEN_LEN
    }
}

/// Default generator: 24 bytes from the thread-local CSPRNG, hex encoded.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> String {
        generate_random_string(SECRET_TOKEN_BYTES)
    }

    fn accepts(&self, token: &str) -> bool {
        is_well_formed_token(token)
    }
}

/// Cheap shape check so obviously malformed tokens skip the database.
/// Callers must answer exactly as for an unknown token.
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == SECRET_TOKEN_BYTES * 2 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn keys(issuer: Option<&str>) -> SessionKeys {
        SessionKeys::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: issuer.map(String::from),
        })
    }

    #[test]
    fn test_generated_tokens_are_unique_and_well_formed() {
        let generator = RandomTokenGenerator;
        let tokens: HashSet<String> = (0..500).map(|_| generator.generate()).collect();

        assert_eq!(tokens.len(), 500);
        assert!(tokens.iter().all(|t| is_well_formed_token(t)));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        assert!(!is_well_formed_token(""));
        assert!(!is_well_formed_token("abc"));
        assert!(!is_well_formed_token(&"z".repeat(48)));
        assert!(!is_well_formed_token(&"a".repeat(49)));
        assert!(is_well_formed_token(&"a1".repeat(24)));
    }

    struct Prefixed;

    impl TokenGenerator for Prefixed {
        fn generate(&self) -> String {
            format!("tok-{}", generate_random_string(8))
        }
    }

    #[test]
    fn test_default_acceptance_is_shape_agnostic() {
        let generator = Prefixed;
        assert!(generator.accepts(&generator.generate()));
        assert!(!generator.accepts(""));
        assert!(!generator.accepts(&"x".repeat(MAX_TOKEN_LEN + 1)));
        assert!(!RandomTokenGenerator.accepts(&generator.generate()));
    }

    #[test]
    fn test_session_token_round_trip() {
        let keys = keys(Some("login"));
        let token = keys.create_token(42, Some("sender@example.com")).unwrap();
        let claims = keys.decode_token(&token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email.as_deref(), Some("sender@example.com"));
    }

    #[test]
    fn test_session_token_wrong_secret_rejected() {
        let token = keys(None).create_token(1, None).unwrap();
        let other = SessionKeys::new(&AuthConfig {
            jwt_secret: "another-secret".to_string(),
            jwt_issuer: None,
        });

        assert!(matches!(other.decode_token(&token), Err(AppError::Jwt(_))));
    }

    #[test]
    fn test_session_token_issuer_checked() {
        let token = keys(Some("someone-else")).create_token(1, None).unwrap();
        assert!(keys(Some("login")).decode_token(&token).is_err());
    }
}
