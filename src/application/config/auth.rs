use super::{optional, required, ConfigResult};

/// Verification settings for sender session tokens issued by the login service.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
}

impl AuthConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            jwt_secret: required("AUTH_JWT_SECRET")?,
            jwt_issuer: optional("AUTH_JWT_ISSUER"),
        })
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"***")
            .field("jwt_issuer", &self.jwt_issuer)
            .finish()
    }
}
