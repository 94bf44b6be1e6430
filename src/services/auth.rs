use crate::core::error::AuthError;
use crate::core::ports::IdentityResolver;
use crate::models::UserId;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

const BEARER_PREFIX: &str = "Bearer ";

/// Claims carried by access tokens; `sub` is the user id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub iat: Option<usize>,
}

/// Resolves HS256 access tokens issued by the account service
pub struct JwtIdentityResolver {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityResolver {
    /// Build from a base64 encoded secret
    pub fn from_base64_secret(secret: &str) -> Result<Self, AuthError> {
        let key = DecodingKey::from_base64_secret(secret).map_err(|e| AuthError::Key(e.to_string()))?;

        Ok(Self {
            key,
            validation: Validation::new(Algorithm::HS256),
        })
    }
}

impl IdentityResolver for JwtIdentityResolver {
    fn resolve(&self, credential: &str) -> Result<UserId, AuthError> {
        let token = credential
            .strip_prefix(BEARER_PREFIX)
            .unwrap_or(credential)
            .trim();

        if token.is_empty() {
            return Err(AuthError::Missing);
        }

        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::Invalid(e.to_string()))?;

        data.claims
            .sub
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| AuthError::Invalid(format!("subject is not a user id: {}", data.claims.sub)))
    }
}
