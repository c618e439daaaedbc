//! JWT implementation of the identity collaborator.
//!
//! Verifies HMAC-signed tokens issued by the platform's identity service
//! and resolves the `sub` claim to a user id. No placeholder identities:
//! every credential is actually verified.

use async_trait::async_trait;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

use crate::domain::services::IdentityVerifier;
use crate::shared::error::AppError;

/// JWT claims structure
#[derive(Debug, Deserialize)]
struct Claims {
    /// Subject (user ID)
    sub: String,
    /// Expiration time (Unix timestamp)
    #[allow(dead_code)]
    exp: i64,
}

/// Verifies bearer tokens signed with the shared HMAC secret.
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
}

impl JwtIdentityVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<i64, AppError> {
        let token_data = decode::<Claims>(credential, &self.decoding_key, &Validation::default())
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token expired".into())
                }
                _ => AppError::Unauthorized("Invalid token".into()),
            })?;

        token_data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Unauthorized("Invalid token claims".into()))
    }
}
