//! Identity verification collaborator.
//!
//! Token issuance and account management live in the platform's identity
//! service; this core only needs "given a credential, whose is it?".

use async_trait::async_trait;

use crate::shared::error::AppError;

/// Verifies a bearer credential and resolves it to a user id.
///
/// Implementations must return `Unauthorized` for anything that does not
/// verify; callers terminate the connection (gateway) or reject the
/// request (HTTP) without recording any state.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<i64, AppError>;
}
