//! Authentication Middleware
//!
//! Bearer-token validation for protected routes, delegated to the
//! identity collaborator.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::shared::error::AppError;
use crate::startup::AppState;

/// Authenticated user attached to the request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
}

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))
}

/// Resolve the bearer token to a user before the handler runs.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?.to_owned();
    let user_id = state.identity.verify(&token).await?;
    request.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(request).await)
}
