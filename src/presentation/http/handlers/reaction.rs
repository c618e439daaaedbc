//! Reaction Handlers

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::AddReactionRequest;
use crate::application::dto::response::ReactionResponse;
use crate::presentation::gateway::events::parse_snowflake;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Add a reaction to a message.
pub async fn add_reaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(message_id): Path<String>,
    Json(body): Json<AddReactionRequest>,
) -> Result<(StatusCode, Json<ReactionResponse>), AppError> {
    let message_id = parse_snowflake(&message_id, "message id")?;

    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let reaction = state
        .services
        .reactions
        .add(auth.user_id, message_id, &body.emoji)
        .await?;

    Ok((StatusCode::CREATED, Json(ReactionResponse::from(reaction))))
}

/// Remove the caller's reaction from a message.
pub async fn remove_reaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((message_id, emoji)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let message_id = parse_snowflake(&message_id, "message id")?;

    state
        .services
        .reactions
        .remove(auth.user_id, message_id, &emoji)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
