//! Moderation Handlers

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use validator::Validate;

use crate::application::dto::request::ModerationRequest;
use crate::application::services::{ModerationAction, ModerationOutcome};
use crate::presentation::gateway::events::parse_snowflake;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Apply a moderation action in a room.
pub async fn apply_action(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(room_id): Path<String>,
    Json(body): Json<ModerationRequest>,
) -> Result<Json<ModerationOutcome>, AppError> {
    let room_id = parse_snowflake(&room_id, "room id")?;

    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let action = ModerationAction::parse(&body.action)
        .ok_or_else(|| AppError::Validation(format!("Unknown action '{}'", body.action)))?;
    let target_id = parse_snowflake(&body.target_id, "target id")?;

    let outcome = state
        .services
        .moderation
        .apply(auth.user_id, room_id, action, target_id, body.reason.as_deref())
        .await?;

    Ok(Json(outcome))
}
