//! Room Handlers

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::CreateRoomRequest;
use crate::application::dto::response::{MembershipResponse, RoomResponse};
use crate::domain::entities::RoomVisibility;
use crate::presentation::gateway::events::parse_snowflake;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Create a room; the caller becomes its owner.
pub async fn create_room(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomResponse>), AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let visibility = match body.visibility.as_deref() {
        None | Some("public") => RoomVisibility::Public,
        Some("private") => RoomVisibility::Private,
        Some(other) => {
            return Err(AppError::Validation(format!(
                "Unknown visibility '{}'",
                other
            )))
        }
    };

    let room = state
        .services
        .membership
        .create_room(auth.user_id, body.name, body.description, visibility)
        .await?;

    Ok((StatusCode::CREATED, Json(RoomResponse::from(room))))
}

/// Fetch a room (membership-gated for private rooms).
pub async fn get_room(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    let room_id = parse_snowflake(&room_id, "room id")?;
    let (room, _) = state
        .services
        .membership
        .authorize_member(auth.user_id, room_id)
        .await?;
    Ok(Json(RoomResponse::from(room)))
}

/// Join a room.
pub async fn join_room(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(room_id): Path<String>,
) -> Result<(StatusCode, Json<MembershipResponse>), AppError> {
    let room_id = parse_snowflake(&room_id, "room id")?;
    let membership = state.services.membership.join(auth.user_id, room_id).await?;
    Ok((StatusCode::CREATED, Json(MembershipResponse::from(membership))))
}

/// Leave a room.
pub async fn leave_room(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(room_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let room_id = parse_snowflake(&room_id, "room id")?;
    state.services.membership.leave(auth.user_id, room_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
