//! Message Handlers

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::{MessageHistoryQuery, SendMessageRequest};
use crate::application::dto::response::{MessagePage, MessageView};
use crate::application::services::{HistoryQuery, SendMessageInput};
use crate::presentation::gateway::events::parse_snowflake;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn parse_cursor(raw: Option<&str>) -> Result<Option<i64>, AppError> {
    raw.map(|c| {
        c.parse::<i64>()
            .map_err(|_| AppError::Validation("Invalid cursor".into()))
    })
    .transpose()
}

/// Cursor-paginated room history.
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(room_id): Path<String>,
    Query(query): Query<MessageHistoryQuery>,
) -> Result<Json<MessagePage>, AppError> {
    let room_id = parse_snowflake(&room_id, "room id")?;

    let history = HistoryQuery {
        before: parse_cursor(query.before.as_deref())?,
        after: parse_cursor(query.after.as_deref())?,
        limit: query.limit,
    };

    let page = state
        .services
        .messages
        .history(room_id, auth.user_id, history)
        .await?;
    Ok(Json(page))
}

/// Send a message to a room.
///
/// Triggers the identical room-scoped broadcast as the duplex path: both
/// go through the message service.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(room_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageView>), AppError> {
    let room_id = parse_snowflake(&room_id, "room id")?;

    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let parent_id = body
        .parent_id
        .as_deref()
        .map(|raw| parse_snowflake(raw, "parent id"))
        .transpose()?;

    let input = SendMessageInput {
        kind: body.kind,
        body: body.body,
        track: body.track,
        parent_id,
    };

    let view = state
        .services
        .messages
        .send(room_id, auth.user_id, input)
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}
