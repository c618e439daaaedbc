//! WebSocket connection handler.
//!
//! Authenticates the handshake, runs the per-connection read loop, and
//! translates inbound commands into service and gateway calls. Commands are
//! processed one at a time per connection, so accepted events broadcast in
//! the order they arrived.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use super::events::{parse_snowflake, ClientCommand, ServerEvent};
use super::registry::GatewayConnection;
use crate::application::services::SendMessageInput;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Handshake query parameters.
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    /// Bearer credential, verified before the upgrade completes.
    pub token: String,
}

/// WebSocket upgrade handler.
///
/// The credential is verified through the identity collaborator before the
/// upgrade: a bad token gets an HTTP error and no connection state exists.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Response {
    match state.identity.verify(&params.token).await {
        Ok(user_id) => ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)),
        Err(err) => {
            tracing::debug!(error = %err, "Gateway handshake rejected");
            err.into_response()
        }
    }
}

/// Handle one authenticated WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState, user_id: i64) {
    let (mut sender, mut receiver) = socket.split();

    // Outbound events flow through an unbounded channel so broadcasts never
    // wait on this socket's I/O.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let connection = state.gateway.connect(user_id, tx);
    let connection_id = connection.id;

    let sender_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if let Err(err) = handle_frame(&text, &connection, &state).await {
                    tracing::debug!(
                        connection_id = %connection_id,
                        user_id = user_id,
                        error = %err,
                        "Command rejected"
                    );
                    // Scoped to this connection only; never broadcast.
                    connection.send(ServerEvent::from_error(&err));
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {
                // Ping/Pong are handled by axum; binary frames are ignored.
            }
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Disconnect is the universal cancellation signal: typing cleanup and
    // presence-left broadcasts run here exactly once.
    state.gateway.disconnect(connection_id);
    sender_task.abort();

    tracing::info!(
        user_id = user_id,
        connection_id = %connection_id,
        "User disconnected"
    );
}

async fn handle_frame(
    text: &str,
    connection: &GatewayConnection,
    state: &AppState,
) -> Result<(), AppError> {
    let command: ClientCommand = serde_json::from_str(text)
        .map_err(|e| AppError::Validation(format!("Malformed command: {}", e)))?;
    dispatch_command(command, connection, state).await
}

async fn dispatch_command(
    command: ClientCommand,
    connection: &GatewayConnection,
    state: &AppState,
) -> Result<(), AppError> {
    let user_id = connection.user_id;

    match command {
        ClientCommand::JoinRoom(target) => {
            let room_id = parse_snowflake(&target.room_id, "room id")?;
            // Membership authorization first; the fanout subscription and
            // presence announcement only happen for an authorized join.
            state.services.membership.ensure_member(user_id, room_id).await?;
            state.gateway.join_room(connection.id, room_id)
        }

        ClientCommand::LeaveRoom(target) => {
            let room_id = parse_snowflake(&target.room_id, "room id")?;
            state.gateway.leave_room(connection.id, room_id)
        }

        ClientCommand::SendMessage(payload) => {
            let room_id = parse_snowflake(&payload.room_id, "room id")?;
            let parent_id = payload
                .parent_id
                .as_deref()
                .map(|raw| parse_snowflake(raw, "parent id"))
                .transpose()?;
            let input = SendMessageInput {
                kind: payload.kind,
                body: payload.body,
                track: payload.track,
                parent_id,
            };
            state.services.messages.send(room_id, user_id, input).await?;
            Ok(())
        }

        ClientCommand::AddReaction(target) => {
            let message_id = parse_snowflake(&target.message_id, "message id")?;
            state
                .services
                .reactions
                .add(user_id, message_id, &target.emoji)
                .await?;
            Ok(())
        }

        ClientCommand::RemoveReaction(target) => {
            let message_id = parse_snowflake(&target.message_id, "message id")?;
            state
                .services
                .reactions
                .remove(user_id, message_id, &target.emoji)
                .await
        }

        ClientCommand::TypingStart(target) => {
            let room_id = parse_snowflake(&target.room_id, "room id")?;
            state.gateway.typing_start(connection.id, room_id)
        }

        ClientCommand::TypingStop(target) => {
            let room_id = parse_snowflake(&target.room_id, "room id")?;
            state.gateway.typing_stop(connection.id, room_id)
        }
    }
}
