//! Moderation broadcast and history consistency properties.

use trackroom::application::services::{HistoryQuery, ModerationAction};
use trackroom::shared::error::AppError;

use crate::common::{text_input, TestApp};

/// Deleting a message notifies every room member exactly once and removes
/// it from subsequent history reads.
#[tokio::test]
async fn deleted_messages_broadcast_once_and_vanish_from_history() {
    let app = TestApp::new();
    let room = app.create_room(1).await;
    let mut a = app.connect(1);
    let mut b = app.connect(2);
    app.join(&a, room).await;
    app.join(&b, room).await;

    let view = app
        .services
        .messages
        .send(room, 2, text_input("delete me"))
        .await
        .unwrap();
    let message_id: i64 = view.id.parse().unwrap();
    a.drain();
    b.drain();

    // User 1 owns the room and may moderate.
    app.services
        .moderation
        .apply(1, room, ModerationAction::DeleteMessage, message_id, Some("spam"))
        .await
        .unwrap();

    assert_eq!(a.event_names(), vec!["message_deleted"]);
    assert_eq!(b.event_names(), vec!["message_deleted"]);

    let page = app
        .services
        .messages
        .history(room, 1, HistoryQuery::default())
        .await
        .unwrap();
    assert!(page.messages.iter().all(|m| m.id != view.id));
}

/// Muting announces the expiry to the room and blocks the target's sends
/// until it passes.
#[tokio::test]
async fn muted_users_are_announced_and_silenced() {
    let app = TestApp::new();
    let room = app.create_room(1).await;
    let a = app.connect(1);
    let mut b = app.connect(2);
    app.join(&a, room).await;
    app.join(&b, room).await;
    b.drain();

    let outcome = app
        .services
        .moderation
        .apply(1, room, ModerationAction::MuteUser, 2, None)
        .await
        .unwrap();
    assert!(outcome.muted_until.is_some());
    assert_eq!(b.event_names(), vec!["user_muted"]);

    let err = app
        .services
        .messages
        .send(room, 2, text_input("still here?"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert!(b.events().is_empty());
}

/// Clearing reactions empties the message and broadcasts to the room.
#[tokio::test]
async fn cleared_reactions_disappear_from_history() {
    let app = TestApp::new();
    let room = app.create_room(1).await;
    let a = app.connect(1);
    let mut b = app.connect(2);
    app.join(&a, room).await;
    app.join(&b, room).await;

    let view = app
        .services
        .messages
        .send(room, 1, text_input("controversial"))
        .await
        .unwrap();
    let message_id: i64 = view.id.parse().unwrap();
    app.services.reactions.add(2, message_id, "🔥").await.unwrap();
    b.drain();

    app.services
        .moderation
        .apply(1, room, ModerationAction::ClearReactions, message_id, None)
        .await
        .unwrap();
    assert_eq!(b.event_names(), vec!["reactions_cleared"]);

    let page = app
        .services
        .messages
        .history(room, 1, HistoryQuery::default())
        .await
        .unwrap();
    let message = page.messages.iter().find(|m| m.id == view.id).unwrap();
    assert!(message.reactions.is_empty());
}

/// Ordinary members cannot apply moderation actions.
#[tokio::test]
async fn plain_members_cannot_moderate() {
    let app = TestApp::new();
    let room = app.create_room(1).await;
    let a = app.connect(1);
    let b = app.connect(2);
    app.join(&a, room).await;
    app.join(&b, room).await;

    let err = app
        .services
        .moderation
        .apply(2, room, ModerationAction::MuteUser, 1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}
