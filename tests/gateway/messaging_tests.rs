//! Message and reaction delivery properties.

use trackroom::presentation::gateway::ServerEvent;
use trackroom::shared::error::AppError;

use crate::common::{text_input, TestApp};

/// A member's accepted message reaches every subscribed connection exactly
/// once, with matching id and body.
#[tokio::test]
async fn accepted_message_is_observed_exactly_once_per_member() {
    let app = TestApp::new();
    let room = app.create_room(1).await;
    let mut a = app.connect(1);
    let mut b = app.connect(2);
    app.join(&a, room).await;
    app.join(&b, room).await;
    a.drain();
    b.drain();

    let view = app
        .services
        .messages
        .send(room, 1, text_input("hi"))
        .await
        .unwrap();

    for client in [&mut a, &mut b] {
        let events = client.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            ServerEvent::MessageCreated(m) => {
                assert_eq!(m.id, view.id);
                assert_eq!(m.body.as_deref(), Some("hi"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}

/// Events for one room are never observed by connections subscribed only
/// to another room.
#[tokio::test]
async fn messages_never_leak_across_rooms() {
    let app = TestApp::new();
    let room_one = app.create_room(1).await;
    let room_two = app.create_room(3).await;
    let a = app.connect(1);
    let mut c = app.connect(3);
    app.join(&a, room_one).await;
    app.join(&c, room_two).await;
    c.drain();

    app.services
        .messages
        .send(room_one, 1, text_input("private to room one"))
        .await
        .unwrap();

    assert!(c.events().is_empty());
}

/// The second identical reaction is a conflict, and exactly one
/// `reaction_added` is ever broadcast.
#[tokio::test]
async fn duplicate_reaction_is_rejected_after_one_broadcast() {
    let app = TestApp::new();
    let room = app.create_room(1).await;
    let a = app.connect(1);
    let mut b = app.connect(2);
    app.join(&a, room).await;
    app.join(&b, room).await;

    let view = app
        .services
        .messages
        .send(room, 1, text_input("rate this"))
        .await
        .unwrap();
    let message_id: i64 = view.id.parse().unwrap();
    b.drain();

    app.services
        .reactions
        .add(2, message_id, "👍")
        .await
        .unwrap();
    let err = app
        .services
        .reactions
        .add(2, message_id, "👍")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    assert_eq!(b.event_names(), vec!["reaction_added"]);
}

/// Removing a reaction broadcasts to the owning room; removing one that
/// does not exist is an error with no broadcast.
#[tokio::test]
async fn reaction_removal_round_trip() {
    let app = TestApp::new();
    let room = app.create_room(1).await;
    let a = app.connect(1);
    let mut b = app.connect(2);
    app.join(&a, room).await;
    app.join(&b, room).await;

    let view = app
        .services
        .messages
        .send(room, 1, text_input("hot take"))
        .await
        .unwrap();
    let message_id: i64 = view.id.parse().unwrap();

    app.services.reactions.add(2, message_id, "🔥").await.unwrap();
    app.services
        .reactions
        .remove(2, message_id, "🔥")
        .await
        .unwrap();
    b.drain();

    let err = app
        .services
        .reactions
        .remove(2, message_id, "🔥")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(b.events().is_empty());
}

/// REST-style sends (no connection of their own) still reach duplex
/// subscribers: the write and the broadcast are one step.
#[tokio::test]
async fn rest_send_reaches_duplex_subscribers() {
    let app = TestApp::new();
    let room = app.create_room(1).await;
    let mut b = app.connect(2);
    app.join(&b, room).await;
    b.drain();

    // User 1 sends without ever opening a gateway connection.
    app.services
        .messages
        .send(room, 1, text_input("posted over http"))
        .await
        .unwrap();

    assert_eq!(b.event_names(), vec!["message_created"]);
}
