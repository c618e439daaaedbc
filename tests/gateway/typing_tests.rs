//! Typing indicator and disconnect cleanup properties.

use std::time::Duration;

use trackroom::presentation::gateway::TYPING_TTL;

use crate::common::TestApp;

/// With no further activity, observers see exactly one
/// `user_typing(false)` once the expiry elapses.
#[tokio::test(start_paused = true)]
async fn typing_expires_after_five_seconds_of_inactivity() {
    let app = TestApp::new();
    let room = app.create_room(1).await;
    let a = app.connect(1);
    let mut b = app.connect(2);
    app.join(&a, room).await;
    app.join(&b, room).await;
    b.drain();

    app.gateway.typing_start(a.connection.id, room).unwrap();
    tokio::task::yield_now().await;
    assert_eq!(b.event_names(), vec!["user_typing"]);

    tokio::time::sleep(TYPING_TTL + Duration::from_millis(100)).await;

    let events = b.event_names();
    assert_eq!(events, vec!["user_typing"]);

    // Quiet afterwards: the expiry fired exactly once.
    tokio::time::sleep(TYPING_TTL).await;
    assert!(b.events().is_empty());
}

/// Disconnecting mid-typing yields both `user_typing(false)` and
/// `user_left`, and nothing references the dead connection afterwards.
#[tokio::test(start_paused = true)]
async fn disconnect_cleans_up_typing_and_presence() {
    let app = TestApp::new();
    let room = app.create_room(1).await;
    let a = app.connect(1);
    let mut b = app.connect(2);
    app.join(&a, room).await;
    app.join(&b, room).await;

    app.gateway.typing_start(a.connection.id, room).unwrap();
    tokio::task::yield_now().await;
    b.drain();

    app.gateway.disconnect(a.connection.id);
    assert_eq!(b.event_names(), vec!["user_typing", "user_left"]);

    // The pending expiry task and a repeat disconnect stay silent.
    tokio::time::sleep(TYPING_TTL + Duration::from_secs(1)).await;
    app.gateway.disconnect(a.connection.id);
    assert!(b.events().is_empty());
}

/// A fresh `typing_start` keeps the indicator alive past the original
/// expiry without a second `user_typing(true)`.
#[tokio::test(start_paused = true)]
async fn repeat_typing_start_extends_the_indicator() {
    let app = TestApp::new();
    let room = app.create_room(1).await;
    let a = app.connect(1);
    let mut b = app.connect(2);
    app.join(&a, room).await;
    app.join(&b, room).await;
    b.drain();

    app.gateway.typing_start(a.connection.id, room).unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;
    app.gateway.typing_start(a.connection.id, room).unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    // 6 seconds after the first start, only the initial broadcast arrived.
    assert_eq!(b.event_names(), vec!["user_typing"]);

    tokio::time::sleep(TYPING_TTL).await;
    assert_eq!(b.event_names(), vec!["user_typing"]);
}
