use crate::integration::{connect, init_tracing, spawn_relay};

#[tokio::test]
async fn test_chat_outside_a_room_is_dropped() {
    init_tracing();
    let relay = spawn_relay().await;
    let (alice, _alice_events) = connect(&relay, "Alice").await;

    assert_eq!(alice.send_chat("anyone?").await, Ok(None));
    assert!(alice.chat_history().await.is_empty());

    relay.shutdown().await.unwrap();
}
