use duet_core::{ErrorCode, RoomId};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::join_request;

#[tokio::test]
async fn test_third_joiner_gets_room_full_and_membership_is_unchanged() {
    init_tracing();
    let (relay, signaling, conns) = create_test_relay(3).await;
    let (a, b, c) = (conns[0], conns[1], conns[2]);
    let room = RoomId::new("room1");

    relay.handle_signal(a, join_request(&room, None)).await;
    relay.handle_signal(b, join_request(&room, None)).await;
    signaling.clear().await;

    relay.handle_signal(c, join_request(&room, None)).await;

    assert_eq!(signaling.errors_for(&c).await, vec![ErrorCode::RoomFull]);
    assert!(signaling.messages_for(&a).await.is_empty());
    assert!(signaling.messages_for(&b).await.is_empty());
    assert_eq!(relay.room_members(&room), Some(vec![a, b]));
    assert_eq!(relay.room_of(&c), None);
}
