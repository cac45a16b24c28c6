use duet_core::{ErrorCode, RoomId, SignalMessage};
use duet_server::RelayError;

use crate::integration::{create_test_relay, init_tracing};

#[tokio::test]
async fn test_second_join_is_already_joined_even_for_same_room() {
    init_tracing();
    let (relay, signaling, conns) = create_test_relay(1).await;
    let room = RoomId::new("room1");

    relay.join(conns[0], room.clone(), None).await.unwrap();
    let same = relay.join(conns[0], room.clone(), None).await;
    let other = relay.join(conns[0], RoomId::new("room2"), None).await;

    assert_eq!(same, Err(RelayError::AlreadyJoined(room.clone())));
    assert!(matches!(other, Err(RelayError::AlreadyJoined(_))));
    assert_eq!(relay.room_members(&room), Some(vec![conns[0]]));
    assert_eq!(relay.room_count(), 1);

    signaling.clear().await;
    relay
        .handle_signal(
            conns[0],
            SignalMessage::Join {
                room_id: room,
                name: None,
            },
        )
        .await;
    assert_eq!(
        signaling.errors_for(&conns[0]).await,
        vec![ErrorCode::AlreadyJoined]
    );
}
