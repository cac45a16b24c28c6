use duet_core::{RoomId, SignalMessage};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::join_request;

#[tokio::test]
async fn test_first_joiner_gets_empty_peer_list() {
    init_tracing();
    let (relay, signaling, conns) = create_test_relay(1).await;
    let room = RoomId::new("room1");

    relay.handle_signal(conns[0], join_request(&room, None)).await;

    let msgs = signaling.messages_for(&conns[0]).await;
    assert_eq!(
        msgs,
        vec![SignalMessage::Joined {
            room_id: room.clone(),
            peers: vec![]
        }]
    );
    assert_eq!(relay.room_members(&room), Some(vec![conns[0]]));
}
