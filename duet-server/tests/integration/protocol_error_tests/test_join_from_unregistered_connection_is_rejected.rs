use duet_core::{ConnectionId, RoomId};
use duet_server::RelayError;

use crate::integration::{create_test_relay, init_tracing};

#[tokio::test]
async fn test_join_from_unregistered_connection_is_rejected() {
    init_tracing();
    let (relay, _signaling, _conns) = create_test_relay(0).await;

    let result = relay
        .join(ConnectionId::new(), RoomId::new("room1"), None)
        .await;

    assert!(matches!(result, Err(RelayError::InvalidMessage(_))));
    assert_eq!(relay.room_count(), 0);
}
