use duet_core::SignalMessage;

use crate::integration::{init_tracing, spawn_test_server};
use crate::utils::TestClient;

#[tokio::test]
async fn test_closing_socket_notifies_peer() {
    init_tracing();
    let server = spawn_test_server().await;
    let mut a = TestClient::connect(&server.ws_url()).await.unwrap();
    let mut b = TestClient::connect(&server.ws_url()).await.unwrap();
    a.join("room1").await.unwrap();
    b.join("room1").await.unwrap();
    let _ = a.recv().await.unwrap();

    let b_id = b.id;
    b.close().await.unwrap();

    assert_eq!(
        a.recv().await.unwrap(),
        SignalMessage::PeerLeft { sender: b_id }
    );
    a.expect_silence().await.unwrap();

    server.shutdown().await.unwrap();
}
