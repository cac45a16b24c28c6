use duet_core::{ErrorCode, SignalMessage};

use crate::integration::{init_tracing, spawn_test_server};
use crate::utils::TestClient;

#[tokio::test]
async fn test_malformed_frame_is_reported_and_connection_survives() {
    init_tracing();
    let server = spawn_test_server().await;
    let mut a = TestClient::connect(&server.ws_url()).await.unwrap();

    a.send_raw("{not json").await.unwrap();
    match a.recv().await.unwrap() {
        SignalMessage::Error { code, .. } => assert_eq!(code, ErrorCode::InvalidMessage),
        other => panic!("Expected error, got {:?}", other),
    }

    a.send_raw(r#"{"type":"dance"}"#).await.unwrap();
    match a.recv().await.unwrap() {
        SignalMessage::Error { code, .. } => assert_eq!(code, ErrorCode::InvalidMessage),
        other => panic!("Expected error, got {:?}", other),
    }

    assert!(a.join("still-here").await.unwrap().is_empty());
    server.shutdown().await.unwrap();
}
