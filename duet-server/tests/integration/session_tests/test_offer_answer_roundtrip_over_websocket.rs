use serde_json::json;

use duet_core::SignalMessage;

use crate::integration::{init_tracing, spawn_test_server};
use crate::utils::TestClient;

#[tokio::test]
async fn test_offer_answer_roundtrip_over_websocket() {
    init_tracing();
    let server = spawn_test_server().await;
    let mut a = TestClient::connect(&server.ws_url()).await.unwrap();
    let mut b = TestClient::connect(&server.ws_url()).await.unwrap();

    assert!(a.join("room1").await.unwrap().is_empty());
    let peers = b.join("room1").await.unwrap();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].id, a.id);

    match a.recv().await.unwrap() {
        SignalMessage::PeerJoined { sender, .. } => assert_eq!(sender, b.id),
        other => panic!("Expected peer-joined, got {:?}", other),
    }

    let offer = json!({ "type": "offer", "sdp": "v=0\r\n" });
    a.send(&SignalMessage::Offer {
        payload: offer.clone(),
        sender: None,
    })
    .await
    .unwrap();
    assert_eq!(
        b.recv().await.unwrap(),
        SignalMessage::Offer {
            payload: offer,
            sender: Some(a.id)
        }
    );

    let answer = json!({ "type": "answer", "sdp": "v=0\r\n" });
    b.send(&SignalMessage::Answer {
        payload: answer.clone(),
        sender: None,
    })
    .await
    .unwrap();
    assert_eq!(
        a.recv().await.unwrap(),
        SignalMessage::Answer {
            payload: answer,
            sender: Some(b.id)
        }
    );

    a.expect_silence().await.unwrap();
    server.shutdown().await.unwrap();
}
