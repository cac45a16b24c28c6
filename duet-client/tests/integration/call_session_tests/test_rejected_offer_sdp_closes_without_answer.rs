use serde_json::json;

use duet_client::{ClientError, SessionState};
use duet_core::SignalMessage;

use crate::integration::{conn, create_test_session, init_tracing};
use crate::utils::MockMedia;

#[tokio::test]
async fn test_rejected_offer_sdp_closes_without_answer() {
    init_tracing();
    let t = create_test_session(MockMedia::new(), conn(2)).await;

    t.session
        .handle_signal(SignalMessage::Offer {
            payload: json!("garbage that is not sdp"),
            sender: Some(conn(1)),
        })
        .await
        .unwrap();
    let result = t.session.start_call().await;

    assert!(matches!(result, Err(ClientError::NegotiationFailed(_))));
    assert_eq!(t.session.state().await, SessionState::Closed);
    assert!(t.sink.sent().await.is_empty());
}
