use serde_json::json;

use duet_client::{ClientError, SessionEvent, SessionState};
use duet_core::SignalMessage;

use crate::integration::{conn, create_test_session, init_tracing, wait_for_event};
use crate::utils::MockMedia;

#[tokio::test]
async fn test_malformed_offer_closes_with_negotiation_failure() {
    init_tracing();
    let mut t = create_test_session(MockMedia::new(), conn(2)).await;

    let result = t
        .session
        .handle_signal(SignalMessage::Offer {
            payload: json!(42),
            sender: Some(conn(1)),
        })
        .await;

    assert!(matches!(result, Err(ClientError::NegotiationFailed(_))));
    assert_eq!(t.session.state().await, SessionState::Closed);
    wait_for_event(&mut t.events, |e| {
        matches!(e, SessionEvent::Error(ClientError::NegotiationFailed(_)))
    })
    .await;
}
