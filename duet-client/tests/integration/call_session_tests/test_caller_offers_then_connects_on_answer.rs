use duet_client::SessionState;
use duet_core::SignalMessage;

use crate::integration::{conn, create_test_session, init_tracing, wait_for_state};
use crate::utils::{MOCK_OFFER, MockMedia, answer_from};

#[tokio::test]
async fn test_caller_offers_then_connects_on_answer() {
    init_tracing();
    let mut t = create_test_session(MockMedia::new(), conn(1)).await;

    t.session.start_call().await.unwrap();
    assert_eq!(t.session.state().await, SessionState::Offering);

    match t.sink.sent().await.as_slice() {
        [SignalMessage::Offer { payload, sender }] => {
            assert_eq!(payload["sdp"], MOCK_OFFER);
            assert_eq!(*sender, None);
        }
        other => panic!("unexpected outbound messages: {:?}", other),
    }

    t.session.handle_signal(answer_from(2)).await.unwrap();
    assert_eq!(t.session.state().await, SessionState::Connected);
    assert_eq!(t.session.remote().await, Some(conn(2)));

    wait_for_state(&mut t.events, SessionState::Connected).await;
    assert_eq!(t.media.count("apply_answer").await, 1);
}
