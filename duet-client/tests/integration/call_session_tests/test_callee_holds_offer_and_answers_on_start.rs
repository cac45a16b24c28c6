use duet_client::{SessionEvent, SessionState};

use crate::integration::{conn, create_test_session, init_tracing, wait_for_event};
use crate::utils::{MockMedia, offer_from};

#[tokio::test]
async fn test_callee_holds_offer_and_answers_on_start() {
    init_tracing();
    let mut t = create_test_session(MockMedia::new(), conn(2)).await;

    t.session.handle_signal(offer_from(1)).await.unwrap();
    assert_eq!(t.session.state().await, SessionState::Idle);
    assert_eq!(
        wait_for_event(&mut t.events, |e| matches!(e, SessionEvent::IncomingOffer { .. })).await,
        SessionEvent::IncomingOffer {
            from: Some(conn(1))
        }
    );

    t.session.start_call().await.unwrap();

    assert_eq!(t.session.state().await, SessionState::Connected);
    assert_eq!(t.sink.kinds().await, vec!["answer"]);
    assert_eq!(t.media.count("create_offer").await, 0);
}
