use duet_client::{ClientError, SessionState};

use crate::integration::{conn, create_test_session, init_tracing};
use crate::utils::{MockMedia, offer_from};

#[tokio::test]
async fn test_failed_answer_send_closes_the_call() {
    init_tracing();
    let t = create_test_session(MockMedia::new(), conn(2)).await;
    t.session.handle_signal(offer_from(1)).await.unwrap();
    t.sink.break_transport();

    let result = t.session.start_call().await;

    assert_eq!(result, Err(ClientError::TransportDropped));
    assert_eq!(t.session.state().await, SessionState::Closed);
    assert_eq!(t.media.count("accept_offer").await, 1);
}
