use duet_client::SessionState;

use crate::integration::{conn, create_test_session, init_tracing};
use crate::utils::{MockMedia, offer_from};

#[tokio::test]
async fn test_offer_collision_lower_id_answers() {
    init_tracing();
    let t = create_test_session(MockMedia::new(), conn(1)).await;

    t.session.start_call().await.unwrap();
    t.session.handle_signal(offer_from(2)).await.unwrap();

    assert_eq!(t.session.state().await, SessionState::Connected);
    assert_eq!(t.sink.kinds().await, vec!["offer", "answer"]);
    assert_eq!(t.media.count("reset").await, 1);
}
