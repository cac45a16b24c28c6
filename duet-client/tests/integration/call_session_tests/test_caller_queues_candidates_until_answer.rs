use crate::integration::{conn, create_test_session, init_tracing};
use crate::utils::{MockMedia, answer_from, remote_candidate};

#[tokio::test]
async fn test_caller_queues_candidates_until_answer() {
    init_tracing();
    let t = create_test_session(MockMedia::new(), conn(1)).await;

    t.session.start_call().await.unwrap();
    t.session.handle_signal(remote_candidate(1)).await.unwrap();
    assert!(t.media.remote_candidates().await.is_empty());

    t.session.handle_signal(answer_from(2)).await.unwrap();
    assert_eq!(t.media.remote_candidates().await.len(), 1);
}
