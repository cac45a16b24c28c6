use anyhow::{Result, bail};
use async_trait::async_trait;
use duet_client::MediaBackend;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Notify};

pub const MOCK_OFFER: &str = "v=0\r\no=- 1 1 IN IP4 127.0.0.1\r\ns=mock-offer\r\n";
pub const MOCK_ANSWER: &str = "v=0\r\no=- 2 1 IN IP4 127.0.0.1\r\ns=mock-answer\r\n";

/// Scriptable media backend that records every call it receives.
#[derive(Default)]
pub struct MockMedia {
    calls: Mutex<Vec<&'static str>>,
    remote_candidates: Mutex<Vec<Value>>,
    deny: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl MockMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `acquire_local_media` fails as if the user refused access.
    pub fn denying() -> Self {
        let media = Self::default();
        media.deny.store(true, Ordering::SeqCst);
        media
    }

    /// Make `acquire_local_media` wait until the returned handle is notified.
    pub async fn hold_acquire(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().await = Some(Arc::clone(&gate));
        gate
    }

    pub async fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().await.clone()
    }

    pub async fn count(&self, call: &str) -> usize {
        self.calls.lock().await.iter().filter(|c| **c == call).count()
    }

    pub async fn remote_candidates(&self) -> Vec<Value> {
        self.remote_candidates.lock().await.clone()
    }

    async fn record(&self, call: &'static str) {
        self.calls.lock().await.push(call);
    }
}

fn check_sdp(sdp: &str) -> Result<()> {
    if !sdp.starts_with("v=0") {
        bail!("malformed session description");
    }
    Ok(())
}

#[async_trait]
impl MediaBackend for MockMedia {
    async fn acquire_local_media(&self) -> Result<()> {
        self.record("acquire").await;

        let gate = self.gate.lock().await.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.deny.load(Ordering::SeqCst) {
            bail!("permission denied");
        }
        Ok(())
    }

    async fn create_offer(&self) -> Result<String> {
        self.record("create_offer").await;
        Ok(MOCK_OFFER.to_owned())
    }

    async fn accept_offer(&self, sdp: &str) -> Result<String> {
        self.record("accept_offer").await;
        check_sdp(sdp)?;
        Ok(MOCK_ANSWER.to_owned())
    }

    async fn apply_answer(&self, sdp: &str) -> Result<()> {
        self.record("apply_answer").await;
        check_sdp(sdp)
    }

    async fn add_remote_candidate(&self, candidate: Value) -> Result<()> {
        self.record("candidate").await;
        self.remote_candidates.lock().await.push(candidate);
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        self.record("reset").await;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record("close").await;
        Ok(())
    }
}
