use crate::config::RelayConfig;
use crate::error::ServerError;
use crate::relay::Relay;
use crate::signaling::{RelayState, SignalingService, ws_handler};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn router(state: RelayState) -> Router {
    // Browser clients are usually served from a different origin than the relay.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<RelayState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "connections": state.relay.connection_count(),
        "rooms": state.relay.room_count(),
    }))
}

/// A running relay. Dropping the handle leaves the server running.
pub struct RelayHandle {
    pub addr: SocketAddr,
    relay: Relay,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<io::Result<()>>,
}

impl RelayHandle {
    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Stop accepting connections and wait for the server task to finish.
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task.await??;
        Ok(())
    }

    /// Run until the server stops on its own.
    pub async fn wait(self) -> Result<(), ServerError> {
        self.task.await??;
        Ok(())
    }
}

/// Bind the listening socket and serve the relay in a background task.
///
/// Failing to bind is the only fatal error of the relay.
pub async fn start_relay(config: RelayConfig) -> Result<RelayHandle, ServerError> {
    let listener = TcpListener::bind(config.addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.addr,
            source,
        })?;
    let addr = listener.local_addr()?;

    let signaling = SignalingService::new();
    let relay = Relay::new(&config, Arc::new(signaling.clone()));
    let state = RelayState {
        relay: relay.clone(),
        signaling,
        heartbeat: config.heartbeat.clone(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let app = router(state);
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
    });

    info!("Signaling relay listening on ws://{}/ws", addr);

    Ok(RelayHandle {
        addr,
        relay,
        shutdown: Some(shutdown_tx),
        task,
    })
}
