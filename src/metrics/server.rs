//! HTTP exporter for stream metrics and health.
//!
//! `/metrics` serves the Prometheus registry. `/health` reports the
//! state of the frame stream: `waiting` until the first frame pair is
//! compared, `streaming` afterwards, and `degraded` (503) while the
//! most recent frame is failing.

use crate::metrics::{MetricsError, MetricsRegistry, MetricsSnapshot};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// Errors that can occur during metrics server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not bind.
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    /// The runtime or the server itself failed.
    #[error("server error: {0}")]
    Server(String),
}

/// Configuration for the metrics server.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self::with_port(9090)
    }
}

impl MetricsServerConfig {
    /// Creates a config listening on all interfaces at `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

/// Condition of the frame stream as reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamHealth {
    /// No frame pair has been compared yet.
    #[default]
    Waiting,
    /// The latest frame was processed.
    Streaming,
    /// The latest frame was rejected by the emulator.
    Degraded,
}

impl StreamHealth {
    /// Derives the stream condition from a metrics snapshot.
    pub fn from_snapshot(snapshot: &MetricsSnapshot) -> Self {
        if snapshot.last_frame_failed {
            StreamHealth::Degraded
        } else if snapshot.frames_processed == 0 {
            StreamHealth::Waiting
        } else {
            StreamHealth::Streaming
        }
    }

    /// Returns the lowercase name used in the response body.
    pub fn as_str(self) -> &'static str {
        match self {
            StreamHealth::Waiting => "waiting",
            StreamHealth::Streaming => "streaming",
            StreamHealth::Degraded => "degraded",
        }
    }

    /// Returns the HTTP status for this condition.
    pub fn status_code(self) -> StatusCode {
        match self {
            StreamHealth::Degraded => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::OK,
        }
    }
}

/// Registry and stream condition shared with the HTTP handlers.
pub struct MetricsState {
    registry: MetricsRegistry,
    health: StreamHealth,
    last_sequence: u64,
}

impl MetricsState {
    /// Updates the metrics and stream condition from a snapshot.
    pub fn update(&mut self, snapshot: &MetricsSnapshot) {
        self.registry.update(snapshot);
        self.health = StreamHealth::from_snapshot(snapshot);
        self.last_sequence = snapshot.last_sequence;
    }

    /// Returns the stream condition of the latest update.
    pub fn health(&self) -> StreamHealth {
        self.health
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        self.registry.encode()
    }
}

/// HTTP server exposing stream metrics and health.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: Arc<RwLock<MetricsState>>,
}

impl MetricsServer {
    /// Creates a new metrics server.
    pub fn new(config: MetricsServerConfig, registry: MetricsRegistry) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(MetricsState {
                registry,
                health: StreamHealth::Waiting,
                last_sequence: 0,
            })),
        }
    }

    /// Returns the shared state the frame loop updates.
    pub fn state(&self) -> Arc<RwLock<MetricsState>> {
        Arc::clone(&self.state)
    }

    /// Serves until the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Metrics server listening");

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))
    }

    /// Runs the server on its own thread and runtime so a synchronous
    /// frame loop can keep updating [`MetricsServer::state`].
    ///
    /// A server that fails to start or stops with an error logs it
    /// before the thread exits.
    pub fn spawn(self) -> JoinHandle<Result<(), ServerError>> {
        let addr = self.config.bind_addr;
        std::thread::spawn(move || {
            let result = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .map_err(|e| ServerError::Server(e.to_string()))
                .and_then(|runtime| runtime.block_on(self.run()));

            if let Err(e) = &result {
                tracing::error!(%addr, "Metrics server stopped: {}", e);
            }
            result
        })
    }
}

async fn metrics_handler(State(state): State<Arc<RwLock<MetricsState>>>) -> impl IntoResponse {
    let state = state.read().await;

    match state.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

async fn health_handler(State(state): State<Arc<RwLock<MetricsState>>>) -> impl IntoResponse {
    let state = state.read().await;
    let health = state.health();
    (
        health.status_code(),
        format!("{} (frame {})\n", health.as_str(), state.last_sequence),
    )
}
