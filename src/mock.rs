// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Local mock of the classification backend.
//!
//! Serves `POST /analyze` with the same response shape as the real
//! service and flags an origin as "Brute Force" once it sends more than
//! `threshold` requests inside the sliding window. Lets the harness run
//! end to end without the remote service.

use crate::config::{MockConfig, TARGET_CLASSIFICATION};
use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Verdict label for traffic under the threshold.
pub const BENIGN_VERDICT: &str = "Benign";

/// Request timestamps for one origin.
#[derive(Debug, Default)]
struct RequestWindow {
    request_times: Vec<Instant>,
}

impl RequestWindow {
    /// Record a request and return how many fall inside the window.
    fn record(&mut self, now: Instant, window: Duration) -> usize {
        self.request_times
            .retain(|t| now.duration_since(*t) < window);
        self.request_times.push(now);
        self.request_times.len()
    }

    fn last_seen(&self) -> Option<Instant> {
        self.request_times.last().copied()
    }
}

/// Outcome of classifying one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockVerdict {
    Benign { in_window: usize },
    BruteForce { in_window: usize },
}

impl MockVerdict {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Benign { .. } => BENIGN_VERDICT,
            Self::BruteForce { .. } => TARGET_CLASSIFICATION,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Self::Benign { .. } => 0.1,
            Self::BruteForce { .. } => 0.95,
        }
    }
}

/// Per-origin sliding-window rate classifier.
pub struct MockClassifier {
    config: MockConfig,
    windows: Arc<RwLock<HashMap<IpAddr, RequestWindow>>>,
}

impl MockClassifier {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Record a request from `ip` and classify it.
    pub async fn classify(&self, ip: IpAddr) -> MockVerdict {
        let mut windows = self.windows.write().await;
        let in_window = windows
            .entry(ip)
            .or_default()
            .record(Instant::now(), self.config.window());

        if in_window > self.config.threshold {
            warn!(%ip, in_window, "Burst detected");
            MockVerdict::BruteForce { in_window }
        } else {
            debug!(%ip, in_window, "Request within rate");
            MockVerdict::Benign { in_window }
        }
    }

    /// Drop origins idle for longer than the window.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let window = self.config.window();
        let mut windows = self.windows.write().await;
        windows.retain(|_, w| {
            w.last_seen()
                .map(|t| now.duration_since(t) < window)
                .unwrap_or(false)
        });
    }

    pub async fn tracked_origins(&self) -> usize {
        self.windows.read().await.len()
    }
}

/// Shared state for the mock handlers.
pub struct MockState {
    pub classifier: MockClassifier,
}

/// Request body accepted by `/analyze`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub payload: String,
}

/// Response body of `/analyze`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisBody>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisBody {
    pub verdict: String,
    pub confidence: f64,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "brute-force-harness-mock",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Classify one payload for the calling origin.
pub async fn analyze(
    State(state): State<Arc<MockState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    if req.payload.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(AnalyzeResponse {
                status: "error".to_string(),
                message: "payload must not be empty".to_string(),
                analysis: None,
            }),
        );
    }

    let verdict = state.classifier.classify(addr.ip()).await;
    let message = match verdict {
        MockVerdict::BruteForce { in_window } => {
            format!("{} requests inside the window, origin flagged", in_window)
        }
        MockVerdict::Benign { .. } => "Request analyzed".to_string(),
    };

    (
        StatusCode::OK,
        Json(AnalyzeResponse {
            status: "success".to_string(),
            message,
            analysis: Some(AnalysisBody {
                verdict: verdict.label().to_string(),
                confidence: verdict.confidence(),
            }),
        }),
    )
}

/// Build the mock router.
pub fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodic origin cleanup; aborted when dropped.
struct CleanupTask(JoinHandle<()>);

impl Drop for CleanupTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn spawn_cleanup(state: Arc<MockState>, every: Duration) -> CleanupTask {
    CleanupTask(tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            state.classifier.cleanup().await;
        }
    }))
}

/// Serve the mock on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, config: MockConfig) -> std::io::Result<()> {
    let state = Arc::new(MockState {
        classifier: MockClassifier::new(config),
    });

    // Lives as long as this future, whether serve returns or is cancelled
    let _cleanup = spawn_cleanup(state.clone(), Duration::from_secs(60));

    info!(addr = ?listener.local_addr().ok(), "Mock classifier listening");
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
