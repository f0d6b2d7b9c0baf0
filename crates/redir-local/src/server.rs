//! Axum HTTP server: router, listener, graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::address::NetworkAddress;
use crate::config::ServiceConfig;
use crate::finder::http::HttpFinder;
use crate::flags::OpenFlags;
use crate::locate::correlation::{self, DECISION_ID_HEADER};
use crate::locate::{LocationRequest, RedirectDecider};
use crate::mapper::LocalRootMapper;
use crate::policy::{PolicyState, SharedPolicy};

pub type Decider = RedirectDecider<HttpFinder, LocalRootMapper>;

/// Shared application state.
pub struct AppState {
    pub config: ServiceConfig,
    pub decider: Decider,
    pub policy: SharedPolicy,
}

/// Body of `POST /v1/locate`.
#[derive(Debug, Deserialize)]
struct LocateBody {
    path: String,
    #[serde(default)]
    flags: OpenFlags,
    /// Client address as seen by the front end; the peer address otherwise.
    #[serde(default)]
    client: Option<String>,
    capability: u32,
}

/// Body of `POST /v1/space`.
#[derive(Debug, Deserialize)]
struct SpaceBody {
    path: String,
}

/// Build and run the HTTP server.
pub async fn run(state: AppState) -> anyhow::Result<()> {
    let listen_addr = state.config.server.listen_address.clone();

    let app = Router::new()
        .route("/v1/locate", post(handle_locate))
        .route("/v1/space", post(handle_space))
        .route("/admin/reload", post(handle_reload))
        .route("/stats", get(handle_stats))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(address = %listen_addr, "Locate filter listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Locate filter shut down gracefully");
    Ok(())
}

/// Resolve the client address for a locate body.
///
/// An explicit but malformed client string yields no address, which the
/// decider treats as public.
fn client_address(raw: Option<&str>, peer: SocketAddr) -> Option<NetworkAddress> {
    match raw {
        Some(raw) => match raw.parse::<NetworkAddress>() {
            Ok(addr) => Some(addr),
            Err(e) => {
                tracing::warn!(client = %raw, error = %e, "Unparseable client address");
                None
            }
        },
        None => Some(NetworkAddress::from(peer)),
    }
}

/// Handler for POST /v1/locate.
///
/// Runs one decision under a fresh decision ID and returns the response,
/// with the ID echoed in the `x-redir-decision-id` header.
async fn handle_locate(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Json(body): Json<LocateBody>,
) -> Response {
    let decision_id = correlation::generate_id();
    let request = LocationRequest {
        client: client_address(body.client.as_deref(), peer),
        path: body.path,
        flags: body.flags,
        capability: body.capability,
    };

    let decision = state
        .decider
        .decide(&request, state.policy.snapshot(), &decision_id)
        .await;

    let mut response = Json(decision.response).into_response();
    if let Ok(value) = HeaderValue::from_str(&decision_id) {
        response.headers_mut().insert(DECISION_ID_HEADER, value);
    }
    response
}

/// Handler for POST /v1/space. Answered by the finder alone.
async fn handle_space(State(state): State<Arc<AppState>>, Json(body): Json<SpaceBody>) -> Response {
    match state.decider.space(&body.path).await {
        Ok(info) => (StatusCode::OK, Json(info)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, path = %body.path, "Space query failed");
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

/// Re-read the directive file and swap the policy in place.
///
/// Only the policy flag is reloaded; the local root is fixed at startup.
async fn handle_reload(State(state): State<Arc<AppState>>) -> Json<PolicyState> {
    let policy = PolicyState::load(&state.config.policy.directive_file);
    state.policy.replace(policy);
    tracing::info!(
        read_only_redirect = policy.read_only_redirect,
        "Locate policy reloaded"
    );
    Json(policy)
}

async fn handle_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.decider.stats().snapshot())
}

/// Health check endpoint.
async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Wait for SIGINT (Ctrl+C) for graceful shutdown.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, draining connections...");
}
