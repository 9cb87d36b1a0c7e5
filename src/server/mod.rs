//! HTTP surface.
//!
//! A single resolution endpoint plus a health probe:
//!
//! - `GET /api/references?repo=<owner/name>&gitRef=<ref>` — resolve a
//!   reference, forwarding the conclusive status and body byte-for-byte.
//! - `GET /health` — liveness with version metadata.
//!
//! The handler is a thin shim over [`Resolver`]: query extraction in,
//! verbatim forwarding out. Validation failures surface as plain-text 400
//! responses whose bodies come straight from the error Display strings.

pub mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::resolver::Resolver;
use crate::{MuninnError, Result};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
}

/// Create the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/references", get(references))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve the router until ctrl-c.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to install ctrl-c handler");
    }
}

#[derive(Debug, Deserialize)]
struct ReferencesParams {
    #[serde(default)]
    repo: String,
    #[serde(rename = "gitRef", default)]
    git_ref: String,
}

/// `GET /api/references?repo=<owner/name>&gitRef=<ref>`
async fn references(
    State(state): State<AppState>,
    Query(params): Query<ReferencesParams>,
) -> Response {
    match state.resolver.resolve(&params.repo, &params.git_ref).await {
        Ok(resolved) => {
            let status = StatusCode::from_u16(resolved.status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                resolved.body,
            )
                .into_response()
        }
        Err(err @ (MuninnError::MissingParameter | MuninnError::MutableReference)) => {
            (StatusCode::BAD_REQUEST, format!("{err}\n")).into_response()
        }
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{err}\n")).into_response(),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::version_string(),
    })
}
