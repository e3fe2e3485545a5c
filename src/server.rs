//! Azure Functions custom handler
//!
//! The Functions host forwards each HTTP trigger request unchanged to
//! `/api/SplitAndUpload` on the port it assigns to this process.

use crate::config::ServerConfig;
use crate::error::Error;
use crate::function::handle_invocation;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Route the Functions host forwards trigger requests to
pub const FUNCTION_ROUTE: &str = "/api/SplitAndUpload";

/// Source of configuration values, read at the start of every invocation
pub type ConfigLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Query parameters of the trigger request
#[derive(Debug, Deserialize)]
pub struct SplitParams {
    /// Absolute URI of the SharePoint file to split
    pub uri: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Clone)]
pub struct AppState {
    lookup: ConfigLookup,
}

impl AppState {
    /// State that reads configuration from the process environment
    pub fn from_env() -> Self {
        Self::with_lookup(Arc::new(|name: &str| std::env::var(name).ok()))
    }

    pub fn with_lookup(lookup: ConfigLookup) -> Self {
        Self { lookup }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, self.client_message()).into_response()
    }
}

pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route(
            FUNCTION_ROUTE,
            get(split_and_upload_handler).post(split_and_upload_handler),
        )
        .layer(trace_layer)
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
        }),
    )
}

async fn split_and_upload_handler(
    State(state): State<AppState>,
    Query(params): Query<SplitParams>,
) -> Response {
    let Some(uri) = params.uri else {
        tracing::warn!("Request without uri parameter");
        return Error::MissingParameter {
            name: "uri".to_string(),
        }
        .into_response();
    };

    match handle_invocation(state.lookup.as_ref(), &uri).await {
        Ok(summary) => {
            tracing::info!(page_count = summary.page_count, "Invocation completed");
            (StatusCode::OK, summary.message()).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "SplitAndUpload failed");
            e.into_response()
        }
    }
}

/// Serve the custom handler until the process is stopped
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let router = create_router(AppState::from_env());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
