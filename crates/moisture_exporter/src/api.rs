use std::net::AddrParseError;
use std::net::IpAddr;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::fetch::ResourceSource;
use crate::metrics::Metrics;
use crate::scrape;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn ResourceSource>,
    metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(source: Arc<dyn ResourceSource>, metrics: Arc<Metrics>) -> Self {
        Self { source, metrics }
    }
}

/// Handler for GET /
#[tracing::instrument]
async fn root() -> &'static str {
    tracing::debug!("Handling / request");
    "ciao\n"
}

/// Handler for GET /metrics
///
/// Pulls fresh resources from the device before rendering. A failed pull is
/// reported as a comment line ahead of whatever the registry already holds,
/// so the response stays parseable and `scrape_success` tells the story.
#[tracing::instrument(skip(state))]
async fn metrics(State(state): State<AppState>) -> Response {
    tracing::debug!("Handling /metrics request");

    let mut lines = Vec::new();
    if let Err(e) = scrape::scrape(state.source.as_ref(), &state.metrics).await {
        lines.push(format!("# {}", e.to_string().replace('\n', " ")));
    }

    match state.metrics.render() {
        Ok(exposition) => {
            lines.push(exposition);
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, state.metrics.content_type())],
                lines.join("\n"),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolve the configured listen IP (v4 or v6) and port into a socket address
pub fn listen_addr(config: &ApiConfig) -> Result<SocketAddr, AddrParseError> {
    let ip: IpAddr = config.listen.parse()?;
    Ok(SocketAddr::new(ip, config.port))
}

/// Start the HTTP server
///
/// Binds to the configured address and serves until `shutdown_rx` fires.
/// Failing to bind is returned as an error; everything after that is handled
/// per request.
pub async fn serve(
    config: &ApiConfig,
    state: AppState,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_router(state);

    let addr = listen_addr(config)?;
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            tracing::info!("HTTP server shutting down gracefully");
        })
        .await?;

    Ok(())
}
