use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use job_geo_rs::{
    CbsaQuerier, CrosswalkCbsaQuerier, CrosswalkConfig, CrosswalkTables, JobPosting,
    job_posting_search_strings,
};

/// Server configuration
struct ServerConfig {
    port: u16,
    crosswalk: CrosswalkConfig,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            crosswalk: CrosswalkConfig::from_env(),
        }
    }
}

/// Application state shared across all requests
#[derive(Clone)]
struct AppState {
    querier: Arc<CrosswalkCbsaQuerier>,
    metrics: Arc<Metrics>,
}

/// Server metrics
struct Metrics {
    total_requests: AtomicU64,
    requests_in_flight: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    /// Count a request and hold it in flight until the guard drops
    fn track(&self) -> RequestGuard<'_> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.requests_in_flight.fetch_add(1, Ordering::Relaxed);
        RequestGuard(&self.requests_in_flight)
    }
}

/// RAII guard for tracking in-flight requests
struct RequestGuard<'a>(&'a AtomicU64);

impl<'a> Drop for RequestGuard<'a> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,job_geo_rs=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Read configuration from environment
    let config = ServerConfig::from_env();

    tracing::info!(
        "Loading crosswalk tables from {}...",
        config.crosswalk.data_dir.display()
    );
    let tables = CrosswalkTables::from_dir(&config.crosswalk.data_dir)
        .context("Failed to load crosswalk tables")?;
    let querier = Arc::new(CrosswalkCbsaQuerier::new(tables));

    // Build Axum app with routes
    let app = build_app(querier);

    // Bind server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Build the Axum application with routes and middleware
fn build_app(querier: Arc<CrosswalkCbsaQuerier>) -> Router {
    let metrics = Arc::new(Metrics {
        total_requests: AtomicU64::new(0),
        requests_in_flight: AtomicU64::new(0),
        start_time: Instant::now(),
    });

    let state = AppState { querier, metrics };

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // API routes
        .route("/api/cbsa", post(query_single))
        .route("/api/cbsa/batch", post(query_batch))
        .route("/api/metrics", get(get_metrics))
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Query the CBSA of a single job posting
async fn query_single(
    State(state): State<AppState>,
    payload: Result<Json<JobPosting>, JsonRejection>,
) -> Result<Json<CbsaResponse>, ApiError> {
    let _guard = state.metrics.track();
    let Json(job_posting) = payload?;

    let data = CbsaData::query(&state.querier, &job_posting);
    tracing::info!(
        id = ?job_posting.id,
        cbsa_code = ?data.cbsa_code,
        "Queried job posting"
    );

    Ok(Json(CbsaResponse {
        success: true,
        data,
    }))
}

#[derive(Serialize)]
struct CbsaResponse {
    success: bool,
    data: CbsaData,
}

/// Query the CBSAs of multiple job postings
async fn query_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchCbsaRequest>, JsonRejection>,
) -> Result<Json<BatchCbsaResponse>, ApiError> {
    let _guard = state.metrics.track();
    let Json(request) = payload?;

    if request.job_postings.is_empty() {
        return Err(ApiError::BadRequest("job_postings cannot be empty".to_string()));
    }

    tracing::info!("Batch querying {} job postings", request.job_postings.len());

    let data = request
        .job_postings
        .iter()
        .map(|job_posting| CbsaData::query(&state.querier, job_posting))
        .collect();

    Ok(Json(BatchCbsaResponse {
        success: true,
        data,
    }))
}

#[derive(Deserialize)]
struct BatchCbsaRequest {
    job_postings: Vec<JobPosting>,
}

#[derive(Serialize)]
struct BatchCbsaResponse {
    success: bool,
    data: Vec<CbsaData>,
}

/// Get server metrics
async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        total_requests: state.metrics.total_requests.load(Ordering::Relaxed),
        requests_in_flight: state.metrics.requests_in_flight.load(Ordering::Relaxed),
        uptime_seconds: state.metrics.start_time.elapsed().as_secs(),
    })
}

#[derive(Serialize)]
struct MetricsResponse {
    total_requests: u64,
    requests_in_flight: u64,
    uptime_seconds: u64,
}

/// Geography data for API response
#[derive(Serialize)]
struct CbsaData {
    id: Option<serde_json::Value>,
    search_strings: Vec<String>,
    cbsa_code: Option<String>,
    cbsa_name: Option<String>,
}

impl CbsaData {
    fn query(querier: &CrosswalkCbsaQuerier, job_posting: &JobPosting) -> Self {
        let (cbsa_code, cbsa_name) = match querier.query(job_posting) {
            Some(cbsa) => (Some(cbsa.code), Some(cbsa.name)),
            None => (None, None),
        };

        Self {
            id: job_posting.id.clone(),
            search_strings: job_posting_search_strings(job_posting),
            cbsa_code,
            cbsa_name,
        }
    }
}

/// API error types
enum ApiError {
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}
