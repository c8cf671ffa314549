use crate::config::Config;
use crate::diagnostics::diagnose;
use crate::extract::ValidJson;
use crate::search::run_search;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use bhao_core::SearchRequest;
use bhao_storage::DocumentStore;
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    // one shared handle for the process; `None` when no database is configured
    pub store: Option<Arc<dyn DocumentStore>>,
    pub database_url: Option<String>,
    pub database_name: Option<String>,
}

impl AppState {
    pub fn new(store: Option<Arc<dyn DocumentStore>>, cfg: &Config) -> Self {
        Self {
            store,
            database_url: cfg.database_url.clone(),
            database_name: cfg.database_name.clone(),
        }
    }
}

/// Every origin, method and header is allowed, with credentials. The
/// configured frontend origin is already covered by the wildcard.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/test", get(test_db))
        .route("/search", post(search))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

async fn root() -> impl IntoResponse {
    Json(json!({"message": "BHAO.PK API ready"}))
}

async fn test_db(State(app): State<AppState>) -> impl IntoResponse {
    Json(
        diagnose(
            app.store.as_deref(),
            app.database_url.as_deref(),
            app.database_name.as_deref(),
        )
        .await,
    )
}

async fn search(
    State(app): State<AppState>,
    ValidJson(req): ValidJson<SearchRequest>,
) -> impl IntoResponse {
    let outcome = run_search(app.store.as_deref(), &req).await;
    Json(outcome.into_envelope())
}

async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buf = Vec::new();
    let _ = encoder.encode(&metric_families, &mut buf);
    (StatusCode::OK, String::from_utf8(buf).unwrap_or_default())
}
