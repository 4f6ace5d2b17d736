// src/dashboard/mod.rs
//! Browser dashboard over the latest enriched dataset.
//!
//! Routes:
//! - `GET /`          HTML page (filters, KPIs, three charts, table)
//! - `GET /api/view`  the same computed view as JSON
//! - `GET /health`    liveness, plain `OK`
//! - `/charts/*`      SVGs written by the batch visualizer

pub mod cache;
pub mod page;
pub mod view;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::AppConfig;
use crate::error::DatasetError;
use cache::{Bootstrap, CacheStatus, DatasetCache, LoadedDataset};
use view::{compute_view, ViewQuery};

pub const CACHE_HEADER: &str = "x-dataset-cache";

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<DatasetCache>,
    pub refresh_secs: u64,
    pub charts_dir: PathBuf,
}

impl AppState {
    pub fn new(cfg: &AppConfig, bootstrap: Arc<dyn Bootstrap>) -> Self {
        Self {
            cache: Arc::new(DatasetCache::new(
                cfg.processed_dir(),
                cfg.processed_prefix.clone(),
                cfg.cache_ttl(),
                bootstrap,
            )),
            refresh_secs: cfg.refresh_secs,
            charts_dir: cfg.charts_dir(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let charts = ServeDir::new(state.charts_dir.clone());
    Router::new()
        .route("/", get(index))
        .route("/api/view", get(api_view))
        .route("/health", get(|| async { "OK" }))
        .nest_service("/charts", charts)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

enum Failure {
    Unavailable(String),
    BadRequest(String),
    Internal(String),
}

impl Failure {
    fn from_load(err: anyhow::Error) -> Self {
        let bootstrap_failed = err
            .chain()
            .any(|e| matches!(e.downcast_ref::<DatasetError>(), Some(DatasetError::Bootstrap)));
        if bootstrap_failed {
            Failure::Unavailable(err.to_string())
        } else {
            tracing::error!(target: "dashboard", error = %format!("{err:#}"), "dataset load failed");
            Failure::Internal(format!("Failed to load dataset: {err}"))
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Failure::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Failure::BadRequest(_) => StatusCode::BAD_REQUEST,
            Failure::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            Failure::Unavailable(m) | Failure::BadRequest(m) | Failure::Internal(m) => m,
        }
    }
}

async fn load_view(
    state: &AppState,
    pairs: &[(String, String)],
) -> Result<(Arc<LoadedDataset>, view::View, CacheStatus), Failure> {
    let q = ViewQuery::from_pairs(pairs).map_err(|e| Failure::BadRequest(format!("{e:#}")))?;
    let (ds, status) = state.cache.get().await.map_err(Failure::from_load)?;
    let v = compute_view(&ds.rows, &q);
    Ok((ds, v, status))
}

fn with_cache_header(mut resp: Response, status: CacheStatus) -> Response {
    resp.headers_mut()
        .insert(CACHE_HEADER, HeaderValue::from_static(status.as_str()));
    resp
}

async fn index(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let (ds, v, status) = match load_view(&state, &pairs).await {
        Ok(x) => x,
        Err(f) => {
            return (f.status(), Html(page::render_error(f.message(), state.refresh_secs)))
                .into_response()
        }
    };
    match page::render(&v, &ds, state.refresh_secs) {
        Ok(html) => with_cache_header(Html(html).into_response(), status),
        Err(e) => {
            tracing::error!(target: "dashboard", error = %format!("{e:#}"), "page render failed");
            let msg = format!("Failed to render dashboard: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(page::render_error(&msg, state.refresh_secs)),
            )
                .into_response()
        }
    }
}

async fn api_view(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    match load_view(&state, &pairs).await {
        Ok((_, v, status)) => with_cache_header(Json(v).into_response(), status),
        Err(f) => (f.status(), Json(json!({ "error": f.message() }))).into_response(),
    }
}
