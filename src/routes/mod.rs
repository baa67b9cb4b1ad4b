//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::pubmed::LiteratureSearch;
use crate::state::AppState;
use crate::store::CaseStore;

pub mod http;

/// Build the application router with:
/// - REST-ish API under `/api/v1/...` (bearer token for user routes)
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers); tighten for production
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router<S: LiteratureSearch, P: CaseStore>(state: Arc<AppState<S, P>>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/fields", get(http::http_get_fields::<S, P>))
        // Sessions
        .route("/api/v1/auth/sign_up", post(http::http_sign_up::<S, P>))
        .route("/api/v1/auth/sign_in", post(http::http_sign_in::<S, P>))
        .route("/api/v1/auth/sign_out", post(http::http_sign_out::<S, P>))
        // Board
        .route("/api/v1/board", get(http::http_get_board::<S, P>))
        .route("/api/v1/board/filter", put(http::http_put_filter::<S, P>))
        .route("/api/v1/board/sort", post(http::http_post_sort::<S, P>))
        .route("/api/v1/board/selection", delete(http::http_clear_selection::<S, P>))
        // Case studies
        .route("/api/v1/cases", post(http::http_post_case::<S, P>))
        .route(
            "/api/v1/cases/:id",
            get(http::http_get_case::<S, P>).delete(http::http_delete_case::<S, P>),
        )
        .route("/api/v1/cases/:id/answer", post(http::http_post_answer::<S, P>))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
