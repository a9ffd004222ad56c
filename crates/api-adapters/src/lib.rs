//! # api-adapters
//!
//! The HTTP and WebSocket edge of the platform: axum routes, request guards,
//! response envelopes, the realtime gateway and the outbound AI client.

pub mod completion;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod state;
pub mod ws;

pub use completion::OpenRouterClient;
pub use metrics::ApiMetrics;
pub use state::AppState;
pub use ws::Gateway;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Upload cap shared by avatars, submission files and feed images.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", handlers::auth::routes())
        .nest("/courses", handlers::courses::routes())
        .nest("/assignments", handlers::assignments::routes())
        .nest("/chat", handlers::chat::routes())
        .nest("/ai", handlers::assistant::routes())
        .nest("/notifications", handlers::notifications::routes())
        .nest("/feeds", handlers::feed::routes())
        .nest("/admin", handlers::admin::routes());

    Router::new()
        .route("/", get(handlers::meta::welcome))
        .route("/health", get(handlers::meta::health))
        .route("/metrics", get(metrics::serve))
        .route("/ws", get(ws::upgrade))
        .nest("/api", api)
        .fallback(handlers::meta::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), metrics::track))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
