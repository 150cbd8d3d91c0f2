pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use briefing_core::config::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router on already-constructed state. Integration tests use
/// this to keep a handle on the store while driving the router.
pub fn build_router_with_state(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Results: ingestion + snapshot
        .route(
            "/api/results",
            get(routes::results::list_results).post(routes::results::ingest_result),
        )
        // Live stream (SSE)
        .route("/api/results/stream", get(routes::stream::stream_results))
        // Normalized read view
        .route("/api/briefings", get(routes::briefings::list_briefings))
        // Dispatch proxy
        .route("/api/dispatch", post(routes::dispatch::dispatch_form))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Build the axum Router with all API routes and middleware.
pub fn build_router(config: Config) -> Router {
    build_router_with_state(state::AppState::new(config))
}

/// Start the briefing relay server.
pub async fn serve(config: Config, port: u16) -> anyhow::Result<()> {
    let app = build_router(config);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("briefing relay listening on http://localhost:{port}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
