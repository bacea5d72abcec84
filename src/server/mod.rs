//! HTTP surface: router construction and serving

use axum::Router;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod error;
pub mod routes;
pub mod state;

pub use state::AppState;

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/download", post(routes::start_download))
        .route("/api/download/{download_id}", get(routes::get_file))
        .route("/api/status/{download_id}", get(routes::check_status));

    router = match state.config.static_dir.clone() {
        Some(dir) => {
            let index = dir.join("index.html");
            let router = router.nest_service("/static", ServeDir::new(&dir));
            if index.is_file() {
                router.route_service("/", ServeFile::new(index))
            } else {
                router.route("/", get(routes::index))
            }
        }
        None => router.route("/", get(routes::index)),
    };

    router
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until the process is stopped
pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let bind = format!("{}:{}", state.config.host, state.config.port);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind).await?;
    let addr: SocketAddr = listener.local_addr()?;
    info!(%addr, "tubefetch listening");
    axum::serve(listener, app).await?;
    Ok(())
}
