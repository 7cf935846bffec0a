use anyhow::Context;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::api::{self, AppState};
use crate::config::AqiwatchConfig;
use crate::repository::StationRepository;

pub fn app(config: &AqiwatchConfig, repository: Arc<StationRepository>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = AppState {
        repository,
        map: config.map.clone(),
    };

    Router::new().nest("/api", api::router(state)).layer(cors)
}

pub async fn run(config: &AqiwatchConfig, repository: Arc<StationRepository>) -> anyhow::Result<()> {
    let port = config.server.port;
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://localhost:{}", port);
    axum::serve(listener, app(config, repository))
        .await
        .context("Web server stopped unexpectedly")?;
    Ok(())
}
