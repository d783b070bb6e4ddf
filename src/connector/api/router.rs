use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::container::Container;
use super::controller::{ChatController, ChatReply};

pub const CHAT_PATH: &str = "/api/chat";

/// `POST /api/chat` plus a liveness probe.
pub fn build_router(container: Arc<Container>) -> axum::Router {
    axum::Router::new()
        .route(CHAT_PATH, post(chat))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(container)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(container: Arc<Container>, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(
        "Serving {} on http://{} (upstream: {})",
        CHAT_PATH,
        listener.local_addr()?,
        container.provider_name()
    );

    axum::serve(listener, build_router(container))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn chat(State(container): State<Arc<Container>>, body: Bytes) -> ChatReply {
    ChatController::new(&container).chat(&body).await
}

async fn health() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
