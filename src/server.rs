use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::info;

use crate::notifier::{NotifyRequest, Notifier};

pub fn router(notifier: Arc<Notifier>) -> Router {
    Router::new()
        .route("/api/v1/notify", post(notify))
        .with_state(notifier)
}

async fn notify(
    State(notifier): State<Arc<Notifier>>,
    Json(request): Json<NotifyRequest>,
) -> StatusCode {
    notifier.notify(&request).await;
    StatusCode::OK
}

/// Serve the inbound notify API until the listener fails
pub async fn serve(bind_address: &str, notifier: Arc<Notifier>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind to {bind_address}"))?;

    info!("Notify API listening on {}", bind_address);

    axum::serve(listener, router(notifier))
        .await
        .context("Server error")?;

    Ok(())
}
