use axum::{extract::State, http::StatusCode, Json};

use crate::models::api::HealthResponse;
use crate::AppState;

/// Health check endpoint
///
/// Liveness probe target for the sync layer. A missing snapshot file is
/// recreated empty; a path that cannot hold the file answers 503 and clients
/// fall back to their local mirror.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let db = state.db.clone();
    let readable = tokio::task::spawn_blocking(move || db.ensure_readable())
        .await
        .unwrap_or(false);

    if !readable {
        tracing::error!("Database health check failed: {:?}", state.db.path());
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "error".to_string(),
                server: "unavailable".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            server: "available".to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
    )
}
