//! AIWallet account backend and sync layer
//!
//! The server half (`routes`, `db`) keeps users and plans in a flat JSON
//! file. The client half (`client`) talks to it with bounded timeouts and
//! falls back to a local mirror when it cannot be reached.

pub mod client;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;

pub use client::{FileStorage, LocalMirror, MemoryStorage, SyncFacade};
pub use config::{ClientConfig, Config};
pub use db::{open_database, Db};
pub use error::{AppError, Result};

use axum::{
    routing::{get, post},
    Router,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState with the given database and configuration
    pub fn new(db: Db, config: Config) -> Self {
        Self { db, config }
    }
}

/// Build the API router (without CORS, tracing or static files)
pub fn app(state: AppState) -> Router {
    use routes::*;

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/register", post(register_user))
        .route("/api/login", post(login_user))
        .route("/api/user/:user_id", get(get_user).delete(delete_user))
        .route(
            "/api/user/:user_id/subscription",
            post(update_subscription).delete(cancel_subscription),
        )
        .route(
            "/api/user/:user_id/plans",
            post(create_plan).get(list_user_plans),
        )
        .route("/api/user/:user_id/shared-plans", get(list_shared_plans))
        .route("/api/public-plans", get(list_public_plans))
        .route(
            "/api/plans/:plan_id",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
        .route("/api/plans/:plan_id/share", post(share_plan))
        .route(
            "/api/plans/:plan_id/share/:target_user_id",
            axum::routing::delete(unshare_plan),
        )
        .with_state(state)
}
