use axum::{extract::State, Json};

use crate::constants::MSG_REGISTERED;
use crate::error::Result;
use crate::models::api::{RegisterRequest, RegisterResponse};
use crate::AppState;

/// Register a new user
///
/// Rejects missing fields, an email or username already in use, and
/// passwords shorter than 8 characters, in that order.
///
/// # Security
/// The password is stored base64-encoded. That is an encoding, not a hash;
/// anyone with read access to the snapshot file can recover it.
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    let db = state.db.clone();

    let user_id = tokio::task::spawn_blocking(move || {
        db.transact(|snapshot| {
            let user = snapshot
                .users
                .register(
                    payload.email.as_deref().unwrap_or_default(),
                    payload.username.as_deref().unwrap_or_default(),
                    payload.password.as_deref().unwrap_or_default(),
                )?;
            Ok(user.id.clone())
        })
    })
    .await??;

    tracing::info!("New user registered: {}", user_id);

    Ok(Json(RegisterResponse::ok(user_id, MSG_REGISTERED)))
}
