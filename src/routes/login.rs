use axum::{extract::State, Json};

use crate::constants::MSG_LOGGED_IN;
use crate::error::Result;
use crate::models::api::{LoginRequest, LoginResponse};
use crate::AppState;

/// Log a user in by email or username
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let db = state.db.clone();

    let response = tokio::task::spawn_blocking(move || {
        db.read(|snapshot| {
            let user = snapshot.users.login(
                payload.email_or_username.as_deref().unwrap_or_default(),
                payload.password.as_deref().unwrap_or_default(),
            )?;
            Ok(LoginResponse::ok(user, MSG_LOGGED_IN))
        })
    })
    .await??;

    tracing::debug!("User logged in: {:?}", response.user_id);

    Ok(Json(response))
}
