use axum::{
    extract::{Path, State},
    Json,
};

use crate::constants::MSG_ACCOUNT_DELETED;
use crate::error::{AppError, Result};
use crate::models::api::{MessageResponse, UserResponse};
use crate::models::PublicUser;
use crate::AppState;

/// Fetch a user without its credential
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>> {
    let db = state.db.clone();

    let user = tokio::task::spawn_blocking(move || {
        db.read(|snapshot| {
            snapshot
                .users
                .get(&user_id)
                .map(PublicUser::from)
                .ok_or(AppError::UserNotFound)
        })
    })
    .await??;

    Ok(Json(UserResponse::ok(user)))
}

/// Delete a user and all associated data
///
/// This endpoint permanently deletes:
/// - User record
/// - Plans owned by the user
/// - Share grants given to the user on other users' plans
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let db = state.db.clone();

    tokio::task::spawn_blocking(move || {
        db.transact(|snapshot| snapshot.delete_user(&user_id).map(|_| ()))
    })
    .await??;

    Ok(Json(MessageResponse::ok(MSG_ACCOUNT_DELETED)))
}
