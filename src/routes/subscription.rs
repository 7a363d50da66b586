use axum::{
    extract::{Path, State},
    Json,
};

use crate::constants::{MSG_SUBSCRIPTION_CANCELLED, MSG_SUBSCRIPTION_UPDATED};
use crate::error::Result;
use crate::models::api::{MessageResponse, SubscriptionRequest};
use crate::AppState;

pub async fn update_subscription(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<SubscriptionRequest>,
) -> Result<Json<MessageResponse>> {
    let db = state.db.clone();

    tokio::task::spawn_blocking(move || {
        db.transact(|snapshot| {
            snapshot
                .users
                .update_subscription(&user_id, payload.user_plan, payload.plan_purchase_date)
                .map(|_| ())
        })
    })
    .await??;

    Ok(Json(MessageResponse::ok(MSG_SUBSCRIPTION_UPDATED)))
}

pub async fn cancel_subscription(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let db = state.db.clone();

    tokio::task::spawn_blocking(move || {
        db.transact(|snapshot| snapshot.users.cancel_subscription(&user_id).map(|_| ()))
    })
    .await??;

    Ok(Json(MessageResponse::ok(MSG_SUBSCRIPTION_CANCELLED)))
}
