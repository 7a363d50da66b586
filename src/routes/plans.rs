use axum::{
    extract::{Path, State},
    Json,
};

use crate::constants::{MSG_PLAN_CREATED, MSG_PLAN_DELETED, MSG_PLAN_SHARED, MSG_PLAN_UNSHARED};
use crate::error::Result;
use crate::models::api::{
    CreatePlanRequest, MessageResponse, PlanResponse, PlansResponse, SharePlanRequest,
    ShareResponse, SharedPlansResponse,
};
use crate::models::PlanUpdate;
use crate::AppState;

/// Create a plan owned by `user_id`
pub async fn create_plan(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<CreatePlanRequest>,
) -> Result<Json<PlanResponse>> {
    let db = state.db.clone();

    let plan = tokio::task::spawn_blocking(move || {
        db.transact(|snapshot| {
            snapshot
                .create_plan(
                    &user_id,
                    payload.name.as_deref().unwrap_or_default(),
                    payload.description.as_deref().unwrap_or_default(),
                    payload.content,
                )
                .cloned()
        })
    })
    .await??;

    tracing::info!("Plan {} created for user {}", plan.id, plan.user_id);

    Ok(Json(PlanResponse {
        success: true,
        message: Some(MSG_PLAN_CREATED.to_string()),
        plan_id: Some(plan.id.clone()),
        plan,
    }))
}

pub async fn list_user_plans(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<PlansResponse>> {
    let db = state.db.clone();
    let plans =
        tokio::task::spawn_blocking(move || db.read(|snapshot| snapshot.plans_of(&user_id)))
            .await??;

    Ok(Json(PlansResponse {
        success: true,
        plans,
    }))
}

/// Plans other users shared with `user_id`
pub async fn list_shared_plans(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<SharedPlansResponse>> {
    let db = state.db.clone();
    let plans = tokio::task::spawn_blocking(move || {
        db.read(|snapshot| snapshot.plans_shared_with(&user_id))
    })
    .await??;

    Ok(Json(SharedPlansResponse {
        success: true,
        plans,
    }))
}

pub async fn list_public_plans(State(state): State<AppState>) -> Result<Json<PlansResponse>> {
    let db = state.db.clone();
    let plans =
        tokio::task::spawn_blocking(move || db.read(|snapshot| Ok(snapshot.public_plans())))
            .await??;

    Ok(Json(PlansResponse {
        success: true,
        plans,
    }))
}

pub async fn get_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Result<Json<PlanResponse>> {
    let db = state.db.clone();
    let plan =
        tokio::task::spawn_blocking(move || db.read(|snapshot| snapshot.plan(&plan_id).cloned()))
            .await??;

    Ok(Json(PlanResponse {
        success: true,
        message: None,
        plan_id: None,
        plan,
    }))
}

pub async fn update_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
    Json(update): Json<PlanUpdate>,
) -> Result<Json<PlanResponse>> {
    let db = state.db.clone();
    let plan = tokio::task::spawn_blocking(move || {
        db.transact(|snapshot| snapshot.update_plan(&plan_id, update).cloned())
    })
    .await??;

    Ok(Json(PlanResponse {
        success: true,
        message: None,
        plan_id: None,
        plan,
    }))
}

/// Delete a plan; its share grants go with it
pub async fn delete_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || {
        db.transact(|snapshot| snapshot.delete_plan(&plan_id).map(|_| ()))
    })
    .await??;

    Ok(Json(MessageResponse::ok(MSG_PLAN_DELETED)))
}

pub async fn share_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
    Json(payload): Json<SharePlanRequest>,
) -> Result<Json<ShareResponse>> {
    let db = state.db.clone();
    let share_id = tokio::task::spawn_blocking(move || {
        db.transact(|snapshot| {
            snapshot
                .share_plan(
                    &plan_id,
                    &payload.owner_id,
                    &payload.target_email,
                    payload.access_level,
                )
                .map(|grant| grant.id.clone())
        })
    })
    .await??;

    tracing::info!("Share {} created", share_id);

    Ok(Json(ShareResponse {
        success: true,
        message: MSG_PLAN_SHARED.to_string(),
        share_id,
    }))
}

pub async fn unshare_plan(
    State(state): State<AppState>,
    Path((plan_id, target_user_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>> {
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || {
        db.transact(|snapshot| snapshot.unshare_plan(&plan_id, &target_user_id))
    })
    .await??;

    Ok(Json(MessageResponse::ok(MSG_PLAN_UNSHARED)))
}
