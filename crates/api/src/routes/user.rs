use axum::{
    extract::{Extension, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use machi_common::get_current_timestamp;
use machi_core::loyalty::award_points;
use machi_core::mascot::{fetch_profile, interact, update_progress};
use machi_core::{PointsReason, User, UserProfile};

use crate::{
    middleware::authenticate,
    response::{AppError, AppSuccess, OrInternal},
    GlobalState,
};

pub fn user_routes(state: GlobalState) -> Router<GlobalState> {
    Router::new()
        .route("/users/me",
            get(me)
        )
        .route("/users/profile",
            put(update_profile)
        )
        .route("/users/points",
            put(add_points)
        )
        .route("/users/mascot",
            put(update_mascot)
        )
        .route("/users/interact",
            post(interact_with_mascot)
        )
        .route_layer(middleware::from_fn_with_state(state, authenticate))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PointsRequest {
    pub amount: Option<Value>,
    pub reason: Option<String>,
}

/// Level and xp only; a `stage` field, if sent, is ignored.
#[derive(Debug, Serialize, Deserialize)]
pub struct MascotRequest {
    pub xp: Option<i64>,
    pub level: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InteractRequest {
    #[serde(default)]
    pub action: String,
}

async fn me(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let user = fetch_profile(&state.db, &user_id, get_current_timestamp())
        .await
        .or_500("Failed to get user")?;

    Ok(AppSuccess::ok(json!({ "user": UserProfile::from(user) })))
}

async fn update_profile(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<ProfileRequest>,
) -> Result<AppSuccess, AppError> {
    let user = User::update_profile(&state.db, &user_id, payload.name.as_deref(), payload.phone.as_deref())
        .await
        .or_500("Failed to update profile")?;

    Ok(AppSuccess::new(StatusCode::OK, "Profile updated", json!({ "user": UserProfile::from(user) })))
}

async fn add_points(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<PointsRequest>,
) -> Result<AppSuccess, AppError> {
    let amount = payload
        .amount
        .as_ref()
        .and_then(Value::as_i64)
        .filter(|amount| *amount != 0)
        .ok_or_else(|| AppError::bad_request("Amount required"))?;

    let metadata = payload.reason.as_ref().map(|reason| json!({ "reason": reason }));
    let points = award_points(
        &state.db,
        &user_id,
        amount,
        PointsReason::Manual,
        metadata,
        get_current_timestamp(),
    )
    .await
    .or_500("Failed to add points")?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        &format!("+{} points added!", amount),
        json!({ "points": points, "reason": payload.reason }),
    ))
}

async fn update_mascot(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<MascotRequest>,
) -> Result<Json<Value>, AppError> {
    let progress = update_progress(&state.db, &user_id, payload.level, payload.xp)
        .await
        .or_500("Failed to update mascot")?;

    Ok(Json(json!({ "mascot": progress })))
}

async fn interact_with_mascot(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<InteractRequest>,
) -> Result<AppSuccess, AppError> {
    let update = interact(&state.db, &user_id, &payload.action, get_current_timestamp())
        .await
        .or_500("Interaction failed")?;

    tracing::debug!("[interact] {} -> {}", user_id, payload.action);
    Ok(AppSuccess::new(StatusCode::OK, &update.message, json!({ "stats": update.stats })))
}
