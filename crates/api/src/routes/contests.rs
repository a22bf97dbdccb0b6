use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use machi_common::get_current_timestamp;
use machi_core::{Contest, ContestEntry};

use crate::{
    middleware::authenticate,
    response::{AppError, AppSuccess, OrInternal},
    GlobalState,
};

pub fn contest_routes(state: GlobalState) -> Router<GlobalState> {
    Router::new()
        .route("/contests/{contest_id}/enter",
            post(enter)
        )
        .route("/contests/my-entries",
            get(my_entries)
        )
        .route_layer(middleware::from_fn_with_state(state, authenticate))

        .route("/contests",
            get(list)
        )
        .route("/contests/active",
            get(active)
        )
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EnterRequest {
    pub answer: Option<String>,
}

async fn list(State(state): State<GlobalState>) -> Result<AppSuccess, AppError> {
    let contests = Contest::list_all(&state.db)
        .await
        .or_500("Failed to get contests")?;

    Ok(AppSuccess::ok(json!({ "contests": contests })))
}

async fn active(State(state): State<GlobalState>) -> Result<AppSuccess, AppError> {
    let contest = Contest::current(&state.db, get_current_timestamp())
        .await
        .or_500("Failed to get active contest")?;

    Ok(AppSuccess::ok(json!({ "contest": contest })))
}

async fn enter(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
    Path(contest_id): Path<String>,
    payload: Option<Json<EnterRequest>>,
) -> Result<AppSuccess, AppError> {
    let answer = payload.and_then(|Json(body)| body.answer);
    let entry = Contest::enter(&state.db, &user_id, &contest_id, answer, get_current_timestamp())
        .await
        .or_500("Failed to enter contest")?;

    Ok(AppSuccess::new(StatusCode::OK, "Entry submitted! +50 points 🍀", json!({ "entry": entry })))
}

async fn my_entries(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let entries = ContestEntry::for_user(&state.db, &user_id)
        .await
        .or_500("Failed to get entries")?;

    Ok(AppSuccess::ok(json!({ "entries": entries })))
}
