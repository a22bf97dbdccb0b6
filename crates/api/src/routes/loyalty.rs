use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use serde_json::json;

use machi_common::get_current_timestamp;
use machi_core::loyalty::{loyalty_stats, record_visit, rewards_overview, HISTORY_LIMIT};
use machi_core::{PointsLog, Reward};

use crate::{
    middleware::authenticate,
    response::{AppError, AppSuccess, OrInternal},
    GlobalState,
};

pub fn loyalty_routes(state: GlobalState) -> Router<GlobalState> {
    Router::new()
        .route("/loyalty/visit",
            post(visit)
        )
        .route("/loyalty/rewards",
            get(rewards)
        )
        .route("/loyalty/use-reward/{reward_id}",
            post(use_reward)
        )
        .route("/loyalty/stats",
            get(stats)
        )
        .route("/loyalty/history",
            get(history)
        )
        .route_layer(middleware::from_fn_with_state(state, authenticate))
}

async fn visit(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let outcome = record_visit(&state.db, &user_id, get_current_timestamp())
        .await
        .or_500("Failed to record visit")?;

    if let Some(reward) = &outcome.new_reward {
        tracing::info!("[visit] {} reached {} visits, issued {}", user_id, outcome.visits, reward.id);
    }
    Ok(AppSuccess::new(StatusCode::OK, "Visit recorded! +100 points 🏄‍♂️", json!(outcome)))
}

async fn rewards(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let overview = rewards_overview(&state.db, &user_id)
        .await
        .or_500("Failed to get rewards")?;

    Ok(AppSuccess::ok(json!(overview)))
}

async fn use_reward(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
    Path(reward_id): Path<String>,
) -> Result<AppSuccess, AppError> {
    let reward = Reward::redeem(&state.db, &user_id, &reward_id, get_current_timestamp())
        .await
        .or_500("Failed to use reward")?;

    Ok(AppSuccess::new(StatusCode::OK, "Reward used! Enjoy! 🍹", json!({ "reward": reward })))
}

async fn stats(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let stats = loyalty_stats(&state.db, &user_id)
        .await
        .or_500("Failed to get stats")?;

    Ok(AppSuccess::ok(json!(stats)))
}

async fn history(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let entries = PointsLog::history(&state.db, &user_id, HISTORY_LIMIT)
        .await
        .or_500("Failed to get history")?;

    Ok(AppSuccess::ok(json!({ "entries": entries })))
}
