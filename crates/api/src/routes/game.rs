use axum::{
    extract::{Extension, Query, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use machi_common::get_current_timestamp;
use machi_core::game::game_or_default;
use machi_core::GameScore;

use crate::{
    middleware::authenticate,
    response::{AppError, AppSuccess, OrInternal},
    utils::parse_limit,
    GlobalState,
};

pub fn game_routes(state: GlobalState) -> Router<GlobalState> {
    Router::new()
        .route("/game/score",
            post(save_score)
        )
        .route("/game/my-scores",
            get(my_scores)
        )
        .route_layer(middleware::from_fn_with_state(state, authenticate))

        .route("/game/leaderboard",
            get(leaderboard)
        )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub score: Option<Value>,
    pub game: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GameQuery {
    pub game: Option<String>,
    pub limit: Option<String>,
}

async fn save_score(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<ScoreRequest>,
) -> Result<AppSuccess, AppError> {
    // whole, non-negative numbers only
    let score = payload
        .score
        .as_ref()
        .and_then(Value::as_i64)
        .filter(|score| *score >= 0)
        .ok_or_else(|| AppError::bad_request("Invalid score"))?;

    let outcome = GameScore::record(&state.db, &user_id, payload.game.as_deref(), score, get_current_timestamp())
        .await
        .or_500("Failed to save score")?;

    Ok(AppSuccess::ok(json!(outcome)))
}

async fn leaderboard(
    State(state): State<GlobalState>,
    Query(query): Query<GameQuery>,
) -> Result<AppSuccess, AppError> {
    let game = game_or_default(query.game.as_deref());
    let leaderboard = GameScore::leaderboard(&state.db, Some(game), parse_limit(query.limit.as_deref()))
        .await
        .or_500("Failed to get leaderboard")?;

    Ok(AppSuccess::ok(json!({ "game": game, "leaderboard": leaderboard })))
}

async fn my_scores(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
    Query(query): Query<GameQuery>,
) -> Result<AppSuccess, AppError> {
    let scores = GameScore::my_scores(&state.db, &user_id, query.game.as_deref())
        .await
        .or_500("Failed to get scores")?;

    Ok(AppSuccess::ok(json!(scores)))
}
