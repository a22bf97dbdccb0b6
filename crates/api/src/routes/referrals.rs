use axum::{
    extract::{Extension, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use machi_core::{CoreError, User};

use crate::{
    middleware::authenticate,
    response::{AppError, AppSuccess, OrInternal},
    GlobalState,
};

const WELCOME_BONUS_LABEL: &str = "+100 points de bienvenue!";

pub fn referral_routes(state: GlobalState) -> Router<GlobalState> {
    Router::new()
        .route("/referrals/code",
            get(code)
        )
        .route("/referrals/stats",
            get(stats)
        )
        .route_layer(middleware::from_fn_with_state(state, authenticate))

        .route("/referrals/validate",
            post(validate)
        )
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub code: String,
}

async fn code(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let user = User::get_by_id(&state.db, &user_id)
        .await
        .or_500("Failed to get referral code")?;

    Ok(AppSuccess::ok(json!({ "code": user.referral_code })))
}

async fn stats(
    State(state): State<GlobalState>,
    Extension(user_id): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let stats = User::referral_stats(&state.db, &user_id)
        .await
        .or_500("Failed to get referral stats")?;

    let referrals: Vec<_> = stats
        .referrals
        .iter()
        .map(|referee| json!({
            "id": referee.id,
            "name": referee.name,
            "date": referee.created_at,
            "status": "validated",
        }))
        .collect();

    Ok(AppSuccess::ok(json!({
        "code": stats.code,
        "total": stats.total,
        "pointsEarned": stats.points_earned,
        "referrals": referrals,
    })))
}

async fn validate(
    State(state): State<GlobalState>,
    Json(payload): Json<ValidateRequest>,
) -> Result<Response, AppError> {
    match User::validate_referral_code(&state.db, &payload.code).await {
        Ok(referrer) => Ok(AppSuccess::ok(json!({
            "valid": true,
            "referrer": { "name": referrer.name },
            "bonus": WELCOME_BONUS_LABEL,
        }))
        .into_response()),
        // the sign-up form reads `valid` off the 404 body
        Err(CoreError::NotFound(message)) => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": message, "valid": false })),
        )
            .into_response()),
        Err(e) => Err(AppError::from_core(e, "Failed to validate code")),
    }
}
