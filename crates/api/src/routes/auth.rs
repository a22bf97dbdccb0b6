use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::json;

use machi_common::get_current_timestamp;
use machi_core::{NewUser, User, UserProfile};

use crate::{
    response::{AppError, AppSuccess, OrInternal},
    token::issue_token,
    GlobalState,
};

pub fn auth_routes() -> Router<GlobalState> {
    Router::new()
        .route("/auth/register",
            post(register)
        )
        .route("/auth/login",
            post(login)
        )
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

async fn register(
    State(state): State<GlobalState>,
    Json(payload): Json<NewUser>,
) -> Result<AppSuccess, AppError> {
    let now = get_current_timestamp();
    let user = User::register(&state.db, payload, now)
        .await
        .or_500("Registration failed")?;

    let token = issue_token(&user, &state.env.secret_salt, now)
        .map_err(|e| AppError::new(StatusCode::INTERNAL_SERVER_ERROR, e.context("Registration failed")))?;

    tracing::info!("[register] new account {} ({})", user.id, user.email);
    Ok(AppSuccess::new(
        StatusCode::CREATED,
        "Welcome to Machi Mouchkil! 🏄‍♂️",
        json!({ "user": UserProfile::from(user), "token": token }),
    ))
}

async fn login(
    State(state): State<GlobalState>,
    Json(payload): Json<LoginRequest>,
) -> Result<AppSuccess, AppError> {
    let now = get_current_timestamp();
    let user = User::login(&state.db, &payload.email, &payload.password)
        .await
        .or_500("Login failed")?;

    let token = issue_token(&user, &state.env.secret_salt, now)
        .map_err(|e| AppError::new(StatusCode::INTERNAL_SERVER_ERROR, e.context("Login failed")))?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Welcome back! 🌊",
        json!({ "user": UserProfile::from(user), "token": token }),
    ))
}
