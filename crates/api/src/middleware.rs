use anyhow::anyhow;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use machi_common::get_current_timestamp;

use crate::global_state::GlobalState;
use crate::response::AppError;
use crate::token::AuthenticatedRequest;
use crate::utils::extract_bearer_token;

/// Rejects requests without a valid bearer token (401 when absent, 403 when it does not
/// open or has expired) and hands the user id to the handler as `Extension<String>`.
pub async fn authenticate(
    State(state): State<GlobalState>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    let token = extract_bearer_token(&req)?;

    let claims = AuthenticatedRequest::open(&token, &state.env.secret_salt, get_current_timestamp())
        .map_err(|e| {
            tracing::debug!("[authenticate] rejected token: {}", e);
            AppError::new(StatusCode::FORBIDDEN, anyhow!("Invalid token"))
        })?;

    req.extensions_mut().insert(claims.user_id);
    Ok(next.run(req).await)
}
