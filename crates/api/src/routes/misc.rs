use axum::{extract::State, routing::get, Router};
use serde_json::json;

use crate::{
    response::{AppError, AppSuccess},
    GlobalState,
};

pub fn misc_routes() -> Router<GlobalState> {
    Router::new()
        .route("/health",
            get(health)
        )
        .route("/health/tables",
            get(tables)
        )
}

/// Always 200; a database that came up in fallback mode reports `degraded`.
async fn health(State(state): State<GlobalState>) -> AppSuccess {
    let init_error = state.db.init_error();
    let status = if init_error.is_some() { "degraded" } else { "ok" };

    AppSuccess::new(
        axum::http::StatusCode::OK,
        "🐢 Machi Mouchkil API is running!",
        json!({
            "status": status,
            "database": {
                "backend": state.db.backend().to_string(),
                "error": init_error,
            },
        }),
    )
}

async fn tables(State(state): State<GlobalState>) -> Result<AppSuccess, AppError> {
    let tables = state.db.list_tables().await.map_err(|e| {
        AppError::new(
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            anyhow::Error::new(e).context("Failed to list tables"),
        )
    })?;

    Ok(AppSuccess::ok(json!({
        "backend": state.db.backend().to_string(),
        "tables": tables,
    })))
}
