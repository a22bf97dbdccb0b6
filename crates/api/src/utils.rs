use anyhow::anyhow;
use axum::extract::Request;
use axum::http::{header, StatusCode};
use tracing_subscriber::EnvFilter;

use crate::response::AppError;

pub fn extract_bearer_token(req: &Request) -> Result<String, AppError> {
    let missing = || AppError::new(StatusCode::UNAUTHORIZED, anyhow!("Token required"));

    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(missing)?;

    match value.split_whitespace().collect::<Vec<_>>().as_slice() {
        ["Bearer", token] => Ok(token.to_string()),
        _ => Err(missing()),
    }
}

/// Installs the global subscriber. `RUST_LOG` wins; otherwise `info`.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("tracing subscriber already installed");
    }
}

/// Parses a query-string number, treating garbage like an absent value.
pub fn parse_limit(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse().ok())
}
