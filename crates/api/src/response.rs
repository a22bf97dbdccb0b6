use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use machi_core::CoreError;

/// A successful reply. The body is a flat JSON object; when a message is given it is
/// added under `message` next to the payload fields.
#[derive(Debug, Clone)]
pub struct AppSuccess {
    pub status: StatusCode,
    pub body: Value,
}

impl AppSuccess {
    pub fn new(status: StatusCode, message: &str, data: Value) -> Self {
        let body = match data {
            Value::Object(mut map) => {
                map.insert("message".to_string(), Value::String(message.to_string()));
                Value::Object(map)
            }
            Value::Null => json!({ "message": message }),
            other => json!({ "message": message, "data": other }),
        };
        Self { status, body }
    }

    pub fn ok(data: Value) -> Self {
        Self { status: StatusCode::OK, body: data }
    }
}

impl IntoResponse for AppSuccess {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// Make our own error that wraps `anyhow::Error`.
#[derive(Debug)]
pub struct AppError(pub StatusCode, pub anyhow::Error);

impl AppError {
    pub fn new(status: StatusCode, err: anyhow::Error) -> Self {
        Self(status, err)
    }

    pub fn bad_request(message: &str) -> Self {
        Self(StatusCode::BAD_REQUEST, anyhow::anyhow!(message.to_string()))
    }

    /// Maps a domain error to its status. Backend failures keep their full chain for the
    /// log, but the client only sees `generic`.
    pub fn from_core(err: CoreError, generic: &'static str) -> Self {
        let status = match &err {
            CoreError::Validation(_) | CoreError::Precondition(_) => StatusCode::BAD_REQUEST,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CoreError::Database(_) | CoreError::Internal(_) => {
                return Self(StatusCode::INTERNAL_SERVER_ERROR, anyhow::Error::new(err).context(generic));
            }
        };
        Self(status, anyhow::Error::new(err))
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self::from_core(err, "Internal server error")
    }
}

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.0.is_server_error() {
            tracing::error!("CODE: {}, ERROR: {:#}", self.0.as_u16(), self.1);
        } else {
            tracing::debug!("CODE: {}, MESSAGE: {}", self.0.as_u16(), self.1);
        }
        // only the outermost message goes to the client
        (self.0, Json(json!({ "error": self.1.to_string() }))).into_response()
    }
}

/// `.or_500("Failed to ...")` on domain results inside handlers.
pub trait OrInternal<T> {
    fn or_500(self, generic: &'static str) -> Result<T, AppError>;
}

impl<T> OrInternal<T> for Result<T, CoreError> {
    fn or_500(self, generic: &'static str) -> Result<T, AppError> {
        self.map_err(|e| AppError::from_core(e, generic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_merged_into_the_payload() {
        let success = AppSuccess::new(StatusCode::CREATED, "Welcome", json!({ "token": "t" }));
        assert_eq!(success.status, StatusCode::CREATED);
        assert_eq!(success.body, json!({ "message": "Welcome", "token": "t" }));
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        let err = AppError::from_core(CoreError::validation("Unknown action"), "Failed");
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1.to_string(), "Unknown action");

        let err = AppError::from_core(CoreError::not_found("User not found"), "Failed");
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let err = AppError::from_core(CoreError::Unauthorized("Invalid credentials".into()), "Failed");
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn backend_errors_hide_behind_the_generic_message() {
        let err = AppError::from_core(
            CoreError::Database(machi_database::SqlxError::RowNotFound),
            "Failed to record visit",
        );
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.1.to_string(), "Failed to record visit");
        assert!(format!("{:#}", err.1).contains("no rows returned"));
    }
}
