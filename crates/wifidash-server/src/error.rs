use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use thiserror::Error;

use wifidash_core::CoreError;

/// One rejected request parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Application-level errors that map directly to HTTP responses.
///
/// Every variant implements [`IntoResponse`] so Axum handlers can use
/// `Result<impl IntoResponse, AppError>` as their return type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request parameters")]
    Validation(Vec<FieldError>),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError {
            field: field.into(),
            message: message.into(),
        }])
    }
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidFilter { field, reason } => AppError::invalid(field, reason),
            CoreError::NotFound(what) => AppError::NotFound(what),
            CoreError::Upstream(e) => AppError::Internal(e),
            e @ CoreError::Coercion { .. } => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation(details) => {
                tracing::warn!(?details, "rejected request parameters");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({
                        "error": {
                            "code": "VALIDATION_ERROR",
                            "message": "Invalid request parameters",
                            "details": details,
                        }
                    }),
                )
            }
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": {
                        "code": "NOT_FOUND",
                        "message": msg,
                        "details": {},
                    }
                }),
            ),
            AppError::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": {
                            "code": "INTERNAL_SERVER_ERROR",
                            "message": "An internal server error occurred",
                            "details": {},
                        }
                    }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Query-string extractor that reports deserialization failures through the
/// [`AppError`] envelope instead of axum's plain-text 400, keyed by the
/// offending parameter.
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts.uri.query().unwrap_or_default();
        let deserializer =
            serde_urlencoded::Deserializer::new(url::form_urlencoded::parse(raw.as_bytes()));
        serde_path_to_error::deserialize(deserializer)
            .map(ValidatedQuery)
            .map_err(|e| query_rejection(&e))
    }
}

fn query_rejection(err: &serde_path_to_error::Error<serde_urlencoded::de::Error>) -> AppError {
    let message = err.inner().to_string();
    let path = err.path().to_string();
    let field = if path == "." {
        missing_field(&message).unwrap_or("query").to_string()
    } else {
        path
    };
    AppError::invalid(field, message)
}

/// Serde reports absent required fields at the root path, naming them only
/// in the message.
fn missing_field(message: &str) -> Option<&str> {
    message.strip_prefix("missing field `")?.strip_suffix('`')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_onto_statuses() {
        let invalid: AppError = CoreError::InvalidFilter {
            field: "zoneId".to_string(),
            reason: "bad".to_string(),
        }
        .into();
        assert_eq!(
            invalid.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let missing: AppError = CoreError::NotFound("no venue data".to_string()).into();
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let coercion: AppError = CoreError::Coercion {
            field: "channel".to_string(),
            value: "x".to_string(),
            expected: "integer",
        }
        .into();
        assert_eq!(
            coercion.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn missing_field_is_read_from_message() {
        assert_eq!(missing_field("missing field `metric`"), Some("metric"));
        assert_eq!(missing_field("invalid digit found in string"), None);
    }
}
