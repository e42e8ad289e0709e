use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// JSON error body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiErrorType {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<(StatusCode, &str, Option<String>)> for ApiErrorType {
    fn from((status, error, details): (StatusCode, &str, Option<String>)) -> Self {
        Self {
            status,
            error: error.to_string(),
            details,
        }
    }
}

impl From<JsonRejection> for ApiErrorType {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            error: "Invalid request body".to_string(),
            details: Some(rejection.body_text()),
        }
    }
}

impl From<PathRejection> for ApiErrorType {
    fn from(rejection: PathRejection) -> Self {
        Self {
            status: rejection.status(),
            error: "Invalid request path".to_string(),
            details: Some(rejection.body_text()),
        }
    }
}

impl IntoResponse for ApiErrorType {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
