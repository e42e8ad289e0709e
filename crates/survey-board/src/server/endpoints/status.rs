use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::types::AppState;

/// GET /health
///
/// Reports whether the workbook is reachable and, if not, why.
pub async fn get_health(State(s): State<Arc<AppState>>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "store_available": s.workbook.is_available(),
            "store_error": s.workbook.unavailable_reason(),
        })),
    )
        .into_response()
}
