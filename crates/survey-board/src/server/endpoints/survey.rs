//! Availability survey endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::SurveyError;
use crate::server::types::ApiErrorType;
use crate::server::util::generate_correlation_id;
use crate::survey::{self, NewResponse};
use crate::types::AppState;

/// Converts SurveyError to API response.
fn survey_error_to_response(error: SurveyError) -> Response {
    let (status, message) = match &error {
        SurveyError::NoSlotsSelected => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "Select at least one time slot",
        ),
        SurveyError::UnknownSlot(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "Submission contains an unknown time slot",
        ),
        SurveyError::Store(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to build the survey summary",
        ),
    };

    ApiErrorType::from((status, message, Some(error.to_string()))).into_response()
}

/// GET /survey/grid
///
/// Returns the day columns and hour rows of the checkbox grid.
pub async fn get_grid() -> Response {
    (StatusCode::OK, Json(survey::grid())).into_response()
}

/// POST /survey/responses
///
/// Records one availability response.
pub async fn post_response(
    State(s): State<Arc<AppState>>,
    body: Result<Json<NewResponse>, JsonRejection>,
) -> Response {
    let correlation_id = generate_correlation_id();
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(correlation_id = %correlation_id, "Rejected survey body: {}", rejection);
            return ApiErrorType::from(rejection).into_response();
        }
    };
    info!(
        correlation_id = %correlation_id,
        slots = body.slots.len(),
        "POST /survey/responses"
    );

    match survey::submit_response(&s.workbook, body).await {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(e) if e.is_user_error() => {
            warn!(correlation_id = %correlation_id, "Rejected survey response: {}", e);
            survey_error_to_response(e)
        }
        Err(e) => {
            error!(correlation_id = %correlation_id, "Failed to record survey response: {}", e);
            ApiErrorType::from((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to record response",
                Some(e.to_string()),
            ))
            .into_response()
        }
    }
}

/// GET /survey/summary
///
/// Re-reads the whole response log and returns the heatmap and top slots.
pub async fn get_summary(State(s): State<Arc<AppState>>) -> Response {
    let correlation_id = generate_correlation_id();
    info!(correlation_id = %correlation_id, "GET /survey/summary");

    match survey::load_summary(&s.workbook).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            error!(correlation_id = %correlation_id, "Failed to build survey summary: {}", e);
            survey_error_to_response(e)
        }
    }
}
