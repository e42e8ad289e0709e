//! Topic board endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::TopicError;
use crate::server::types::ApiErrorType;
use crate::server::util::generate_correlation_id;
use crate::topics::{self, NewTopic, PublicTopic};
use crate::types::AppState;

/// Converts TopicError to API response.
fn topic_error_to_response(error: TopicError) -> Response {
    let (status, message) = match &error {
        TopicError::MissingField { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "Both a name and a topic are required",
        ),
        TopicError::NotFound { .. } => (StatusCode::NOT_FOUND, "Topic not found"),
        TopicError::Contended { .. } => (
            StatusCode::CONFLICT,
            "Too many simultaneous votes, try again",
        ),
        TopicError::CorruptRow { .. } | TopicError::Store(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to update the topic board",
        ),
    };

    ApiErrorType::from((status, message, Some(error.to_string()))).into_response()
}

fn log_topic_error(correlation_id: &str, error: &TopicError) {
    if error.is_user_error() {
        warn!(correlation_id = %correlation_id, "Rejected topic request: {}", error);
    } else {
        error!(correlation_id = %correlation_id, "Topic request failed: {}", error);
    }
}

/// GET /topics
///
/// Returns every topic in submission order, without submitter names.
pub async fn get_topics(State(s): State<Arc<AppState>>) -> Response {
    let correlation_id = generate_correlation_id();
    info!(correlation_id = %correlation_id, "GET /topics");

    match topics::list_topics(&s.workbook).await {
        Ok(entries) => {
            let response: Vec<PublicTopic> = entries.iter().map(PublicTopic::from).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            log_topic_error(&correlation_id, &e);
            topic_error_to_response(e)
        }
    }
}

/// POST /topics
///
/// Adds a topic with one vote.
pub async fn post_topic(
    State(s): State<Arc<AppState>>,
    body: Result<Json<NewTopic>, JsonRejection>,
) -> Response {
    let correlation_id = generate_correlation_id();
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(correlation_id = %correlation_id, "Rejected topic body: {}", rejection);
            return ApiErrorType::from(rejection).into_response();
        }
    };
    info!(
        correlation_id = %correlation_id,
        direction = %body.direction,
        "POST /topics"
    );

    match topics::submit_topic(&s.workbook, body).await {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(e) => {
            log_topic_error(&correlation_id, &e);
            topic_error_to_response(e)
        }
    }
}

/// POST /topics/:id/vote
///
/// Adds one vote to a topic and returns its new count.
pub async fn post_vote(
    id: Result<Path<Uuid>, PathRejection>,
    State(s): State<Arc<AppState>>,
) -> Response {
    let correlation_id = generate_correlation_id();
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => {
            warn!(correlation_id = %correlation_id, "Rejected topic id: {}", rejection);
            return ApiErrorType::from(rejection).into_response();
        }
    };
    info!(correlation_id = %correlation_id, "POST /topics/{}/vote", id);

    match topics::vote(&s.workbook, id, s.config.vote_retry_limit).await {
        Ok(entry) => (StatusCode::OK, Json(PublicTopic::from(&entry))).into_response(),
        Err(e) => {
            log_topic_error(&correlation_id, &e);
            topic_error_to_response(e)
        }
    }
}
