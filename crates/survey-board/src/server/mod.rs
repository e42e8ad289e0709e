use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::server::endpoints::{status, survey, topics};
use crate::types::AppState;

mod endpoints;
mod types;
mod util;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let survey_router = Router::new()
        .route("/grid", get(survey::get_grid))
        .route("/responses", post(survey::post_response))
        .route("/summary", get(survey::get_summary));

    Router::new()
        .route("/health", get(status::get_health))
        .nest("/survey", survey_router)
        .route("/topics", get(topics::get_topics).post(topics::post_topic))
        .route("/topics/:id/vote", post(topics::post_vote))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::{MemoryWorkbook, Workbook};
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    /// Serves the router on an ephemeral port and returns its base URL.
    async fn spawn(workbook: Workbook) -> String {
        let state = AppState::with_workbook(Config::default(), workbook);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, create_router(state)).await.unwrap();
        });

        format!("http://{}", address)
    }

    async fn spawn_with_memory() -> String {
        spawn(Workbook::new(Arc::new(MemoryWorkbook::new())).unwrap()).await
    }

    #[tokio::test]
    async fn test_health_reports_store() {
        let base = spawn(Workbook::inert("no credentials")).await;
        let body: Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["store_available"], false);
        assert_eq!(body["store_error"], "no credentials");
    }

    #[tokio::test]
    async fn test_grid_endpoint() {
        let base = spawn_with_memory().await;
        let body: Value = reqwest::get(format!("{base}/survey/grid"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["days"].as_array().unwrap().len(), 4);
        assert_eq!(body["hours"][0]["slots"][0], "Sat-06:00");
    }

    #[tokio::test]
    async fn test_submit_then_summarize() {
        let base = spawn_with_memory().await;
        let client = reqwest::Client::new();

        for slots in [json!(["Sat-09:00", "Sun-09:00"]), json!(["Sat-9:00"])] {
            let response = client
                .post(format!("{base}/survey/responses"))
                .json(&json!({ "name": "", "slots": slots }))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let summary: Value = client
            .get(format!("{base}/survey/summary"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(summary["respondents"], 2);
        assert_eq!(summary["heatmap"]["counts"][3][0], 2);
        assert_eq!(summary["heatmap"]["counts"][3][1], 1);
        assert_eq!(summary["top"][0]["slot"], "Sat-09:00");
        assert_eq!(summary["top"][0]["count"], 2);
        assert_eq!(summary["dropped_tokens"], 0);
    }

    #[tokio::test]
    async fn test_empty_selection_is_unprocessable() {
        let base = spawn_with_memory().await;
        let response = reqwest::Client::new()
            .post(format!("{base}/survey/responses"))
            .json(&json!({ "slots": [] }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Select at least one time slot");
    }

    #[tokio::test]
    async fn test_topic_lifecycle() {
        let base = spawn_with_memory().await;
        let client = reqwest::Client::new();

        let created = client
            .post(format!("{base}/topics"))
            .json(&json!({ "name": "Mei", "topic": "Pairing sessions", "direction": "want to hear" }))
            .send()
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let created: Value = created.json().await.unwrap();
        let id = created["topic"]["id"].as_str().unwrap().to_string();
        assert_eq!(created["topic"]["votes"], 1);

        let voted: Value = client
            .post(format!("{base}/topics/{id}/vote"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(voted["votes"], 2);

        let listed: Value = client
            .get(format!("{base}/topics"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["votes"], 2);
        assert_eq!(listed[0]["direction"], "want to hear");
        assert!(listed[0].get("name").is_none());
    }

    #[tokio::test]
    async fn test_topic_errors() {
        let base = spawn_with_memory().await;
        let client = reqwest::Client::new();

        let missing = client
            .post(format!("{base}/topics"))
            .json(&json!({ "name": "", "topic": "x", "direction": "want to talk" }))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let unknown = client
            .post(format!("{base}/topics/{}/vote", uuid::Uuid::new_v4()))
            .send()
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_requests_use_json_error_body() {
        let base = spawn_with_memory().await;
        let client = reqwest::Client::new();

        let bad_direction = client
            .post(format!("{base}/topics"))
            .json(&json!({ "name": "Mei", "topic": "x", "direction": "want to sing" }))
            .send()
            .await
            .unwrap();
        assert_eq!(bad_direction.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = bad_direction.json().await.unwrap();
        assert_eq!(body["error"], "Invalid request body");
        assert!(body["details"].as_str().unwrap().contains("direction"));

        let bad_id = client
            .post(format!("{base}/topics/not-a-uuid/vote"))
            .send()
            .await
            .unwrap();
        assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
        let body: Value = bad_id.json().await.unwrap();
        assert_eq!(body["error"], "Invalid request path");

        let bad_slots = client
            .post(format!("{base}/survey/responses"))
            .json(&json!({ "slots": "Sat-09:00" }))
            .send()
            .await
            .unwrap();
        assert_eq!(bad_slots.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = bad_slots.json().await.unwrap();
        assert_eq!(body["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn test_inert_store_accepts_but_does_not_persist() {
        let base = spawn(Workbook::inert("no credentials")).await;
        let client = reqwest::Client::new();

        let body: Value = client
            .post(format!("{base}/survey/responses"))
            .json(&json!({ "slots": ["Fri-20:00"] }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["persisted"], false);

        let summary: Value = client
            .get(format!("{base}/survey/summary"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(summary["respondents"], 0);
    }
}
