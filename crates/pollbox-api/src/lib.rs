pub mod error;
pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use pollbox_core::AppState;

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/v1/channels",
            get(routes::channels::list_channels).post(routes::channels::create_channel),
        )
        .route(
            "/api/v1/channels/{channel_id}",
            get(routes::channels::get_channel),
        )
        .route(
            "/api/v1/channels/{channel_id}/questions",
            get(routes::questions::list_questions).post(routes::questions::create_question),
        )
        .route(
            "/api/v1/questions/{question_id}",
            get(routes::questions::get_question),
        )
        .route(
            "/api/v1/choices/{choice_id}/votes",
            post(routes::votes::cast_vote),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pollbox_core::memory::MemoryStore;
    use pollbox_core::sqlite::SqliteStore;
    use pollbox_core::PollSettings;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn memory_app(settings: PollSettings) -> Router {
        build_router().with_state(AppState::new(Arc::new(MemoryStore::new()), settings))
    }

    async fn sqlite_app() -> Router {
        let pool = pollbox_db::create_pool("sqlite::memory:", 1)
            .await
            .expect("pool");
        pollbox_db::run_migrations(&pool).await.expect("migrations");
        let store = SqliteStore::new(pool);
        build_router().with_state(AppState::new(Arc::new(store), PollSettings::default()))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn post_channel(app: &Router, name: &str) -> Value {
        let (status, body) =
            send(app, "POST", "/api/v1/channels", Some(json!({ "name": name }))).await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    async fn post_question(
        app: &Router,
        channel_id: &str,
        text: &str,
        choices: &[&str],
    ) -> (StatusCode, Value) {
        send(
            app,
            "POST",
            &format!("/api/v1/channels/{channel_id}/questions"),
            Some(json!({ "text": text, "choices": choices })),
        )
        .await
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = memory_app(PollSettings::default());
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn full_poll_flow_over_sqlite() {
        let app = sqlite_app().await;

        let (status, body) = send(&app, "GET", "/api/v1/channels", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let channel = post_channel(&app, "  Team A ").await;
        assert_eq!(channel["name"], "Team A");
        let channel_id = channel["id"].as_str().unwrap().to_string();

        let (status, question) =
            post_question(&app, &channel_id, "Pizza or Tacos?", &["Pizza", "Tacos"]).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(question["choices"].as_array().unwrap().len(), 2);
        assert_eq!(question["total_votes"], 0);

        let tacos = question["choices"][1]["id"].as_str().unwrap().to_string();
        let (status, choice) =
            send(&app, "POST", &format!("/api/v1/choices/{tacos}/votes"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(choice["text"], "Tacos");
        assert_eq!(choice["votes"], 1);

        let (status, listed) = send(
            &app,
            "GET",
            &format!("/api/v1/channels/{channel_id}/questions"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed[0]["text"], "Pizza or Tacos?");
        assert_eq!(listed[0]["choices"][0]["votes"], 0);
        assert_eq!(listed[0]["choices"][1]["votes"], 1);
        assert_eq!(listed[0]["total_votes"], 1);

        let question_id = question["id"].as_str().unwrap();
        let (status, fetched) =
            send(&app, "GET", &format!("/api/v1/questions/{question_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["choices"][1]["votes"], 1);
    }

    #[tokio::test]
    async fn invalid_input_maps_to_bad_request() {
        let app = memory_app(PollSettings::default());
        let (status, body) =
            send(&app, "POST", "/api/v1/channels", Some(json!({ "name": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");

        let channel = post_channel(&app, "general").await;
        let channel_id = channel["id"].as_str().unwrap();
        let (status, body) = post_question(&app, channel_id, "Q", &["", "Tacos"]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn malformed_bodies_are_invalid_input() {
        let app = memory_app(PollSettings::default());
        let channel = post_channel(&app, "general").await;
        let questions_uri = format!(
            "/api/v1/channels/{}/questions",
            channel["id"].as_str().unwrap()
        );

        let cases = [
            ("/api/v1/channels", json!({})),
            ("/api/v1/channels", json!({ "name": 5 })),
            (questions_uri.as_str(), json!({})),
            (questions_uri.as_str(), json!({ "text": 5, "choices": ["A", "B"] })),
        ];
        for (uri, body) in cases {
            let (status, response) = send(&app, "POST", uri, Some(body.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {body}");
            assert_eq!(response["code"], "INVALID_INPUT");
            assert!(response["message"].is_string());
        }

        let (_, listed) = send(&app, "GET", "/api/v1/channels", None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_ids_are_invalid_input() {
        let app = memory_app(PollSettings::default());
        for uri in [
            "/api/v1/channels/not-a-uuid",
            "/api/v1/channels/not-a-uuid/questions",
            "/api/v1/questions/42",
        ] {
            let (status, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["code"], "INVALID_INPUT");
        }
        let (status, _) = send(&app, "POST", "/api/v1/choices/nope/votes", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_resources_are_not_found() {
        let app = memory_app(PollSettings::default());
        let missing = pollbox_models::ChoiceId::new();
        let (status, body) =
            send(&app, "POST", &format!("/api/v1/choices/{missing}/votes"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let channel = pollbox_models::ChannelId::new();
        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/v1/channels/{channel}/questions"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn lenient_scope_lists_unknown_channel_as_empty() {
        let app = memory_app(PollSettings {
            require_existing_channel: false,
            ..PollSettings::default()
        });
        let channel = pollbox_models::ChannelId::new();
        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/v1/channels/{channel}/questions"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }
}
