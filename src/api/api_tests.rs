#[cfg(test)]
mod router_tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::api::{app_state::AppState, create_app};
    use crate::config::config::AppConfig;
    use crate::observability::{AppMetrics, ObservabilityState};

    fn test_app() -> (Router, TempDir) {
        let books = tempfile::tempdir().unwrap();
        let mut config = AppConfig::development();
        config.completion.backend = "offline".into();
        config.personas.rng_seed = Some(42);
        config.knowledge.books_dir = books.path().to_path_buf();

        let metrics = Arc::new(AppMetrics::default());
        let state = AppState::from_config(config, metrics.clone()).unwrap();
        let observability = Arc::new(ObservabilityState::new("test", metrics));
        (create_app(state, observability), books)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_list_personas_returns_catalog() {
        let (app, _books) = test_app();
        let (status, body) = call(&app, "GET", "/api/v1/personas", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["personas"][0]["id"], "sarah-johnson");
    }

    #[tokio::test]
    async fn test_get_unknown_persona_returns_404() {
        let (app, _books) = test_app();
        let (status, body) = call(&app, "GET", "/api/v1/personas/nobody", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_generate_then_delete_persona() {
        let (app, _books) = test_app();
        let (status, generated) = call(&app, "POST", "/api/v1/personas/generate", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = generated["id"].as_str().unwrap().to_string();

        let (status, _) = call(&app, "DELETE", &format!("/api/v1/personas/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, "GET", &format!("/api/v1/personas/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let (app, _books) = test_app();
        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/personas/sarah-johnson/conversation/messages",
            Some(json!({"language": "en"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/personas/sarah-johnson/conversation/messages",
            Some(json!({"text": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_offline_chat_turn() {
        let (app, _books) = test_app();
        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/personas/sarah-johnson/conversation/messages",
            Some(json!({"text": "How have you been sleeping?", "language": "en"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "calm");
        assert_eq!(body["has_patient_left"], false);
        assert!(!body["reply"]["text"].as_str().unwrap().is_empty());

        let (_, conversation) =
            call(&app, "GET", "/api/v1/personas/sarah-johnson/conversation", None).await;
        assert_eq!(conversation["messages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_condition_triggers_accumulate_until_patient_leaves() {
        let (app, _books) = test_app();
        let uri = "/api/v1/personas/michael-chen/conversation/messages";

        let (_, first) = call(&app, "POST", uri, Some(json!({"text": "Cheer up"}))).await;
        assert_eq!(first["state"], "escalating");
        assert_eq!(first["reply"]["sentiment"], "uncomfortable");

        let (_, second) = call(&app, "POST", uri, Some(json!({"text": "Just cheer up"}))).await;
        assert_eq!(second["state"], "escalating");

        let (_, third) = call(&app, "POST", uri, Some(json!({"text": "Snap out of it"}))).await;
        assert_eq!(third["has_patient_left"], true);
        assert_eq!(third["reply"]["is_patient_leaving"], true);
        assert_eq!(third["reply"]["sentiment"], "upset");
    }

    #[tokio::test]
    async fn test_insult_ends_session_with_conflict() {
        let (app, _books) = test_app();
        let uri = "/api/v1/personas/michael-chen/conversation/messages";

        let (_, left) = call(&app, "POST", uri, Some(json!({"text": "You are stupid"}))).await;
        assert_eq!(left["state"], "left");
        assert_eq!(left["reply"]["is_patient_leaving"], true);

        let (status, body) = call(&app, "POST", uri, Some(json!({"text": "Sorry"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, reset) =
            call(&app, "DELETE", "/api/v1/personas/michael-chen/conversation", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reset["state"], "calm");
        assert_eq!(reset["messages"], json!([]));
    }

    #[tokio::test]
    async fn test_delete_leaving_message_resumes_session() {
        let (app, _books) = test_app();
        let uri = "/api/v1/personas/emma-wilson/conversation/messages";
        let (_, left) = call(&app, "POST", uri, Some(json!({"text": "You are stupid"}))).await;
        let leaving_id = left["reply"]["id"].as_str().unwrap();

        let (status, snapshot) = call(
            &app,
            "DELETE",
            &format!("{}/{}", uri, leaving_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["has_patient_left"], false);
        assert_eq!(snapshot["discomfort"], 0.0);

        let (status, _) = call(&app, "POST", uri, Some(json!({"text": "Let's start again"}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_files() {
        let (app, _books) = test_app();
        let boundary = "vpatient-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"notes.txt\"\r\n\
             Content-Type: text/plain\r\n\r\nhello\r\n--{b}--\r\n",
            b = boundary
        );
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/uploads")
                    .header(
                        "Content-Type",
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_without_multipart_body_is_bad_request() {
        let (app, _books) = test_app();
        let (status, body) = call(&app, "POST", "/api/v1/uploads", Some(json!({"files": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_upload_status_starts_empty() {
        let (app, books) = test_app();
        let (status, body) = call(&app, "GET", "/api/v1/uploads/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["books"], json!([]));

        std::fs::write(books.path().join("dsm.pdf"), b"%PDF").unwrap();
        let (_, body) = call(&app, "GET", "/api/v1/uploads/status", None).await;
        assert_eq!(body["books"][0]["filename"], "dsm.pdf");
        assert_eq!(body["books"][0]["status"], "pending");
    }

    #[tokio::test]
    async fn test_knowledge_search_requires_query() {
        let (app, _books) = test_app();
        let (status, _) = call(&app, "GET", "/api/v1/knowledge/search?condition=Depression", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &app,
            "GET",
            "/api/v1/knowledge/search?condition=Depression&query=low%20mood",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn test_health_and_metrics_are_mounted() {
        let (app, _books) = test_app();
        let (status, _) = call(&app, "GET", "/health/live", None).await;
        assert_eq!(status, StatusCode::OK);

        call(&app, "GET", "/api/v1/personas", None).await;
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("http_requests_total"));
    }
}
