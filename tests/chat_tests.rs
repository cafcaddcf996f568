//! /chat 路由集成测试

mod common;

use axum::http::StatusCode;
use common::{configured, post_json, post_raw, router, send, setup_mock_server};
use serde_json::json;
use tribus::Config;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/chat/v1/sessions"))
        .and(header("apikey", "chat-key"))
        .and(body_partial_json(json!({ "agentIds": [], "externalUserId": "user-1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Chat session created successfully",
            "data": { "id": "sess-1" }
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn chat_returns_extracted_reply() {
    let server = setup_mock_server().await;
    mount_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat/v1/sessions/sess-1/query"))
        .and(header("apikey", "chat-key"))
        .and(body_partial_json(json!({
            "query": "What is the capital of France?",
            "responseMode": "sync",
            "endpointId": "predefined-openai-gpt4.1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "queryResult": { "text": "  Paris  " } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = router(&configured(&server));
    let (status, body) = send(
        app,
        post_json("/chat", &json!({ "query": "What is the capital of France?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "reply": "Paris" }));
}

#[tokio::test]
async fn chat_prefers_earlier_answer_paths() {
    let server = setup_mock_server().await;
    mount_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat/v1/sessions/sess-1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "top-level",
            "data": {
                "answer": "",
                "queryResult": { "fulfillment": { "answer": "fulfilled" } }
            }
        })))
        .mount(&server)
        .await;

    let (status, body) = send(
        router(&configured(&server)),
        post_json("/chat", &json!({ "query": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "fulfilled");
}

#[tokio::test]
async fn chat_falls_back_to_serialized_response() {
    let server = setup_mock_server().await;
    mount_session(&server).await;
    let upstream = json!({ "data": { "queryResult": { "status": "completed" } } });
    Mock::given(method("POST"))
        .and(path("/chat/v1/sessions/sess-1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream.clone()))
        .mount(&server)
        .await;

    let (status, body) = send(
        router(&configured(&server)),
        post_json("/chat", &json!({ "query": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fallback"], true);
    let reply: serde_json::Value =
        serde_json::from_str(body["reply"].as_str().expect("reply is string")).unwrap();
    assert_eq!(reply, upstream);
}

#[tokio::test]
async fn invalid_query_is_rejected_before_any_upstream_call() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let config = configured(&server);
    for payload in [
        json!({ "query": "" }),
        json!({ "query": "   " }),
        json!({ "query": 42 }),
        json!({ "query": null }),
        json!({ "question": "hi" }),
    ] {
        let (status, body) = send(router(&config), post_json("/chat", &payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {payload}");
        assert_eq!(
            body["error"],
            "Missing 'query' in request body, or query is empty/invalid."
        );
    }
}

#[tokio::test]
async fn malformed_bodies_are_rejected() {
    let server = setup_mock_server().await;
    let config = configured(&server);

    let (status, body) = send(router(&config), post_raw("/chat", Some("text/plain"), "hi")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Invalid request: Content-Type must be application/json."
    );

    let (status, body) = send(
        router(&config),
        post_raw("/chat", Some("application/json"), "{not json"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request: Malformed or empty JSON body.");

    let (status, _) = send(router(&config), post_json("/chat", &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn missing_or_placeholder_credentials_yield_503() {
    let server = setup_mock_server().await;

    let mut config = configured(&server);
    config.chat.api_key = None;
    let (status, body) = send(router(&config), post_json("/chat", &json!({ "query": "hi" }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body["error"],
        "Chat Agent service is misconfigured (ON_DEMAND_API_KEY). Please contact support."
    );

    let placeholder = Config::from_toml_str(
        r#"
        [chat]
        api_key = "real-key"
        external_user_id = "<replace_external_user_id>"
        "#,
    )
    .unwrap();
    let (status, body) =
        send(router(&placeholder), post_json("/chat", &json!({ "query": "hi" }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("ON_DEMAND_EXTERNAL_USER_ID"));

    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn session_failures_map_to_bad_gateway() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/chat/v1/sessions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let (status, body) = send(
        router(&configured(&server)),
        post_json("/chat", &json!({ "query": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body["error"],
        "Chat Agent: Failed to establish a session with the agent service. Please try again later."
    );
}

#[tokio::test]
async fn session_without_id_maps_to_bad_gateway() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/chat/v1/sessions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": {} })))
        .mount(&server)
        .await;

    let (status, body) = send(
        router(&configured(&server)),
        post_json("/chat", &json!({ "query": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["details"].as_str().unwrap().contains("data.id"));
}

#[tokio::test]
async fn numeric_session_ids_are_accepted() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/chat/v1/sessions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": 12345 } })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/v1/sessions/12345/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "answer": "hi" } })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        router(&configured(&server)),
        post_json("/chat", &json!({ "query": "hello" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "reply": "hi" }));
}

#[tokio::test]
async fn query_failures_map_to_bad_gateway() {
    let server = setup_mock_server().await;
    mount_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat/v1/sessions/sess-1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let (status, body) = send(
        router(&configured(&server)),
        post_json("/chat", &json!({ "query": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body["error"],
        "Chat Agent: Failed to communicate with the underlying agent service. Please try again later."
    );
}
