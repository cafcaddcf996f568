//! 集成测试公共工具

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tokio_test::assert_ok;
use tower::ServiceExt;
use tribus::{build_router, AppState, Config};
use wiremock::MockServer;

/// 启动一个模拟上游
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// 所有上游都指向同一个 mock server，凭据全部配置
pub fn configured(server: &MockServer) -> Config {
    let mut config = Config::default();

    config.chat.base_url = format!("{}/chat/v1", server.uri());
    config.chat.api_key = Some("chat-key".into());
    config.chat.external_user_id = Some("user-1".into());

    config.video.base_url = server.uri();
    config.video.api_key = Some("dmlkZW86a2V5".into());
    config.video.source_url = Some("https://img.example.com/face.png".into());

    config.analytics.base_url = server.uri();
    config.analytics.api_key = Some("phx_test".into());

    config
}

pub fn router(config: &Config) -> Router {
    build_router(assert_ok!(AppState::from_config(config)))
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    (status, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_raw(uri: &str, content_type: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
