//! 健康检查和服务索引处理器

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::gateway::state::AppState;
use crate::upstream::Insight;

/// 上游模块状态
#[derive(Serialize)]
struct ModuleStatus {
    name: &'static str,
    configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing: Option<&'static str>,
}

/// 健康检查响应
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    modules: Vec<ModuleStatus>,
}

/// GET /health
pub async fn handle_health(State(state): State<AppState>) -> Json<Value> {
    let modules: Vec<ModuleStatus> = state
        .missing_settings()
        .into_iter()
        .map(|(name, missing)| ModuleStatus {
            name,
            configured: missing.is_none(),
            missing,
        })
        .collect();

    Json(json!(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        modules,
    }))
}

/// GET /
pub async fn handle_index() -> Json<Value> {
    let insights: Vec<String> = Insight::ALL
        .iter()
        .map(|insight| format!("/{}", insight.route()))
        .collect();

    Json(json!({
        "status": "healthy",
        "message": "tribus gateway is running.",
        "services": {
            "chat_agent": { "health_url": "/chat/health", "routes": ["/chat"] },
            "video": { "routes": ["/video", "/video/{id}"] },
            "analytics": { "health_url": "/analytics/health", "routes": insights },
        },
        "health_url": "/health",
    }))
}
