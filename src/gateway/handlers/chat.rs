//! 对话 Agent 处理器

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use super::{json_body, required_str};
use crate::error::{GatewayError, GatewayResult};
use crate::extract::{extract_answer, Extracted};
use crate::gateway::state::AppState;
use crate::utils::preview;

/// 对话响应
#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
    /// 没有路径命中时为 true，此时 reply 是上游响应的序列化文本
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

/// POST /chat
pub async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> GatewayResult<Json<ChatReply>> {
    let chat = state.chat()?;

    let body = json_body(payload)?;
    let query = required_str(&body, "query").ok_or_else(|| {
        GatewayError::BadRequest(
            "Missing 'query' in request body, or query is empty/invalid.".to_string(),
        )
    })?;

    tracing::info!(query = preview(query, 100), "validated query");

    let session_id = chat.create_session().await.map_err(|e| {
        GatewayError::bad_gateway(
            "Chat Agent: Failed to establish a session with the agent service. Please try again later.",
            &e,
        )
    })?;

    let response = chat.submit_query(&session_id, query).await.map_err(|e| {
        GatewayError::bad_gateway(
            "Chat Agent: Failed to communicate with the underlying agent service. Please try again later.",
            &e,
        )
    })?;

    let reply = match extract_answer(&response) {
        Extracted::Found { path, text } => {
            tracing::info!(
                session_id = %session_id,
                path,
                reply = preview(&text, 100),
                "reply extracted"
            );
            ChatReply {
                reply: text,
                fallback: false,
            }
        }
        Extracted::Fallback(raw) => {
            tracing::warn!(
                session_id = %session_id,
                "no answer path matched, returning serialized response"
            );
            ChatReply {
                reply: raw,
                fallback: true,
            }
        }
    };

    Ok(Json(reply))
}

/// GET /chat/health
///
/// 模块本身在运行即视为健康，未配置凭据只记录警告
pub async fn handle_chat_health(State(state): State<AppState>) -> Json<Value> {
    let [(_, chat_missing), ..] = state.missing_settings();
    if let Some(setting) = chat_missing {
        tracing::warn!(setting, "chat health check: credential is not configured");
    }

    Json(json!({
        "status": "healthy",
        "module": "chat_agent",
        "configured": chat_missing.is_none(),
    }))
}
