//! HTTP 请求处理器

pub mod analytics;
pub mod chat;
pub mod fallback;
pub mod health;
pub mod video;

pub use analytics::{handle_analytics_health, handle_insight};
pub use chat::{handle_chat, handle_chat_health};
pub use fallback::{handle_method_not_allowed, handle_not_found};
pub use health::{handle_health, handle_index};
pub use video::{handle_create_video, handle_get_video};

use axum::extract::rejection::JsonRejection;
use serde_json::Value;

use crate::error::GatewayError;

/// 解析 JSON 请求体，任何解析失败都视为 400
///
/// `null` 和空对象同样视为无效请求体
fn json_body(payload: Result<axum::Json<Value>, JsonRejection>) -> Result<Value, GatewayError> {
    let axum::Json(body) = payload.map_err(|rejection| match rejection {
        JsonRejection::MissingJsonContentType(_) => GatewayError::BadRequest(
            "Invalid request: Content-Type must be application/json.".to_string(),
        ),
        _ => GatewayError::BadRequest("Invalid request: Malformed or empty JSON body.".to_string()),
    })?;

    let is_empty = match &body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if is_empty {
        return Err(GatewayError::BadRequest(
            "Invalid request: Malformed or empty JSON body.".to_string(),
        ));
    }

    Ok(body)
}

/// 读取非空白的字符串字段
fn required_str<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// 读取可选的字符串字段，空白视为未提供
fn optional_str<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    required_str(body, field).map(str::trim)
}
