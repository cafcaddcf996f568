//! Gateway 错误类型
//!
//! 所有失败都以 HTTP 状态码 + JSON 错误体返回。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::upstream::UpstreamError;
use crate::utils::preview;

/// 上游错误详情的最大长度
const DETAILS_PREVIEW_CHARS: usize = 200;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// 请求参数错误 (400)
    #[error("{0}")]
    BadRequest(String),

    /// 上游凭据缺失或仍是占位符 (503)
    #[error("{service} service is misconfigured ({setting}). Please contact support.")]
    Misconfigured {
        service: &'static str,
        setting: &'static str,
    },

    /// 上游不可达 (503)
    #[error("{message}")]
    Unavailable { message: String, details: String },

    /// 上游调用失败或返回了无法使用的结果 (502)
    #[error("{message}")]
    BadGateway {
        message: String,
        details: Option<String>,
    },

    /// 透传上游的错误状态码
    #[error("{message}")]
    Passthrough {
        status: StatusCode,
        message: String,
        details: String,
    },

    /// 内部错误 (500)
    #[error("{message}")]
    Internal { message: String, details: String },

    /// 路由不存在 (404)
    #[error("No route for {0}")]
    NotFound(String),

    /// 路由存在但方法不匹配 (405)
    #[error("Method {method} is not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    /// 请求处理超时 (408)
    #[error("Request timed out")]
    Timeout,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Misconfigured { .. } | GatewayError::Unavailable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Passthrough { status, .. } => *status,
            GatewayError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::Timeout => StatusCode::REQUEST_TIMEOUT,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            GatewayError::Unavailable { details, .. }
            | GatewayError::Passthrough { details, .. }
            | GatewayError::Internal { details, .. } => Some(details.clone()),
            GatewayError::BadGateway { details, .. } => details.clone(),
            _ => None,
        }
    }

    /// 将上游错误统一映射为 502，附带用户可读的提示
    pub fn bad_gateway(message: impl Into<String>, err: &UpstreamError) -> Self {
        GatewayError::BadGateway {
            message: message.into(),
            details: Some(err.to_string()),
        }
    }
}

/// 默认映射：HTTP 错误透传状态码，不可达 503，无法解析 500，缺字段 502
impl From<UpstreamError> for GatewayError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status {
                service,
                status,
                body,
            } => GatewayError::Passthrough {
                status,
                message: format!("{} API returned HTTP {}", title(service), status.as_u16()),
                details: preview(&body, DETAILS_PREVIEW_CHARS).to_string(),
            },
            UpstreamError::Transport { service, source } => GatewayError::Unavailable {
                message: format!("Error connecting to {} data source", service),
                details: source.to_string(),
            },
            UpstreamError::Decode { service, source } => GatewayError::Internal {
                message: format!("Failed to parse response from {} API", service),
                details: source.to_string(),
            },
            err @ UpstreamError::MissingField { .. } => GatewayError::BadGateway {
                message: "Received an unexpected response structure from upstream".to_string(),
                details: Some(err.to_string()),
            },
        }
    }
}

fn title(service: &str) -> String {
    let mut chars = service.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn misconfiguration_is_503_with_message() {
        let response = GatewayError::Misconfigured {
            service: "Chat Agent",
            setting: "ON_DEMAND_API_KEY",
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(
            body["error"],
            "Chat Agent service is misconfigured (ON_DEMAND_API_KEY). Please contact support."
        );
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn upstream_status_is_passed_through() {
        let err: GatewayError = UpstreamError::Status {
            service: "analytics",
            status: StatusCode::NOT_FOUND,
            body: "x".repeat(500),
        }
        .into();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Analytics API returned HTTP 404");
        assert_eq!(body["details"].as_str().map(str::len), Some(200));
    }

    #[test]
    fn decode_and_missing_field_mapping() {
        let decode = serde_json::from_str::<Value>("not json").unwrap_err();
        let err: GatewayError = UpstreamError::Decode {
            service: "analytics",
            source: decode,
        }
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: GatewayError = UpstreamError::MissingField {
            service: "video",
            field: "id",
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(GatewayError::BadRequest("bad".into()).status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn timeout_has_json_body() {
        let response = GatewayError::Timeout.into_response();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Request timed out");
    }
}
