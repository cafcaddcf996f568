//! 上游客户端
//!
//! 每个第三方 API 一个参数化客户端，均由 [`Config`](crate::config::Config) 显式构造。

pub mod analytics;
pub mod chat;
pub mod video;

pub use analytics::{AnalyticsClient, Insight};
pub use chat::ChatClient;
pub use video::{Talk, VideoClient};

use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::utils::{preview, LOG_PREVIEW_CHARS};

/// 上游调用错误
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// 连接失败、超时等传输层错误
    #[error("request to {service} failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// 上游返回非 2xx 状态码
    #[error("{service} returned HTTP {status}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    /// 响应体不是合法 JSON
    #[error("failed to parse {service} response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// 响应中缺少必需字段
    #[error("{service} response is missing '{field}'")]
    MissingField {
        service: &'static str,
        field: &'static str,
    },
}

/// 发送请求并解析 JSON 响应
///
/// 非 2xx 状态码和无法解析的响应体都会记录日志（截断到 500 字符）后返回错误。
pub(crate) async fn send_json(
    service: &'static str,
    request: RequestBuilder,
) -> Result<Value, UpstreamError> {
    let response = request
        .send()
        .await
        .map_err(|source| UpstreamError::Transport { service, source })?;

    let status = response.status();
    tracing::info!(service, status = status.as_u16(), "upstream response");

    let body = response
        .text()
        .await
        .map_err(|source| UpstreamError::Transport { service, source })?;

    if !status.is_success() {
        tracing::error!(
            service,
            status = status.as_u16(),
            body = preview(&body, LOG_PREVIEW_CHARS),
            "upstream returned error status"
        );
        return Err(UpstreamError::Status {
            service,
            status,
            body,
        });
    }

    serde_json::from_str(&body).map_err(|source| {
        tracing::error!(
            service,
            error = %source,
            body = preview(&body, LOG_PREVIEW_CHARS),
            "upstream returned invalid JSON"
        );
        UpstreamError::Decode { service, source }
    })
}
