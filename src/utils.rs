use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

/// 日志中上游响应体的最大截取长度
pub const LOG_PREVIEW_CHARS: usize = 500;

/// 连接超时，单次调用的总超时由各客户端按请求设置
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 创建上游调用共用的 HTTP 客户端
///
/// # 参数
///
/// * `disable_tls_verify` - 是否禁用 TLS 证书校验（用于 mitmproxy 等调试场景）
pub fn build_http_client(disable_tls_verify: bool) -> Result<Client> {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .user_agent(concat!("tribus/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10);

    if disable_tls_verify {
        tracing::warn!("TLS certificate verification is DISABLED - for debugging only!");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build().context("Failed to create HTTP client")
}

/// 截取字符串前 `max_chars` 个字符（按字符边界）
#[inline]
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// 拼接 base url 与路径，去掉多余的斜杠
#[inline]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
