//! Serve 命令 - 启动 API 服务器

use anyhow::Result;

use tribus::config::Config;
use tribus::gateway;

/// 执行服务器启动命令
///
/// 未配置凭据的上游不会阻止启动，对应路由返回 503。
/// 支持优雅关闭（Ctrl+C 或 SIGTERM）。
pub async fn serve_command(config: Config) -> Result<()> {
    let missing = config.missing_credentials();
    if !missing.is_empty() {
        tracing::warn!(
            "Missing credentials: {}. Dependent routes will answer 503.",
            missing.join(", ")
        );
    }

    gateway::serve(config).await
}
