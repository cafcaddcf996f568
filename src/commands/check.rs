//! Check 命令 - 检查上游凭据配置

use anyhow::{bail, Result};

use tribus::config::Config;

/// 执行配置检查
///
/// 逐项打印凭据状态；有缺失时返回错误（进程以非零状态退出）
pub fn check_command(config: Config) -> Result<()> {
    let missing = config.missing_credentials();

    println!("Chat upstream:      {}", config.chat.base_url);
    println!("Video upstream:     {}", config.video.base_url);
    println!(
        "Analytics upstream: {} (project {})",
        config.analytics.base_url, config.analytics.project_id
    );
    println!();

    if missing.is_empty() {
        println!("All required credentials are configured.");
        return Ok(());
    }

    for name in &missing {
        println!("missing: {}", name);
    }
    bail!(
        "Missing environment variables: {}. Set them in .env or the environment.",
        missing.join(", ")
    )
}
