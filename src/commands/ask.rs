//! Ask 命令 - 向本地服务器发送一次提问
//!
//! 用于验证本地运行的网关和对话上游是否正常工作。

use anyhow::{Context, Result};

use tribus::config::Config;

/// 执行提问命令
///
/// # 参数
///
/// * `config` - 应用配置，用于获取服务器地址
/// * `query` - 提问内容
pub async fn ask_command(config: Config, query: &str) -> Result<()> {
    // 0.0.0.0 只能监听，不能作为目标地址
    let host = if config.host == "0.0.0.0" {
        "127.0.0.1"
    } else {
        config.host.as_str()
    };
    let url = format!("http://{}:{}/chat", host, config.port);

    println!("Request URL: {}", url);

    let response = reqwest::Client::new()
        .post(&url)
        .json(&serde_json::json!({ "query": query }))
        .send()
        .await
        .context("Request failed. Make sure the server is running.")?;

    let status = response.status();
    println!("Response status: {}", status);

    let body: serde_json::Value = response
        .json()
        .await
        .context("Failed to read response body")?;

    if !status.is_success() {
        anyhow::bail!("Request failed: {}", body);
    }

    match body.get("reply").and_then(|v| v.as_str()) {
        Some(reply) => println!("{}", reply),
        None => println!("{}", body),
    }

    Ok(())
}
