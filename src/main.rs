//! Tribus 命令行入口
//!
//! # 命令行接口
//!
//! - `serve`: 启动 API 服务器
//! - `check`: 检查上游凭据是否已配置
//! - `ask`: 向本地服务器发送一次对话请求

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tribus::Config;

/// Tribus CLI
#[derive(Parser)]
#[command(name = "tribus")]
#[command(about = "Chat / video / analytics API gateway", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认查找 ./tribus.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// 可用的命令
#[derive(Subcommand)]
enum Commands {
    /// 启动 API 服务器
    Serve,
    /// 检查上游凭据配置，缺失时以非零状态退出
    Check,
    /// 向本地服务器的 /chat 发送一次提问
    Ask {
        /// 提问内容
        query: String,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tribus=info".into());

    let json = std::env::var("TRIBUS_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 加载 .env 文件（如果存在）
    if let Ok(dotenv_path) = std::env::var("TRIBUS_ENV_FILE") {
        dotenvy::from_path(&dotenv_path).ok();
    } else {
        dotenvy::dotenv().ok();
    }

    init_tracing();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => commands::serve_command(config).await,
        Commands::Check => commands::check_command(config),
        Commands::Ask { query } => commands::ask_command(config, &query).await,
    }
}
