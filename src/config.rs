//! 应用配置模块
//!
//! 启动时加载一次，之后以显式参数的形式传给各个上游客户端。
//! 优先级：内置默认值 < TOML 配置文件 < 环境变量。
//!
//! - 服务器监听地址和端口
//! - 三个上游（对话、视频、分析）的地址与凭据

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHAT_BASE_URL: &str = "https://api.on-demand.io/chat/v1";
pub const DEFAULT_CHAT_ENDPOINT_ID: &str = "predefined-openai-gpt4.1";
pub const DEFAULT_CHAT_AGENT_IDS: &[&str] =
    &["agent-1712327325", "agent-1713962163", "agent-1747649298"];
pub const DEFAULT_FULFILLMENT_PROMPT: &str = "Provide only the direct answer to the user's query. \
Do not include any metadata, token counts, or conversational filler. Be concise and to the point.";

pub const DEFAULT_VIDEO_BASE_URL: &str = "https://api.d-id.com";
pub const DEFAULT_VIDEO_VOICE_ID: &str = "en-US-JennyNeural";

pub const DEFAULT_ANALYTICS_BASE_URL: &str = "https://us.posthog.com";
pub const DEFAULT_ANALYTICS_PROJECT_ID: &str = "128173";

/// 单个请求的总超时（最多两次上游调用，每次最长 30 秒）
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

const CONFIG_FILE_NAME: &str = "tribus.toml";

/// 对话上游配置
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub external_user_id: Option<String>,
    pub endpoint_id: String,
    pub agent_ids: Vec<String>,
    pub fulfillment_prompt: String,
}

/// 视频上游配置
#[derive(Debug, Clone)]
pub struct VideoConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// 未在请求中指定时使用的头像图片地址
    pub source_url: Option<String>,
    pub voice_id: String,
}

/// 各 insight 的 ID（数字 ID 或 short id）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InsightIds {
    pub dau: String,
    pub wau: String,
    pub retention: String,
    pub growth_accounting: String,
}

impl Default for InsightIds {
    fn default() -> Self {
        Self {
            dau: "2370862".to_string(),
            wau: "2370863".to_string(),
            retention: "2370864".to_string(),
            growth_accounting: "2370865".to_string(),
        }
    }
}

/// 分析上游配置
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub project_id: String,
    pub insights: InsightIds,
}

/// 应用配置
#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器监听地址（如 "0.0.0.0" 或 "127.0.0.1"）
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
    /// 是否禁用上游 TLS 证书校验（仅用于调试）
    pub disable_tls_verify: bool,
    /// 单个请求的总超时（秒）
    pub request_timeout_secs: u64,
    pub chat: ChatConfig,
    pub video: VideoConfig,
    pub analytics: AnalyticsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            disable_tls_verify: false,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            chat: ChatConfig {
                base_url: DEFAULT_CHAT_BASE_URL.to_string(),
                api_key: None,
                external_user_id: None,
                endpoint_id: DEFAULT_CHAT_ENDPOINT_ID.to_string(),
                agent_ids: DEFAULT_CHAT_AGENT_IDS.iter().map(|s| s.to_string()).collect(),
                fulfillment_prompt: DEFAULT_FULFILLMENT_PROMPT.to_string(),
            },
            video: VideoConfig {
                base_url: DEFAULT_VIDEO_BASE_URL.to_string(),
                api_key: None,
                source_url: None,
                voice_id: DEFAULT_VIDEO_VOICE_ID.to_string(),
            },
            analytics: AnalyticsConfig {
                base_url: DEFAULT_ANALYTICS_BASE_URL.to_string(),
                api_key: None,
                project_id: DEFAULT_ANALYTICS_PROJECT_ID.to_string(),
                insights: InsightIds::default(),
            },
        }
    }
}

/// TOML 文件结构，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    server: ServerSection,
    chat: ChatSection,
    video: VideoSection,
    analytics: AnalyticsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerSection {
    host: Option<String>,
    port: Option<u16>,
    disable_tls_verify: Option<bool>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatSection {
    base_url: Option<String>,
    api_key: Option<String>,
    external_user_id: Option<String>,
    endpoint_id: Option<String>,
    agent_ids: Option<Vec<String>>,
    fulfillment_prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VideoSection {
    base_url: Option<String>,
    api_key: Option<String>,
    source_url: Option<String>,
    voice_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnalyticsSection {
    base_url: Option<String>,
    api_key: Option<String>,
    project_id: Option<String>,
    insights: Option<InsightIds>,
}

/// 判断是否为模板占位符，如 `<replace_api_key>`
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("<replace") && value.ends_with('>')
}

/// 过滤空值和占位符
pub fn credential(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !is_placeholder(v))
}

impl Config {
    /// 加载配置
    ///
    /// # 参数
    ///
    /// * `path` - 显式指定的配置文件；为 `None` 时按
    ///   `TRIBUS_CONFIG`、`./tribus.toml`、`<config_dir>/tribus/config.toml` 的顺序查找
    ///
    /// # 环境变量
    ///
    /// - `TRIBUS_HOST` / `TRIBUS_PORT` / `TRIBUS_DISABLE_TLS_VERIFY` / `TRIBUS_REQUEST_TIMEOUT_SECS`
    /// - `ON_DEMAND_API_KEY` / `ON_DEMAND_EXTERNAL_USER_ID` / `ON_DEMAND_BASE_URL`
    /// - `DID_API_KEY` / `DID_SOURCE_URL` / `DID_BASE_URL`
    /// - `POSTHOG_API_KEY` / `POSTHOG_PROJECT_ID` / `POSTHOG_BASE_URL`
    ///
    /// # 错误
    ///
    /// - 显式指定的配置文件不存在或无法解析
    /// - `TRIBUS_PORT` 不是有效的端口号
    /// - `TRIBUS_REQUEST_TIMEOUT_SECS` 不是正整数
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("TRIBUS_CONFIG").ok().map(PathBuf::from));

        let mut config = Self::default();

        match explicit {
            Some(path) => {
                let file = read_file(&path)?;
                config.apply_file(file);
            }
            None => {
                if let Some(path) = default_config_path() {
                    let file = read_file(&path)?;
                    config.apply_file(file);
                }
            }
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// 从 TOML 文本构建配置（不读取环境变量）
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(content).context("Invalid config file")?;
        let mut config = Self::default();
        config.apply_file(file);
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        let FileConfig {
            server,
            chat,
            video,
            analytics,
        } = file;

        set_text(&mut self.host, server.host);
        set(&mut self.port, server.port);
        set(&mut self.disable_tls_verify, server.disable_tls_verify);
        set(
            &mut self.request_timeout_secs,
            server.request_timeout_secs.filter(|secs| *secs > 0),
        );

        set_text(&mut self.chat.base_url, chat.base_url);
        set_credential(&mut self.chat.api_key, chat.api_key);
        set_credential(&mut self.chat.external_user_id, chat.external_user_id);
        set_text(&mut self.chat.endpoint_id, chat.endpoint_id);
        set(&mut self.chat.agent_ids, chat.agent_ids);
        set_text(&mut self.chat.fulfillment_prompt, chat.fulfillment_prompt);

        set_text(&mut self.video.base_url, video.base_url);
        set_credential(&mut self.video.api_key, video.api_key);
        set_credential(&mut self.video.source_url, video.source_url);
        set_text(&mut self.video.voice_id, video.voice_id);

        set_text(&mut self.analytics.base_url, analytics.base_url);
        set_credential(&mut self.analytics.api_key, analytics.api_key);
        set_text(&mut self.analytics.project_id, analytics.project_id);
        set(&mut self.analytics.insights, analytics.insights);
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        set_text(&mut self.host, var("TRIBUS_HOST"));

        if let Some(port) = non_empty(var("TRIBUS_PORT")) {
            self.port = port
                .parse()
                .context("TRIBUS_PORT must be a valid port number")?;
        }

        if let Some(flag) = non_empty(var("TRIBUS_DISABLE_TLS_VERIFY")) {
            self.disable_tls_verify = flag == "1" || flag.eq_ignore_ascii_case("true");
        }

        if let Some(secs) = non_empty(var("TRIBUS_REQUEST_TIMEOUT_SECS")) {
            self.request_timeout_secs = secs
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .context("TRIBUS_REQUEST_TIMEOUT_SECS must be a positive number of seconds")?;
        }

        set_text(&mut self.chat.base_url, var("ON_DEMAND_BASE_URL"));
        set_credential(&mut self.chat.api_key, var("ON_DEMAND_API_KEY"));
        set_credential(
            &mut self.chat.external_user_id,
            var("ON_DEMAND_EXTERNAL_USER_ID"),
        );

        set_text(&mut self.video.base_url, var("DID_BASE_URL"));
        set_credential(&mut self.video.api_key, var("DID_API_KEY"));
        set_credential(&mut self.video.source_url, var("DID_SOURCE_URL"));

        set_text(&mut self.analytics.base_url, var("POSTHOG_BASE_URL"));
        set_credential(&mut self.analytics.api_key, var("POSTHOG_API_KEY"));
        set_text(&mut self.analytics.project_id, var("POSTHOG_PROJECT_ID"));

        Ok(())
    }

    /// 列出缺失的必需凭据（按环境变量名）
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.chat.api_key.is_none() {
            missing.push("ON_DEMAND_API_KEY");
        }
        if self.chat.external_user_id.is_none() {
            missing.push("ON_DEMAND_EXTERNAL_USER_ID");
        }
        if self.video.api_key.is_none() {
            missing.push("DID_API_KEY");
        }
        if self.analytics.api_key.is_none() {
            missing.push("POSTHOG_API_KEY");
        }
        missing
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// 去掉首尾空白，空字符串视为未设置
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn set_text(slot: &mut String, value: Option<String>) {
    set(slot, non_empty(value));
}

fn set_credential(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = credential(value) {
        *slot = Some(value);
    }
}

fn read_file(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("tribus").join("config.toml"))
        .filter(|path| path.is_file())
}
