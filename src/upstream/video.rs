//! 数字人视频生成客户端

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{send_json, UpstreamError};
use crate::config::VideoConfig;
use crate::extract::{first_match, lookup_str};
use crate::utils::join_url;

const SERVICE: &str = "video";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// 结果视频地址的候选路径
const RESULT_URL_PATHS: &[&str] = &["result_url", "result.url"];

/// 视频任务状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Talk {
    pub id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
}

impl Talk {
    fn from_response(response: &Value) -> Result<Self, UpstreamError> {
        let id = lookup_str(response, "id").ok_or(UpstreamError::MissingField {
            service: SERVICE,
            field: "id",
        })?;

        Ok(Self {
            id: id.to_string(),
            status: lookup_str(response, "status")
                .unwrap_or("unknown")
                .to_string(),
            result_url: first_match(response, RESULT_URL_PATHS).map(|(_, url)| url.to_string()),
        })
    }
}

pub struct VideoClient {
    http: Client,
    base_url: String,
    authorization: String,
    default_source_url: Option<String>,
    voice_id: String,
}

/// 生成 Basic 认证头
///
/// `user:password` 形式的 key 需要先做 base64 编码，已编码的 key 原样使用
fn basic_authorization(api_key: &str) -> String {
    if api_key.contains(':') {
        format!("Basic {}", STANDARD.encode(api_key))
    } else {
        format!("Basic {}", api_key)
    }
}

impl VideoClient {
    /// 根据配置创建客户端，缺少 API key 时返回缺失项的名称
    pub fn from_config(http: Client, config: &VideoConfig) -> Result<Self, &'static str> {
        let api_key = config.api_key.as_deref().ok_or("DID_API_KEY")?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            authorization: basic_authorization(api_key),
            default_source_url: config.source_url.clone(),
            voice_id: config.voice_id.clone(),
        })
    }

    pub fn default_source_url(&self) -> Option<&str> {
        self.default_source_url.as_deref()
    }

    /// 创建视频任务
    ///
    /// # 参数
    ///
    /// * `text` - 数字人朗读的文本
    /// * `source_url` - 头像图片地址
    /// * `voice_id` - 语音 ID，为 `None` 时使用配置中的默认值
    pub async fn create_talk(
        &self,
        text: &str,
        source_url: &str,
        voice_id: Option<&str>,
    ) -> Result<Talk, UpstreamError> {
        let url = join_url(&self.base_url, "talks");
        let body = json!({
            "source_url": source_url,
            "script": {
                "type": "text",
                "input": text,
                "provider": {
                    "type": "microsoft",
                    "voice_id": voice_id.unwrap_or(self.voice_id.as_str()),
                },
            },
        });

        tracing::info!(%url, "creating talk");

        let response = send_json(
            SERVICE,
            self.http
                .post(&url)
                .header(reqwest::header::AUTHORIZATION, &self.authorization)
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .json(&body),
        )
        .await?;

        let talk = Talk::from_response(&response)?;
        tracing::info!(talk_id = %talk.id, status = %talk.status, "talk created");
        Ok(talk)
    }

    /// 查询视频任务状态
    pub async fn get_talk(&self, talk_id: &str) -> Result<Talk, UpstreamError> {
        let url = join_url(
            &self.base_url,
            &format!("talks/{}", urlencoding::encode(talk_id)),
        );

        let response = send_json(
            SERVICE,
            self.http
                .get(&url)
                .header(reqwest::header::AUTHORIZATION, &self.authorization)
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS)),
        )
        .await?;

        Talk::from_response(&response)
    }
}
