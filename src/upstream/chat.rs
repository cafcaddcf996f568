//! 对话 Agent 平台客户端
//!
//! 每次提问先创建会话，再向会话提交同步查询。

use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::{send_json, UpstreamError};
use crate::config::ChatConfig;
use crate::utils::{join_url, preview, LOG_PREVIEW_CHARS};

const SERVICE: &str = "chat";

const SESSION_TIMEOUT_SECS: u64 = 15;
const QUERY_TIMEOUT_SECS: u64 = 30;

/// 会话 ID 所在路径
const SESSION_ID_PATH: &str = "data.id";

/// 读取 `data.id`，字符串和数字都接受
fn session_id(response: &Value) -> Option<String> {
    match response.get("data")?.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub struct ChatClient {
    http: Client,
    base_url: String,
    api_key: String,
    external_user_id: String,
    endpoint_id: String,
    agent_ids: Vec<String>,
    fulfillment_prompt: String,
}

impl ChatClient {
    /// 根据配置创建客户端
    ///
    /// 缺少 API key 或 external user id 时返回缺失项的名称
    pub fn from_config(http: Client, config: &ChatConfig) -> Result<Self, &'static str> {
        let api_key = config.api_key.clone().ok_or("ON_DEMAND_API_KEY")?;
        let external_user_id = config
            .external_user_id
            .clone()
            .ok_or("ON_DEMAND_EXTERNAL_USER_ID")?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key,
            external_user_id,
            endpoint_id: config.endpoint_id.clone(),
            agent_ids: config.agent_ids.clone(),
            fulfillment_prompt: config.fulfillment_prompt.clone(),
        })
    }

    /// 创建新会话，返回会话 ID
    pub async fn create_session(&self) -> Result<String, UpstreamError> {
        let url = join_url(&self.base_url, "sessions");
        let body = json!({
            "agentIds": [],
            "externalUserId": self.external_user_id,
        });

        tracing::info!(%url, "creating chat session");

        let response = send_json(
            SERVICE,
            self.http
                .post(&url)
                .header("apikey", &self.api_key)
                .timeout(Duration::from_secs(SESSION_TIMEOUT_SECS))
                .json(&body),
        )
        .await?;

        let session_id = session_id(&response).ok_or_else(|| {
            tracing::error!(
                response = preview(&response.to_string(), LOG_PREVIEW_CHARS),
                "session id not found in response"
            );
            UpstreamError::MissingField {
                service: SERVICE,
                field: SESSION_ID_PATH,
            }
        })?;

        tracing::info!(%session_id, "chat session created");
        Ok(session_id)
    }

    /// 向会话提交同步查询，返回上游原始 JSON
    pub async fn submit_query(
        &self,
        session_id: &str,
        query: &str,
    ) -> Result<Value, UpstreamError> {
        let url = join_url(
            &self.base_url,
            &format!("sessions/{}/query", urlencoding::encode(session_id)),
        );

        tracing::info!(session_id, "submitting query");

        let response = send_json(
            SERVICE,
            self.http
                .post(&url)
                .header("apikey", &self.api_key)
                .timeout(Duration::from_secs(QUERY_TIMEOUT_SECS))
                .json(&self.query_body(query)),
        )
        .await?;

        tracing::debug!(
            session_id,
            response = preview(&response.to_string(), LOG_PREVIEW_CHARS),
            "query response"
        );
        Ok(response)
    }

    fn query_body(&self, query: &str) -> Value {
        json!({
            "endpointId": self.endpoint_id,
            "query": query,
            "agentIds": self.agent_ids,
            "responseMode": "sync",
            "reasoningMode": "low",
            "modelConfigs": {
                "fulfillmentPrompt": self.fulfillment_prompt,
                "stopSequences": [],
                "temperature": 0.7,
                "topP": 1,
                "maxTokens": 4000,
                "presencePenalty": 0,
                "frequencyPenalty": 0
            },
        })
    }
}
