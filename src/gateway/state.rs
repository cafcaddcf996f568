//! Gateway 应用状态

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::GatewayError;
use crate::upstream::{AnalyticsClient, ChatClient, VideoClient};
use crate::utils::build_http_client;

/// 上游客户端，未配置时记录缺失的配置项
enum Upstream<T> {
    Ready(Arc<T>),
    Missing(&'static str),
}

impl<T> Clone for Upstream<T> {
    fn clone(&self) -> Self {
        match self {
            Upstream::Ready(client) => Upstream::Ready(Arc::clone(client)),
            Upstream::Missing(setting) => Upstream::Missing(*setting),
        }
    }
}

impl<T> Upstream<T> {
    fn new(built: Result<T, &'static str>) -> Self {
        match built {
            Ok(client) => Upstream::Ready(Arc::new(client)),
            Err(setting) => Upstream::Missing(setting),
        }
    }

    fn get(&self, service: &'static str) -> Result<&T, GatewayError> {
        match self {
            Upstream::Ready(client) => Ok(client.as_ref()),
            Upstream::Missing(setting) => {
                let setting = *setting;
                tracing::error!(service, setting, "upstream credential is not configured");
                Err(GatewayError::Misconfigured { service, setting })
            }
        }
    }

    fn missing(&self) -> Option<&'static str> {
        match self {
            Upstream::Ready(_) => None,
            Upstream::Missing(setting) => Some(*setting),
        }
    }
}

/// Gateway 应用状态
///
/// 在启动时由配置一次性构建，之后只读
#[derive(Clone)]
pub struct AppState {
    chat: Upstream<ChatClient>,
    video: Upstream<VideoClient>,
    analytics: Upstream<AnalyticsClient>,
    request_timeout: Duration,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = build_http_client(config.disable_tls_verify)?;

        let state = Self {
            chat: Upstream::new(ChatClient::from_config(http.clone(), &config.chat)),
            video: Upstream::new(VideoClient::from_config(http.clone(), &config.video)),
            analytics: Upstream::new(AnalyticsClient::from_config(http, &config.analytics)),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        };

        for (service, missing) in state.missing_settings() {
            if let Some(setting) = missing {
                tracing::warn!(service, setting, "upstream disabled until configured");
            }
        }

        Ok(state)
    }

    pub fn chat(&self) -> Result<&ChatClient, GatewayError> {
        self.chat.get("Chat Agent")
    }

    pub fn video(&self) -> Result<&VideoClient, GatewayError> {
        self.video.get("Video")
    }

    pub fn analytics(&self) -> Result<&AnalyticsClient, GatewayError> {
        self.analytics.get("Analytics")
    }

    /// 单个请求的总超时
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// 各上游缺失的配置项（`None` 表示已配置）
    pub fn missing_settings(&self) -> [(&'static str, Option<&'static str>); 3] {
        [
            ("chat", self.chat.missing()),
            ("video", self.video.missing()),
            ("analytics", self.analytics.missing()),
        ]
    }
}
