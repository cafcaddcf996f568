//! 产品分析平台客户端

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::{send_json, UpstreamError};
use crate::config::{AnalyticsConfig, InsightIds};
use crate::daterange::DateParams;
use crate::utils::join_url;

const SERVICE: &str = "analytics";

const INSIGHT_TIMEOUT_SECS: u64 = 30;
const LOOKUP_TIMEOUT_SECS: u64 = 15;

/// 对外暴露的 insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Insight {
    Dau,
    Wau,
    Retention,
    GrowthAccounting,
}

impl Insight {
    pub const ALL: [Insight; 4] = [
        Insight::Dau,
        Insight::Wau,
        Insight::Retention,
        Insight::GrowthAccounting,
    ];

    /// 路由名称
    pub fn route(&self) -> &'static str {
        match self {
            Insight::Dau => "dau",
            Insight::Wau => "wau",
            Insight::Retention => "retention",
            Insight::GrowthAccounting => "growth-accounting",
        }
    }

    fn configured_id<'a>(&self, ids: &'a InsightIds) -> &'a str {
        match self {
            Insight::Dau => &ids.dau,
            Insight::Wau => &ids.wau,
            Insight::Retention => &ids.retention,
            Insight::GrowthAccounting => &ids.growth_accounting,
        }
    }
}

pub struct AnalyticsClient {
    http: Client,
    base_url: String,
    bearer: String,
    project_id: String,
    insights: InsightIds,
}

/// 全数字的是数字 ID，否则视为 short id
fn is_numeric_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

impl AnalyticsClient {
    /// 根据配置创建客户端，缺少 API key 时返回缺失项的名称
    pub fn from_config(http: Client, config: &AnalyticsConfig) -> Result<Self, &'static str> {
        let api_key = config.api_key.as_deref().ok_or("POSTHOG_API_KEY")?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            bearer: format!("Bearer {}", api_key),
            project_id: config.project_id.clone(),
            insights: config.insights.clone(),
        })
    }

    fn insights_url(&self) -> String {
        join_url(
            &self.base_url,
            &format!(
                "api/projects/{}/insights/",
                urlencoding::encode(&self.project_id)
            ),
        )
    }

    /// 获取 insight 数据，上游 JSON 原样返回
    ///
    /// # 参数
    ///
    /// * `insight_id` - 数字 ID
    /// * `date_params` - 日期范围，为 `None` 时使用 insight 自身的默认范围
    pub async fn fetch_insight(
        &self,
        insight_id: &str,
        date_params: Option<&DateParams>,
    ) -> Result<Value, UpstreamError> {
        let url = format!("{}{}/", self.insights_url(), urlencoding::encode(insight_id));

        let mut query = vec![("refresh", "true")];
        if let Some(params) = date_params {
            query.push(("date_from", params.date_from.as_str()));
            query.push(("date_to", params.date_to.as_str()));
        }

        tracing::info!(%url, insight_id, ?query, "fetching insight");

        send_json(
            SERVICE,
            self.http
                .get(&url)
                .header(reqwest::header::AUTHORIZATION, &self.bearer)
                .query(&query)
                .timeout(Duration::from_secs(INSIGHT_TIMEOUT_SECS)),
        )
        .await
    }

    /// 通过 short id 查询数字 ID
    ///
    /// 没有匹配结果时返回 `Ok(None)`
    pub async fn find_insight_id(&self, short_id: &str) -> Result<Option<String>, UpstreamError> {
        let url = self.insights_url();

        tracing::info!(short_id, "resolving insight short id");

        let response = send_json(
            SERVICE,
            self.http
                .get(&url)
                .header(reqwest::header::AUTHORIZATION, &self.bearer)
                .query(&[("short_id", short_id)])
                .timeout(Duration::from_secs(LOOKUP_TIMEOUT_SECS)),
        )
        .await?;

        let id = response
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
            .and_then(|first| first.get("id"))
            .and_then(|id| match id {
                Value::Number(n) => Some(n.to_string()),
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                _ => None,
            });

        match &id {
            Some(id) => tracing::info!(short_id, id = %id, "insight resolved"),
            None => tracing::warn!(short_id, "no insight found for short id"),
        }
        Ok(id)
    }

    /// 获取指定 insight 的数据
    ///
    /// 配置的是 short id 时先解析出数字 ID（共两次上游调用）
    pub async fn insight_data(
        &self,
        insight: Insight,
        date_params: Option<&DateParams>,
    ) -> Result<Value, UpstreamError> {
        let configured = insight.configured_id(&self.insights);

        if is_numeric_id(configured) {
            return self.fetch_insight(configured, date_params).await;
        }

        let numeric = self
            .find_insight_id(configured)
            .await?
            .ok_or(UpstreamError::MissingField {
                service: SERVICE,
                field: "results[0].id",
            })?;

        self.fetch_insight(&numeric, date_params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_are_detected() {
        assert!(is_numeric_id("2370862"));
        assert!(!is_numeric_id("AbC123"));
        assert!(!is_numeric_id(""));
    }

    #[test]
    fn every_insight_has_a_distinct_route() {
        let ids = InsightIds::default();
        let routes: Vec<_> = Insight::ALL.iter().map(Insight::route).collect();
        assert_eq!(routes, vec!["dau", "wau", "retention", "growth-accounting"]);
        assert_eq!(Insight::GrowthAccounting.configured_id(&ids), "2370865");
    }
}
