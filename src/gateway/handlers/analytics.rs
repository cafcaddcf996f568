//! 分析数据处理器

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Local;
use serde_json::{json, Value};

use crate::daterange::{self, DEFAULT_TIME_RANGE};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::state::AppState;
use crate::upstream::Insight;

/// 原始查询参数，保留重复的键
pub type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

/// 时间范围查询参数
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RangeQuery {
    pub time_range: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl RangeQuery {
    /// 同一参数出现多次时取第一个值，未知参数忽略
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "time_range" => &mut query.time_range,
                "start_date" => &mut query.start_date,
                "end_date" => &mut query.end_date,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

/// GET /dau | /wau | /retention | /growth-accounting
///
/// 路由在 [`build_router`](crate::gateway::build_router) 中按 [`Insight::ALL`] 逐个注册
pub async fn handle_insight(
    insight: Insight,
    state: AppState,
    query: QueryPairs,
) -> GatewayResult<Json<Value>> {
    let analytics = state.analytics()?;

    let Query(pairs) = query.map_err(|rejection| {
        GatewayError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    })?;
    let query = RangeQuery::from_pairs(pairs);

    let time_range = query.time_range.as_deref().unwrap_or(DEFAULT_TIME_RANGE);
    let date_params = daterange::resolve(
        time_range,
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        Local::now().date_naive(),
    )
    .map_err(|e| GatewayError::BadRequest(e.to_string()))?;

    if date_params.is_none() {
        tracing::info!(
            time_range,
            "unrecognized time_range, using the insight's default range"
        );
    }

    tracing::info!(insight = insight.route(), time_range, "insight requested");

    let data = analytics.insight_data(insight, date_params.as_ref()).await?;
    Ok(Json(data))
}

/// GET /analytics/health
pub async fn handle_analytics_health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let [.., (_, analytics_missing)] = state.missing_settings();

    match analytics_missing {
        Some(setting) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "module": "analytics",
                "reason": format!("{} not set", setting),
            })),
        ),
        None => (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "module": "analytics" })),
        ),
    }
}
