//! 数字人视频处理器

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use super::{json_body, optional_str, required_str};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::state::AppState;
use crate::upstream::Talk;

/// POST /video
///
/// 请求体：`{text, source_url?, voice_id?}`，返回 202 和任务 ID
pub async fn handle_create_video(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> GatewayResult<(StatusCode, Json<Talk>)> {
    let video = state.video()?;

    let body = json_body(payload)?;
    let text = required_str(&body, "text").ok_or_else(|| {
        GatewayError::BadRequest(
            "Missing 'text' in request body, or text is empty/invalid.".to_string(),
        )
    })?;

    let source_url = optional_str(&body, "source_url")
        .or_else(|| video.default_source_url())
        .ok_or_else(|| {
            GatewayError::BadRequest(
                "Missing 'source_url' and no default avatar image is configured.".to_string(),
            )
        })?;

    let talk = video
        .create_talk(text.trim(), source_url, optional_str(&body, "voice_id"))
        .await
        .map_err(|e| {
            GatewayError::bad_gateway(
                "Video: Failed to create the talk. Please try again later.",
                &e,
            )
        })?;

    Ok((StatusCode::ACCEPTED, Json(talk)))
}

/// GET /video/{id}
pub async fn handle_get_video(
    State(state): State<AppState>,
    Path(talk_id): Path<String>,
) -> GatewayResult<Json<Talk>> {
    let video = state.video()?;

    let talk = video.get_talk(&talk_id).await.map_err(|e| {
        GatewayError::bad_gateway(
            "Video: Failed to fetch the talk status. Please try again later.",
            &e,
        )
    })?;

    Ok(Json(talk))
}
