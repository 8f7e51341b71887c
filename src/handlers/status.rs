use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    status: &'static str,
    message: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
struct ProbeResponse {
    success: bool,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// 存活检查
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "online",
        message: "Server is running",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// 直接调用模型，检查上游连通性（仅用于诊断）
pub async fn test_api(State(state): State<AppState>) -> Response {
    match state.ai.probe().await {
        Ok(content) => Json(ProbeResponse {
            success: true,
            message: "DeepSeek API连接成功",
            response: Some(content),
            error: None,
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "DeepSeek API连接失败");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ProbeResponse {
                    success: false,
                    message: "DeepSeek API连接失败",
                    response: None,
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}
