use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use super::client::ClientId;
use super::error::ApiError;
use super::AppState;
use crate::models::{Usage, VocabularyTree};
use crate::services::language::{self, Language};
use crate::services::rate_limiter::Admission;

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub tree: VocabularyTree,
    pub usage: Usage,
}

/// POST /generate
///
/// 超出每日额度时在调用模型前直接返回 429；只有成功产出词汇树（包括默认树）才消耗额度。
pub async fn generate(
    State(state): State<AppState>,
    ClientId(client_id): ClientId,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let body = payload.map(|Json(value)| value).unwrap_or(Value::Null);
    let input = body.get("input");

    let Some(user_input) = input.and_then(Value::as_str).filter(|s| !s.trim().is_empty()) else {
        return Err(ApiError::invalid_input(
            language::detect_value(input),
            "Please provide a non-empty text input",
            "请提供非空的文本输入",
        ));
    };

    let language: Language = language::detect(user_input);
    tracing::info!(%client_id, %language, "收到 /generate 请求");

    let outcome = state
        .limiter
        .check_and_consume(&client_id, || state.ai.generate_word_tree(user_input, language))
        .await;

    match outcome {
        Admission::Completed { value, usage } => {
            tracing::info!(
                %client_id,
                categories = value.len(),
                remaining = usage.remaining,
                "词汇树生成完成"
            );
            Ok(Json(GenerateResponse { tree: value, usage }))
        }
        Admission::Rejected { usage } => {
            tracing::warn!(%client_id, limit = usage.limit, "用户达到请求限制");
            Err(ApiError::rate_limited(language, usage.limit))
        }
        Admission::Failed { error, usage } => {
            tracing::error!(
                %client_id,
                error = %error,
                upstream_status = ?error.http_status(),
                "处理 /generate 请求时出错"
            );
            Err(ApiError::internal(language, error.to_string(), Some(usage)))
        }
    }
}
