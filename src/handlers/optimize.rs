use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use super::error::ApiError;
use super::AppState;
use crate::models::SelectedWords;
use crate::services::ai_service::OptimizedPrompt;
use crate::services::language::{self, Language};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    pub success: bool,
    pub optimized_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ending_sentence: Option<String>,
}

/// POST /optimize-prompt
///
/// 不经过每日限额检查。
pub async fn optimize_prompt(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<OptimizeResponse>, ApiError> {
    let body = payload.map(|Json(value)| value).unwrap_or(Value::Null);
    let original_field = body.get("originalInput");

    // 只接受字符串；数字等非字符串值同样视为无效输入
    let original_input = original_field
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty());
    let selected_words = body
        .get("selectedWords")
        .and_then(SelectedWords::from_value)
        .filter(|words| !words.is_empty());

    let (Some(original_input), Some(selected_words)) = (original_input, selected_words) else {
        // 没有原始输入时无从判断语言，默认中文；非字符串的真值按英文
        let language = match original_field {
            Some(value) if is_truthy(value) => language::detect_value(Some(value)),
            _ => Language::Chinese,
        };
        return Err(ApiError::invalid_input(
            language,
            "Please provide original input and selected vocabulary",
            "请提供原始输入和选择的词汇",
        ));
    };

    let include_ending = body
        .get("includeEndingSentence")
        .map(is_truthy)
        .unwrap_or(false);
    let language = language::detect(original_input);
    tracing::info!(%language, include_ending, "收到 /optimize-prompt 请求");

    let result = state
        .ai
        .optimize_prompt(original_input, &selected_words, language, include_ending)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "处理提示词优化请求时出错");
            ApiError::internal(language, e.to_string(), None)
        })?;

    let response = match result {
        OptimizedPrompt::Sentence(sentence) => OptimizeResponse {
            success: true,
            optimized_prompt: sentence,
            ending_sentence: None,
        },
        OptimizedPrompt::WithEnding(result) => OptimizeResponse {
            success: true,
            optimized_prompt: result.main_sentence,
            ending_sentence: Some(result.ending_sentence),
        },
    };
    Ok(Json(response))
}

// 与前端约定的宽松布尔语义：true、非零数字、非空字符串
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
