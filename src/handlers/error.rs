use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::models::Usage;
use crate::services::language::Language;

/// 面向用户的错误，文案按输入语言本地化
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    InvalidInput {
        language: Language,
        message: String,
    },
    RateLimitExceeded {
        language: Language,
        usage: Usage,
    },
    Internal {
        language: Language,
        message: String,
        usage: Option<Usage>,
    },
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<Usage>,
}

impl ApiError {
    pub fn invalid_input(language: Language, english: &str, chinese: &str) -> Self {
        ApiError::InvalidInput {
            language,
            message: language.pick(english, chinese).to_string(),
        }
    }

    pub fn rate_limited(language: Language, limit: u32) -> Self {
        ApiError::RateLimitExceeded {
            language,
            usage: Usage { remaining: 0, limit },
        }
    }

    pub fn internal(language: Language, message: impl Into<String>, usage: Option<Usage>) -> Self {
        ApiError::Internal {
            language,
            message: message.into(),
            usage,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::InvalidInput { language, message } => ErrorBody {
                error: language.pick("Invalid input", "无效的输入"),
                message,
                usage: None,
            },
            ApiError::RateLimitExceeded { language, usage } => ErrorBody {
                error: language.pick("Daily limit reached", "已达到今日使用限制"),
                message: match language {
                    Language::English => format!(
                        "Please try again tomorrow. Daily limit is {} requests.",
                        usage.limit
                    ),
                    Language::Chinese => format!("请明天再来尝试，每日限制{}次请求。", usage.limit),
                },
                usage: Some(usage),
            },
            ApiError::Internal {
                language,
                message,
                usage,
            } => ErrorBody {
                error: language.pick("Internal server error", "服务器内部错误"),
                message,
                usage,
            },
        };
        (status, Json(body)).into_response()
    }
}
