/// 上游模型服务错误
///
/// 网络错误、超时、非 2xx 响应都归到这里，由调用方决定如何处理，本身不重试。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AIError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl AIError {
    /// 上游返回的 HTTP 状态码（如果有）
    pub fn http_status(&self) -> Option<u16> {
        match self {
            AIError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AIError::Timeout(_))
    }
}
