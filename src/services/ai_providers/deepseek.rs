use async_trait::async_trait;
use crate::services::ai_error::AIError;
use crate::services::ai_providers::{AIProvider, ChatMessage, ModelConfig};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";

pub struct DeepSeekProvider {
    api_key: String,
    base_url: String,
    model_config: ModelConfig,
    timeout: Duration,
    client: reqwest::Client,
}

impl DeepSeekProvider {
    pub fn new(
        api_key: String,
        base_url: String,
        model_config: ModelConfig,
        timeout: Duration,
    ) -> Result<Self, AIError> {
        // 长连接复用：keepalive + 连接池
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .tcp_keepalive(Duration::from_secs(60))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| AIError::Network(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_config,
            timeout,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn map_transport_error(&self, e: reqwest::Error) -> AIError {
        if e.is_timeout() {
            AIError::Timeout(self.timeout.as_secs())
        } else {
            AIError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[async_trait]
impl AIProvider for DeepSeekProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AIError> {
        let request = ChatRequest {
            model: &self.model_config.model,
            messages,
            temperature: self.model_config.temperature,
            max_tokens: self.model_config.max_tokens,
            stream: false,
        };

        tracing::debug!(count = messages.len(), model = %self.model_config.model, "开始请求 DeepSeek API");
        let started = Instant::now();

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::warn!(timeout_secs = self.timeout.as_secs(), "DeepSeek API 请求超时");
                } else {
                    tracing::error!(error = %e, "DeepSeek API 请求失败");
                }
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %error_text, "DeepSeek API 返回错误状态");
            return Err(AIError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let result = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| AIError::InvalidResponse(e.to_string()))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| AIError::InvalidResponse("响应中没有 choices[0].message.content".to_string()))?;

        tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "DeepSeek API 请求成功");
        Ok(content)
    }
}
