use crate::services::ai_providers::deepseek::DEFAULT_BASE_URL;
use crate::services::rate_limiter::MAX_DAILY_REQUESTS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("读取配置文件失败 {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("解析配置文件失败 {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("环境变量 {name} 无效: {value}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,               // 默认 3002
    #[serde(skip_serializing)]
    pub api_key: Option<String>, // 只从环境变量或配置文件读取，不回写
    pub base_url: String,
    pub model: String,
    pub request_timeout: u64,    // 秒，默认 30
    pub daily_limit: u32,        // 默认 100
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3002,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "deepseek-chat".to_string(),
            request_timeout: 30,
            daily_limit: MAX_DAILY_REQUESTS,
        }
    }
}

impl AppConfig {
    /// 默认值 -> .env -> 配置文件（可选）-> 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        // 先尝试上级目录的 .env，再尝试当前目录；已存在的环境变量不会被覆盖
        if let Ok(cwd) = std::env::current_dir() {
            if let Some(parent) = cwd.parent() {
                let _ = dotenv::from_path(parent.join(".env"));
            }
        }
        let _ = dotenv::dotenv();

        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("prompt-tree").join("config.json"))
    }

    /// 用环境变量覆盖配置，`lookup` 便于测试时注入
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup("DEEPSEEK_API_KEY") {
            self.api_key = Some(key.trim().to_string());
        }
        if let Some(port) = lookup("PORT") {
            self.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: "PORT",
                value: port.clone(),
            })?;
        }
        if let Some(url) = lookup("DEEPSEEK_BASE_URL") {
            self.base_url = url.trim().to_string();
        }
        if let Some(model) = lookup("DEEPSEEK_MODEL") {
            self.model = model.trim().to_string();
        }
        if let Some(limit) = lookup("DAILY_LIMIT") {
            self.daily_limit = limit.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: "DAILY_LIMIT",
                value: limit.clone(),
            })?;
        }
        Ok(())
    }

    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// API 密钥的脱敏形式，只用于日志
    pub fn masked_api_key(&self) -> String {
        match &self.api_key {
            Some(key) => format!("{}...", key.chars().take(5).collect::<String>()),
            None => "未设置".to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("端口不能为 0".to_string()));
        }

        if self.request_timeout < 5 || self.request_timeout > 300 {
            return Err(ConfigError::Invalid("请求超时时间必须在 5-300 秒之间".to_string()));
        }

        if self.daily_limit == 0 {
            return Err(ConfigError::Invalid("每日请求上限必须大于 0".to_string()));
        }

        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("API 地址不能为空".to_string()));
        }

        Ok(())
    }
}
