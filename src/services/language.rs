//! 输入语言检测
//!
//! 基于字符集的粗略判断，不是真正的语言识别：
//! 只要出现允许集合之外的字符（例如任何中日韩字符），就按中文处理。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static ENGLISH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[a-zA-Z0-9\s.,!?;:'"-]+$"#).expect("英文字符集正则无效")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Chinese,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Chinese => "chinese",
        }
    }

    /// 按语言二选一，用于本地化文案
    pub fn pick<'a>(&self, english: &'a str, chinese: &'a str) -> &'a str {
        match self {
            Language::English => english,
            Language::Chinese => chinese,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 检测文本语言，空输入默认为英文
pub fn detect(text: &str) -> Language {
    let trimmed = text.trim();
    if trimmed.is_empty() || ENGLISH_PATTERN.is_match(trimmed) {
        Language::English
    } else {
        Language::Chinese
    }
}

/// 请求体里的字段可能缺失或不是字符串，这两种情况都按英文处理
pub fn detect_value(value: Option<&serde_json::Value>) -> Language {
    match value.and_then(|v| v.as_str()) {
        Some(text) => detect(text),
        None => Language::English,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_ascii_is_english() {
        assert_eq!(detect("I want to build a website"), Language::English);
        assert_eq!(detect("  Hello, world! Is it 42? 'yes'; \"no\": maybe-so.  "), Language::English);
    }

    #[test]
    fn test_cjk_is_chinese() {
        assert_eq!(detect("我想做一顿饭"), Language::Chinese);
        assert_eq!(detect("build 网站"), Language::Chinese);
    }

    #[test]
    fn test_unlisted_ascii_punctuation_is_chinese() {
        // 允许集合之外的符号也会被判定为中文
        assert_eq!(detect("cost: $5"), Language::Chinese);
        assert_eq!(detect("a (b)"), Language::Chinese);
        assert_eq!(detect("café"), Language::Chinese);
    }

    #[test]
    fn test_empty_input_defaults_to_english() {
        assert_eq!(detect(""), Language::English);
        assert_eq!(detect("   \n\t"), Language::English);
    }

    #[test]
    fn test_detect_value_non_string() {
        assert_eq!(detect_value(None), Language::English);
        assert_eq!(detect_value(Some(&json!(42))), Language::English);
        assert_eq!(detect_value(Some(&json!(null))), Language::English);
        assert_eq!(detect_value(Some(&json!("炒菜"))), Language::Chinese);
    }

    #[test]
    fn test_serialized_lowercase() {
        assert_eq!(serde_json::to_string(&Language::Chinese).unwrap(), "\"chinese\"");
        assert_eq!(Language::English.to_string(), "english");
    }
}
