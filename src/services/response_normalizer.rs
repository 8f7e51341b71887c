//! 模型响应规范化
//!
//! 模型输出是自由文本，JSON 可能被包在 ```json 代码块里，也可能混入中文标点。
//! 这里统一做「提取 -> 修复 -> 解析」，再按调用方期望的结构校验。

use crate::models::{OptimizedPromptResult, TreeNode, VocabularyTree};
use crate::services::language::Language;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```json\s*([\s\S]*?)\s*```").expect("JSON 代码块正则无效"));

static ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:.*?)\n([\s\S]*?)```").expect("代码块正则无效"));

/// 没有 tree 字段时，识别为「树本身」的顶层类别名
const TREE_CATEGORY_KEYS: &[&str] = &[
    "Actions", "Objects", "Qualities", "verbs", "nouns", "adjectives", "动作", "对象", "特质",
];

const MAIN_SENTENCE_KEYS: (&str, &str) = ("mainSentence", "主体句");
const ENDING_SENTENCE_KEYS: (&str, &str) = ("endingSentence", "结尾句");

pub const DEFAULT_ENDING_EN: &str = "Please provide detailed guidance and suggestions.";
pub const DEFAULT_ENDING_ZH: &str = "请提供详细的指导和建议。";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    #[error("无法从响应中提取JSON")]
    NoJsonFound,
    #[error("无法解析API返回的内容为JSON格式: {message}")]
    Malformed { message: String, text: String },
    #[error("API返回的JSON结构不符合预期: {0}")]
    UnexpectedShape(String),
}

pub fn default_ending(language: Language) -> &'static str {
    language.pick(DEFAULT_ENDING_EN, DEFAULT_ENDING_ZH)
}

/// 从模型输出中提取第一个 `{` 到最后一个 `}` 之间的 JSON 对象
pub fn extract_json_object(raw: &str) -> Result<Map<String, Value>, NormalizeError> {
    let source = JSON_FENCE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(raw);

    let start = source.find('{').ok_or(NormalizeError::NoJsonFound)?;
    let end = source.rfind('}').ok_or(NormalizeError::NoJsonFound)?;
    if end < start {
        return Err(NormalizeError::NoJsonFound);
    }

    let cleaned = repair_punctuation(&source[start..=end]);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|e| NormalizeError::Malformed {
            message: e.to_string(),
            text: cleaned.clone(),
        })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(NormalizeError::UnexpectedShape(format!(
            "顶层不是对象: {}",
            other
        ))),
    }
}

/// 弯引号统一替换为直双引号，全角逗号、冒号替换为半角
fn repair_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{2018}' | '\u{2019}' => '"',
            '，' => ',',
            '：' => ':',
            other => other,
        })
        .collect()
}

/// 提取词汇树
pub fn extract_tree(raw: &str) -> Result<VocabularyTree, NormalizeError> {
    let mut object = extract_json_object(raw)?;

    if let Some(tree) = object.remove("tree") {
        return match tree {
            Value::Object(map) => tree_from_object(&map),
            other => Err(NormalizeError::UnexpectedShape(format!(
                "tree 字段不是对象: {}",
                other
            ))),
        };
    }

    if TREE_CATEGORY_KEYS.iter().any(|key| object.contains_key(*key)) {
        return tree_from_object(&object);
    }

    Err(NormalizeError::UnexpectedShape(format!(
        "缺少 tree 字段，顶层字段为: {:?}",
        object.keys().collect::<Vec<_>>()
    )))
}

fn tree_from_object(map: &Map<String, Value>) -> Result<VocabularyTree, NormalizeError> {
    let mut tree = VocabularyTree::new();
    for (name, value) in map {
        let node = match value {
            Value::Object(inner) => TreeNode::Branch(tree_from_object(inner)?),
            Value::Array(items) => TreeNode::Words(items.iter().filter_map(leaf_word).collect()),
            other => {
                return Err(NormalizeError::UnexpectedShape(format!(
                    "类别 {} 的值既不是对象也不是数组: {}",
                    name, other
                )))
            }
        };
        tree.insert(name.as_str(), node);
    }

    if tree.is_empty() {
        return Err(NormalizeError::UnexpectedShape("词汇树为空".to_string()));
    }
    Ok(tree)
}

// 叶子必须是非空字符串；数字和布尔值转成字符串，其余丢弃
fn leaf_word(item: &Value) -> Option<String> {
    let word = match item {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!word.is_empty()).then_some(word)
}

/// 提取「主体句 + 结尾句」，缺少结尾句时使用本地化默认值
pub fn extract_optimized_prompt(
    raw: &str,
    language: Language,
) -> Result<OptimizedPromptResult, NormalizeError> {
    let object = extract_json_object(raw)?;

    let main_sentence = localized_field(&object, MAIN_SENTENCE_KEYS, language).ok_or_else(|| {
        NormalizeError::UnexpectedShape(format!(
            "缺少主体句字段，顶层字段为: {:?}",
            object.keys().collect::<Vec<_>>()
        ))
    })?;
    let ending_sentence = localized_field(&object, ENDING_SENTENCE_KEYS, language)
        .unwrap_or_else(|| default_ending(language).to_string());

    Ok(OptimizedPromptResult {
        main_sentence,
        ending_sentence,
    })
}

// 先查当前语言的字段名，再查另一种
fn localized_field(
    object: &Map<String, Value>,
    (english, chinese): (&str, &str),
    language: Language,
) -> Option<String> {
    let order = match language {
        Language::English => [english, chinese],
        Language::Chinese => [chinese, english],
    };
    order
        .iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// 简单模式下清理模型返回的句子：去掉包裹的引号和代码块标记
pub fn clean_sentence(raw: &str) -> String {
    let mut sentence = raw.trim();

    for (open, close) in [('"', '"'), ('\u{201C}', '\u{201D}')] {
        if sentence.len() >= open.len_utf8() + close.len_utf8()
            && sentence.starts_with(open)
            && sentence.ends_with(close)
        {
            sentence = &sentence[open.len_utf8()..sentence.len() - close.len_utf8()];
            break;
        }
    }

    if sentence.contains("```") {
        if let Some(inner) = ANY_FENCE.captures(sentence).and_then(|caps| caps.get(1)) {
            return inner.as_str().trim().to_string();
        }
    }

    sentence.to_string()
}
