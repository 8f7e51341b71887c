use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// 词汇树：类别名 -> 子树或词汇列表
///
/// 保持插入顺序，同一节点下的类别名唯一。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VocabularyTree {
    entries: Vec<(String, TreeNode)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Branch(VocabularyTree),
    Words(Vec<String>),
}

impl VocabularyTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入类别，同名类别会被替换（保留原位置）
    pub fn insert(&mut self, name: impl Into<String>, node: TreeNode) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = node;
        } else {
            self.entries.push((name, node));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TreeNode)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// 叶子词汇总数
    pub fn word_count(&self) -> usize {
        self.iter()
            .map(|(_, node)| match node {
                TreeNode::Branch(tree) => tree.word_count(),
                TreeNode::Words(words) => words.len(),
            })
            .sum()
    }
}

impl Serialize for VocabularyTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, node) in &self.entries {
            map.serialize_entry(key, node)?;
        }
        map.end()
    }
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TreeNode::Branch(tree) => tree.serialize(serializer),
            TreeNode::Words(words) => words.serialize(serializer),
        }
    }
}

/// 优化后的提示词：主体句 + 结尾请求句
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedPromptResult {
    pub main_sentence: String,
    pub ending_sentence: String,
}

/// 用户选中的词汇，前端可能传字符串也可能传数组
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedWords {
    Text(String),
    List(Vec<String>),
}

impl SelectedWords {
    /// 从请求字段解析；非字符串 / 非字符串数组返回 None
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(text) => Some(SelectedWords::Text(text.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(SelectedWords::List),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SelectedWords::Text(text) => text.trim().is_empty(),
            SelectedWords::List(words) => words.iter().all(|w| w.trim().is_empty()),
        }
    }

    /// 数组按逗号拼接
    pub fn render(&self) -> String {
        match self {
            SelectedWords::Text(text) => text.trim().to_string(),
            SelectedWords::List(words) => words
                .iter()
                .map(|w| w.trim())
                .filter(|w| !w.is_empty())
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// 每日额度使用情况
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub remaining: u32,
    pub limit: u32,
}
