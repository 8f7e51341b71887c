use std::sync::Arc;
use crate::models::{OptimizedPromptResult, SelectedWords, TreeNode, VocabularyTree};
use crate::services::ai_error::AIError;
use crate::services::ai_providers::AIProvider;
use crate::services::language::Language;
use crate::services::prompt_builder;
use crate::services::response_normalizer::{self, NormalizeError};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptimizeError {
    #[error(transparent)]
    Upstream(#[from] AIError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// 句子优化结果：简单模式只有一句，结尾模式带结尾请求句
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimizedPrompt {
    Sentence(String),
    WithEnding(OptimizedPromptResult),
}

pub struct AIService {
    provider: Arc<dyn AIProvider>,
}

impl AIService {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self { provider }
    }

    /// 生成词汇树
    ///
    /// 模型返回无法解析（包括响应体缺少内容）时回退到对应语言的默认树；
    /// 网络错误、超时和非 2xx 状态则返回错误。
    pub async fn generate_word_tree(
        &self,
        user_input: &str,
        language: Language,
    ) -> Result<VocabularyTree, AIError> {
        let request_id = format!("generate-{}", Uuid::new_v4());
        tracing::info!(%request_id, %language, "开始生成词汇树");

        let messages = prompt_builder::build_tree_messages(user_input, language);
        let content = match self.provider.complete(&messages).await {
            Ok(content) => content,
            // 2xx 但响应体不可用，与内容无法解析同样处理
            Err(AIError::InvalidResponse(message)) => {
                tracing::warn!(%request_id, error = %message, "API 响应结构异常，使用默认树");
                return Ok(default_tree(language));
            }
            Err(e) => {
                tracing::error!(%request_id, error = %e, "生成词汇树时上游调用失败");
                return Err(e);
            }
        };
        tracing::debug!(%request_id, raw = %content, "原始API返回内容");

        match response_normalizer::extract_tree(&content) {
            Ok(tree) => {
                tracing::info!(
                    %request_id,
                    categories = ?tree.keys().collect::<Vec<_>>(),
                    words = tree.word_count(),
                    "成功解析词汇树结构"
                );
                Ok(tree)
            }
            Err(e) => {
                if let NormalizeError::Malformed { text, .. } = &e {
                    tracing::debug!(%request_id, text = %text, "解析失败的内容");
                }
                tracing::warn!(%request_id, error = %e, "解析词汇树失败，使用默认树");
                Ok(default_tree(language))
            }
        }
    }

    /// 根据原始想法和选中的词汇生成优化后的提示词
    pub async fn optimize_prompt(
        &self,
        original_input: &str,
        selected_words: &SelectedWords,
        language: Language,
        include_ending: bool,
    ) -> Result<OptimizedPrompt, OptimizeError> {
        let request_id = format!("optimize-{}", Uuid::new_v4());
        tracing::info!(%request_id, %language, include_ending, "开始生成优化提示词");

        let messages = prompt_builder::build_optimize_messages(
            original_input,
            selected_words,
            language,
            include_ending,
        );
        let content = self.provider.complete(&messages).await?;
        let content = content.trim();

        if !include_ending {
            return Ok(OptimizedPrompt::Sentence(response_normalizer::clean_sentence(content)));
        }

        response_normalizer::extract_optimized_prompt(content, language)
            .map(OptimizedPrompt::WithEnding)
            .map_err(|e| {
                tracing::warn!(%request_id, error = %e, "解析优化结果失败");
                OptimizeError::from(e)
            })
    }

    /// 直接调用模型做连通性检查
    pub async fn probe(&self) -> Result<String, AIError> {
        self.provider.complete(&prompt_builder::build_probe_messages()).await
    }
}

/// 默认词汇树：3 个大类 × 2 个子类 × 4 个词
pub fn default_tree(language: Language) -> VocabularyTree {
    match language {
        Language::English => build_tree(&[
            (
                "Actions",
                &[
                    ("Basic", ["Create", "Develop", "Build", "Design"]),
                    ("Advanced", ["Optimize", "Enhance", "Implement", "Integrate"]),
                ],
            ),
            (
                "Objects",
                &[
                    ("Digital", ["Website", "App", "Software", "Platform"]),
                    ("Physical", ["Product", "Device", "Tool", "Material"]),
                ],
            ),
            (
                "Qualities",
                &[
                    ("Performance", ["Fast", "Reliable", "Efficient", "Responsive"]),
                    ("Appearance", ["Modern", "Clean", "Beautiful", "Intuitive"]),
                ],
            ),
        ]),
        Language::Chinese => build_tree(&[
            (
                "动作",
                &[
                    ("基础", ["创建", "开发", "构建", "设计"]),
                    ("高级", ["优化", "增强", "实现", "集成"]),
                ],
            ),
            (
                "对象",
                &[
                    ("数字", ["网站", "应用", "软件", "平台"]),
                    ("实体", ["产品", "设备", "工具", "材料"]),
                ],
            ),
            (
                "特质",
                &[
                    ("性能", ["快速", "可靠", "高效", "响应式"]),
                    ("外观", ["现代", "简洁", "美观", "直观"]),
                ],
            ),
        ]),
    }
}

type Skeleton<'a> = [(&'a str, &'a [(&'a str, [&'a str; 4]); 2])];

fn build_tree(skeleton: &Skeleton<'_>) -> VocabularyTree {
    let mut tree = VocabularyTree::new();
    for (category, subcategories) in skeleton {
        let mut branch = VocabularyTree::new();
        for (name, words) in subcategories.iter() {
            branch.insert(*name, TreeNode::Words(words.iter().map(|w| w.to_string()).collect()));
        }
        tree.insert(*category, TreeNode::Branch(branch));
    }
    tree
}
