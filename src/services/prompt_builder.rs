//! 提示词模板
//!
//! 每次调用只生成一条 system 消息和一条 user 消息。
//! 模板整体按检测到的语言切换，不混用。

use crate::models::SelectedWords;
use crate::services::ai_providers::ChatMessage;
use crate::services::language::Language;

const TREE_SYSTEM_EN: &str = "You are a professional AI prompt generator. Please create a hierarchical tree structure, not a flat list. Return strictly in the required nested JSON format without adding any extra explanations or text.";

const TREE_SYSTEM_ZH: &str = "你是一个专业的AI提示词生成助手。请生成一个层次化的树状结构，不是扁平的列表。请严格按照要求的嵌套JSON格式返回，不要添加任何额外的说明或文本。";

const TREE_EXAMPLE_EN: &str = r#"{
  "tree": {
    "Cooking Methods": {
      "Hot Processing": ["Stir-fry", "Pan-fry", "Stew", "Steam"],
      "Cold Processing": ["Mix", "Marinate", "Cut", "Blend"]
    },
    "Ingredient Selection": {
      "Staples": ["Rice", "Noodles", "Bread"],
      "Proteins": ["Meat", "Tofu", "Eggs"],
      "Vegetables": ["Greens", "Carrots", "Potatoes"]
    },
    "Flavor Styles": {
      "Tastes": ["Savory", "Spicy", "Mild"],
      "Cuisines": ["Sichuan", "Cantonese", "Northeast"]
    },
    "Cooking Tools": {
      "Cookware": ["Pot", "Spatula", "Bowl"],
      "Auxiliary Tools": ["Knife", "Cutting Board", "Chopsticks"]
    }
  }
}"#;

const TREE_EXAMPLE_ZH: &str = r#"{
  "tree": {
    "烹饪方法": {
      "热加工": ["炒", "煎", "炖", "蒸"],
      "冷加工": ["拌", "腌", "切", "混合"]
    },
    "食材选择": {
      "主食": ["米饭", "面条", "馒头"],
      "蛋白质": ["肉类", "豆制品", "鸡蛋"],
      "蔬菜": ["青菜", "胡萝卜", "土豆"]
    },
    "味道风格": {
      "口味": ["咸鲜", "麻辣", "清淡"],
      "菜系": ["川菜", "粤菜", "东北菜"]
    },
    "烹饪工具": {
      "炊具": ["锅", "铲", "碗"],
      "辅助工具": ["菜刀", "砧板", "筷子"]
    }
  }
}"#;

const OPTIMIZE_SYSTEM_EN: &str = "You are a professional AI prompt generator. Based on the user's original input and selected keywords, generate a smooth, coherent, and clear prompt sentence. Do not add any explanations, just return the optimized sentence directly.";

const OPTIMIZE_SYSTEM_ZH: &str = "你是一个专业的AI提示词生成助手。请根据用户的原始输入和选择的关键词，生成一个流畅、连贯、清晰的提示词句子。不要添加任何解释，直接返回优化后的句子。";

/// `/test-api` 使用的探测消息
const PROBE_PROMPT: &str = r#"请返回一个简单的JSON: {"success": true}"#;

/// 词汇树生成消息
pub fn build_tree_messages(user_input: &str, language: Language) -> Vec<ChatMessage> {
    let (system, user) = match language {
        Language::English => (TREE_SYSTEM_EN, tree_prompt_en(user_input)),
        Language::Chinese => (TREE_SYSTEM_ZH, tree_prompt_zh(user_input)),
    };
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

fn tree_prompt_en(user_input: &str) -> String {
    format!(
        r#"Based on the user's idea: "{input}", generate a hierarchical tree JSON structure.
The structure should have the following characteristics:
1. The top level should contain 3-5 major categories, which should be dynamically determined based on the user's input content, rather than fixed categories. For example, for "I want to cook a meal", possible major categories might be "Cooking Methods", "Ingredient Types", "Kitchen Tools", "Cuisine Styles", etc.
2. Each major category should have 2-4 subcategories
3. Each subcategory should include 3-5 specific vocabulary items

IMPORTANT: Since the user is writing in English, ALL category names and vocabulary words MUST be in English.

For example, for the input "I want to cook a meal", it might generate:
{example}

Please ensure the JSON structure contains only the "tree" field as the top-level key, and follow the exact format shown in the example. The content should be in English to match the user's input language."#,
        input = user_input.trim(),
        example = TREE_EXAMPLE_EN,
    )
}

fn tree_prompt_zh(user_input: &str) -> String {
    format!(
        r#"基于用户的想法："{input}"，生成一个层次化的树状JSON结构。
结构应该有以下特点：
1. 最顶层包含3-5个大类别，这些类别应该根据用户输入内容动态确定，而不是固定的类别。例如，对于"我想做一顿饭"，可能的大类别有"烹饪方法"、"食材类型"、"厨房工具"、"菜系风格"等。
2. 每个大类别下有2-4个子类别
3. 每个子类别下包含3-5个具体的词汇

重要：由于用户使用中文输入，所有类别名称和词汇必须使用中文。

例如，输入"我想做一顿饭"可能生成：
{example}

请确保JSON结构仅包含"tree"作为顶级字段，并遵照示例中的精确格式。内容应该与用户的输入语言匹配，使用中文。"#,
        input = user_input.trim(),
        example = TREE_EXAMPLE_ZH,
    )
}

/// 句子优化消息；`include_ending` 时额外要求结尾请求句并以两字段 JSON 返回
pub fn build_optimize_messages(
    user_input: &str,
    selected_words: &SelectedWords,
    language: Language,
    include_ending: bool,
) -> Vec<ChatMessage> {
    let words = selected_words.render();
    let input = user_input.trim();

    let (system, user) = match language {
        Language::English => {
            let mut prompt = format!(
                r#"Original idea: "{input}"
Selected vocabulary: "{words}"

Based on the information above, generate a smooth, coherent, and clear prompt sentence, integrating these keywords reasonably into the sentence. The returned sentence should be grammatically correct, logically clear, and easy to understand. Do not include any additional explanations or instructions, only return the optimized sentence."#
            );
            if include_ending {
                prompt.push_str(
                    r#"

Important: In addition to the main sentence, please also generate an ending request sentence that matches the context, to ask an AI for related help. For example, for travel planning, it might be "Please recommend detailed itinerary arrangements and booking suggestions"; for development needs, it might be "Please provide code implementation ideas and steps." The ending sentence should connect naturally, don't use generic sentences like "Please help me complete this task."

Return format: {"mainSentence":"your main content","endingSentence":"your ending sentence"}"#,
                );
            }
            (OPTIMIZE_SYSTEM_EN, prompt)
        }
        Language::Chinese => {
            let mut prompt = format!(
                r#"原始想法："{input}"
选择的词汇："{words}"

请根据以上信息，生成一个流畅、连贯、清晰的提示词句子，将这些关键词合理地融入到句子中。返回的句子应该语法正确、逻辑清晰、易于理解。不要包含任何额外的解释或说明，仅返回优化后的句子。"#
            );
            if include_ending {
                prompt.push_str(
                    r#"

重要：除了主句外，请额外生成一个与上下文相符的结尾请求句，用于向AI请求相关帮助。例如，对于旅游规划，可能是"请推荐详细的行程安排和预订建议"；对于开发需求，可能是"请提供代码实现思路和步骤"。结尾句应自然衔接，不要使用"请帮我完成这个任务"这类通用句。

返回格式：{"主体句":"你的主体内容","结尾句":"你的结尾句"}"#,
                );
            }
            (OPTIMIZE_SYSTEM_ZH, prompt)
        }
    };

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

pub fn build_probe_messages() -> Vec<ChatMessage> {
    vec![ChatMessage::user(PROBE_PROMPT)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ai_providers::MessageRole;
    use once_cell::sync::Lazy;
    use regex::Regex;

    static CJK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Han}").unwrap());

    fn roles(messages: &[ChatMessage]) -> Vec<MessageRole> {
        messages.iter().map(|m| m.role).collect()
    }

    #[test]
    fn test_tree_messages_english() {
        let messages = build_tree_messages("I want to build a website", Language::English);
        assert_eq!(roles(&messages), vec![MessageRole::System, MessageRole::User]);
        let user = &messages[1].content;
        assert!(user.contains(r#""I want to build a website""#));
        assert!(user.contains("3-5 major categories"));
        assert!(user.contains("2-4 subcategories"));
        assert!(user.contains("3-5 specific vocabulary items"));
        assert!(user.contains("MUST be in English"));
        // 英文模板里不能混入中文
        assert!(!CJK.is_match(&messages[0].content));
        assert!(!CJK.is_match(user));
    }

    #[test]
    fn test_tree_messages_chinese() {
        let messages = build_tree_messages("我想做一顿饭", Language::Chinese);
        assert_eq!(roles(&messages), vec![MessageRole::System, MessageRole::User]);
        let user = &messages[1].content;
        assert!(user.contains("\"我想做一顿饭\""));
        assert!(user.contains("3-5个大类别"));
        assert!(user.contains("必须使用中文"));
        assert!(user.contains("\"烹饪方法\""));
        assert!(!user.contains("Cooking Methods"));
    }

    #[test]
    fn test_optimize_messages_without_ending() {
        let words = SelectedWords::List(vec!["Build".to_string(), "Fast".to_string()]);
        let messages = build_optimize_messages("I want a website", &words, Language::English, false);
        assert_eq!(roles(&messages), vec![MessageRole::System, MessageRole::User]);
        let user = &messages[1].content;
        assert!(user.contains(r#"Selected vocabulary: "Build,Fast""#));
        assert!(!user.contains("endingSentence"));
    }

    #[test]
    fn test_optimize_messages_with_ending() {
        let words = SelectedWords::Text("炒 蒸".to_string());
        let messages = build_optimize_messages("我想做饭", &words, Language::Chinese, true);
        let user = &messages[1].content;
        assert!(user.contains("选择的词汇：\"炒 蒸\""));
        assert!(user.contains(r#"{"主体句":"你的主体内容","结尾句":"你的结尾句"}"#));
        assert!(user.contains("不要使用\"请帮我完成这个任务\""));

        let en = build_optimize_messages("I travel", &words, Language::English, true);
        assert!(en[1].content.contains(r#"{"mainSentence":"your main content","endingSentence":"your ending sentence"}"#));
        assert!(en[1].content.contains("don't use generic sentences"));
    }

    #[test]
    fn test_probe_messages() {
        let messages = build_probe_messages();
        assert_eq!(roles(&messages), vec![MessageRole::User]);
    }
}
