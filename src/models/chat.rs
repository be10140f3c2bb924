//! 对话内容块模型

use serde::{Deserialize, Serialize};

/// 解析后的内容块
///
/// 助手回复被拆分为有序的块序列：Markdown 文本块与不透明的组件块。
/// 块之间保持原文的左到右顺序，永不重排。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Markdown 文本段
    Text {
        /// 文本内容
        markdown: String,
    },

    /// 预渲染的组件段（本层不解释其内容）
    Component {
        /// 组件类型标签，如 grid / table / details
        template: String,
        /// 原样捕获的组件体
        body: String,
    },
}

impl ContentBlock {
    /// 创建文本块
    pub fn text(markdown: impl Into<String>) -> Self {
        Self::Text {
            markdown: markdown.into(),
        }
    }

    /// 创建组件块
    pub fn component(template: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Component {
            template: template.into(),
            body: body.into(),
        }
    }

    /// 是否为文本块
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_serde_tagging() {
        let block = ContentBlock::text("hello");
        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains("\"type\":\"text\""));

        let block = ContentBlock::component("grid", "<div/>");
        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains("\"type\":\"component\""));
        assert!(json.contains("\"template\":\"grid\""));
    }
}
