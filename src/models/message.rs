//! 消息数据模型
//!
//! 一条消息是会话中的一轮发言。助手消息以压缩后的块数组形式存储
//! （content_type = blocks_json），不保留组件的原始渲染体。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MessageRole {
    /// 用户消息
    #[serde(rename = "user")]
    User,

    /// 助手消息
    #[serde(rename = "assistant")]
    Assistant,

    /// 系统消息
    #[serde(rename = "system")]
    System,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// 消息内容类型
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ContentType {
    /// Markdown 纯文本
    #[serde(rename = "markdown")]
    Markdown,

    /// 压缩块数组（历史压缩输出）
    #[serde(rename = "blocks_json")]
    BlocksJson,
}

/// 消息实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// 消息唯一标识
    pub id: String,

    /// 所属会话 ID
    pub session_id: String,

    /// 角色
    pub role: MessageRole,

    /// 内容
    pub content: String,

    /// 内容类型
    pub content_type: ContentType,

    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// 创建新消息
    pub fn new(
        session_id: &str,
        role: MessageRole,
        content: &str,
        content_type: ContentType,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            role,
            content: content.to_string(),
            content_type,
            created_at: Utc::now(),
        }
    }
}

/// 历史压缩后的存储块
///
/// 文本块保留 markdown 原文；组件块的渲染体被替换为由会话数据
/// 推导出的紧凑摘要（component_data），两者互斥。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredBlock {
    /// Markdown 文本（文本块）
    pub markdown: String,

    /// 组件数据摘要（组件块）
    pub component_data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::new("session-1", MessageRole::User, "hello", ContentType::Markdown);
        assert_eq!(msg.session_id, "session-1");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content_type, ContentType::Markdown);
    }

    #[test]
    fn test_role_serde_round_trip() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        let role: MessageRole = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, MessageRole::User);
    }

    #[test]
    fn test_stored_block_defaults() {
        let block: StoredBlock = serde_json::from_str("{\"markdown\":\"hi\"}").unwrap();
        assert_eq!(block.markdown, "hi");
        assert!(block.component_data.is_empty());
    }
}
