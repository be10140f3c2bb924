//! 对话 DTO
//!
//! 定义对话相关的请求和响应数据结构。

use serde::{Deserialize, Serialize};

use crate::models::chat::ContentBlock;

/// 对话请求
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// 用户消息
    pub message: String,
    /// 外部用户标识
    pub user_id: String,
    /// 会话 ID，缺省时新建会话
    pub session_id: Option<String>,
}

/// 对话响应
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// 会话 ID（新建或沿用）
    pub session_id: String,
    /// 内容块序列，保证无内部标记
    pub blocks: Vec<ContentBlock>,
}
