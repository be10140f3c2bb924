//! 仓储 trait
//!
//! 汇聚管道需要的全部持久化操作：用户、会话、消息、记忆。
//! 实现方须保证单行读-改-写的原子性（会话状态合并、记忆 upsert），
//! 除此之外不提供更强的串行化保证——同会话并发轮次按后写覆盖处理。

use async_trait::async_trait;

use crate::error::Result;
use crate::models::memory::{MemoryRecord, MemoryType};
use crate::models::message::{ContentType, Message, MessageRole};
use crate::models::session::{Session, SessionState};
use crate::models::user::User;

/// 对话仓储 trait
#[async_trait]
pub trait ChatRepository: Send + Sync {
    // --- 用户 ---

    /// 按外部标识获取用户，不存在则创建
    async fn get_or_create_user(&self, external_id: &str) -> Result<User>;

    // --- 会话 ---

    /// 根据 ID 获取会话
    async fn get_session(&self, session_id: &str) -> Result<Option<Session>>;

    /// 为用户创建新会话（状态为空对象）
    async fn create_session(&self, user_id: &str) -> Result<Session>;

    /// 列出用户的所有会话，按更新时间倒序
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<Session>>;

    /// 浅合并会话状态
    ///
    /// 空更新是无操作：不写入、不更新时间戳。会话不存在时静默返回，
    /// 与原子读-改-写一起构成后写覆盖语义。
    async fn merge_session_state(&self, session_id: &str, update: SessionState) -> Result<()>;

    // --- 消息 ---

    /// 追加一条消息
    async fn add_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
        content_type: ContentType,
    ) -> Result<Message>;

    /// 获取会话最近的消息，按时间正序返回
    async fn get_history(&self, session_id: &str, limit: usize) -> Result<Vec<Message>>;

    // --- 记忆 ---

    /// 列出用户的全部记忆
    async fn list_memories(&self, user_id: &str) -> Result<Vec<MemoryRecord>>;

    /// 按 (user_id, key) upsert 一条记忆
    async fn upsert_memory(
        &self,
        user_id: &str,
        memory_type: MemoryType,
        key: &str,
        value: &str,
        confidence: f32,
    ) -> Result<MemoryRecord>;

    /// 按键删除记忆
    async fn delete_memory(&self, user_id: &str, key: &str) -> Result<bool>;

    /// 按类型删除用户的全部记忆，返回删除数量
    async fn delete_memories_by_type(&self, user_id: &str, memory_type: MemoryType)
        -> Result<usize>;
}
