//! 内存仓储后端
//!
//! 单个读写锁保护的内存表，用于测试和临时运行。锁内完成整个
//! 读-改-写，天然满足单行原子性要求。

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::Result;
use crate::models::memory::{MemoryRecord, MemoryType};
use crate::models::message::{ContentType, Message, MessageRole};
use crate::models::session::{Session, SessionState};
use crate::models::user::User;
use crate::storage::repository::ChatRepository;

#[derive(Default)]
struct Tables {
    /// external_id -> User
    users: HashMap<String, User>,
    /// session_id -> Session
    sessions: HashMap<String, Session>,
    /// session_id -> 按到达顺序追加的消息
    messages: HashMap<String, Vec<Message>>,
    /// (user_id, key) -> MemoryRecord
    memories: HashMap<(String, String), MemoryRecord>,
}

/// 内存仓储实现
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    /// 创建空仓储
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for InMemoryRepository {
    async fn get_or_create_user(&self, external_id: &str) -> Result<User> {
        let mut tables = self.tables.write();
        if let Some(user) = tables.users.get(external_id) {
            return Ok(user.clone());
        }
        let user = User::new(external_id);
        tables.users.insert(external_id.to_string(), user.clone());
        Ok(user)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.tables.read().sessions.get(session_id).cloned())
    }

    async fn create_session(&self, user_id: &str) -> Result<Session> {
        let session = Session::new(user_id);
        self.tables
            .write()
            .sessions
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .tables
            .read()
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn merge_session_state(&self, session_id: &str, update: SessionState) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        let mut tables = self.tables.write();
        if let Some(session) = tables.sessions.get_mut(session_id) {
            session.merge_state(update);
        }
        Ok(())
    }

    async fn add_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
        content_type: ContentType,
    ) -> Result<Message> {
        let message = Message::new(session_id, role, content, content_type);
        self.tables
            .write()
            .messages
            .entry(session_id.to_string())
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn get_history(&self, session_id: &str, limit: usize) -> Result<Vec<Message>> {
        let tables = self.tables.read();
        let messages = tables
            .messages
            .get(session_id)
            .map(|m| m.as_slice())
            .unwrap_or_default();
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    async fn list_memories(&self, user_id: &str) -> Result<Vec<MemoryRecord>> {
        let mut records: Vec<MemoryRecord> = self
            .tables
            .read()
            .memories
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(records)
    }

    async fn upsert_memory(
        &self,
        user_id: &str,
        memory_type: MemoryType,
        key: &str,
        value: &str,
        confidence: f32,
    ) -> Result<MemoryRecord> {
        let mut tables = self.tables.write();
        let slot = (user_id.to_string(), key.to_string());
        let record = match tables.memories.get_mut(&slot) {
            Some(existing) => {
                existing.overwrite(value, confidence);
                existing.clone()
            }
            None => {
                let mut record = MemoryRecord::new(user_id, memory_type, key, value);
                record.confidence = confidence;
                tables.memories.insert(slot, record.clone());
                record
            }
        };
        Ok(record)
    }

    async fn delete_memory(&self, user_id: &str, key: &str) -> Result<bool> {
        let removed = self
            .tables
            .write()
            .memories
            .remove(&(user_id.to_string(), key.to_string()));
        Ok(removed.is_some())
    }

    async fn delete_memories_by_type(
        &self,
        user_id: &str,
        memory_type: MemoryType,
    ) -> Result<usize> {
        let mut tables = self.tables.write();
        let doomed: Vec<(String, String)> = tables
            .memories
            .iter()
            .filter(|(slot, record)| slot.0 == user_id && record.memory_type == memory_type)
            .map(|(slot, _)| slot.clone())
            .collect();
        for slot in &doomed {
            tables.memories.remove(slot);
        }
        Ok(doomed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_or_create_user_is_idempotent() {
        let repo = InMemoryRepository::new();
        let first = repo.get_or_create_user("ext-1").await.unwrap();
        let second = repo.get_or_create_user("ext-1").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_session_state_merge_semantics() {
        let repo = InMemoryRepository::new();
        let session = repo.create_session("user-1").await.unwrap();

        let mut update = SessionState::new();
        update.insert("x".into(), json!(1));
        update.insert("y".into(), json!(2));
        repo.merge_session_state(&session.id, update).await.unwrap();

        let mut update = SessionState::new();
        update.insert("y".into(), json!(3));
        update.insert("z".into(), json!(4));
        repo.merge_session_state(&session.id, update).await.unwrap();

        let stored = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.state.get("x"), Some(&json!(1)));
        assert_eq!(stored.state.get("y"), Some(&json!(3)));
        assert_eq!(stored.state.get("z"), Some(&json!(4)));
    }

    #[tokio::test]
    async fn test_empty_state_update_does_not_bump_timestamp() {
        let repo = InMemoryRepository::new();
        let session = repo.create_session("user-1").await.unwrap();
        let before = repo.get_session(&session.id).await.unwrap().unwrap().updated_at;

        repo.merge_session_state(&session.id, SessionState::new())
            .await
            .unwrap();

        let after = repo.get_session(&session.id).await.unwrap().unwrap().updated_at;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_history_returns_chronological_tail() {
        let repo = InMemoryRepository::new();
        let session = repo.create_session("user-1").await.unwrap();
        for i in 0..5 {
            repo.add_message(
                &session.id,
                MessageRole::User,
                &format!("msg-{i}"),
                ContentType::Markdown,
            )
            .await
            .unwrap();
        }
        let history = repo.get_history(&session.id, 3).await.unwrap();
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["msg-2", "msg-3", "msg-4"]);
    }

    #[tokio::test]
    async fn test_memory_upsert_is_unique_per_key() {
        let repo = InMemoryRepository::new();
        repo.upsert_memory("user-1", MemoryType::Preference, "preferred_view", "grid", 1.0)
            .await
            .unwrap();
        repo.upsert_memory("user-1", MemoryType::Preference, "preferred_view", "table", 1.0)
            .await
            .unwrap();

        let records = repo.list_memories("user-1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, "table");
    }

    #[tokio::test]
    async fn test_delete_memories_by_type_spares_other_types() {
        let repo = InMemoryRepository::new();
        repo.upsert_memory("user-1", MemoryType::Personal, "display_name", "Alex", 1.0)
            .await
            .unwrap();
        repo.upsert_memory("user-1", MemoryType::Preference, "preferred_view", "grid", 1.0)
            .await
            .unwrap();

        let deleted = repo
            .delete_memories_by_type("user-1", MemoryType::Personal)
            .await
            .unwrap();
        assert_eq!(deleted, 1);

        let records = repo.list_memories("user-1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "preferred_view");
    }
}
