//! redb 仓储后端
//!
//! 嵌入式单文件数据库。写事务串行执行，会话状态合并与记忆 upsert
//! 的读-改-写都在同一个写事务内完成，满足单行原子性。
//!
//! # 表
//!
//! - `users`: external_id -> user json
//! - `sessions`: session_id -> session json
//! - `messages`: session_id:seq -> message json（seq 单调递增，键序即时间序）
//! - `memories`: user_id:key -> memory json（键结构天然实现按键 upsert）

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{AppError, Result};
use crate::models::memory::{MemoryRecord, MemoryType};
use crate::models::message::{ContentType, Message, MessageRole};
use crate::models::session::{Session, SessionState};
use crate::models::user::User;
use crate::storage::repository::ChatRepository;

const USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
const SESSIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");
const MESSAGES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("messages");
const MEMORIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("memories");

/// redb 仓储实现
pub struct RedbRepository {
    db: Arc<Database>,
    /// 消息键的进程内单调序号，保证同毫秒写入仍按到达顺序排列
    message_seq: AtomicU64,
}

impl RedbRepository {
    /// 打开（或创建）数据库文件并初始化所有表
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(db_err)?;
        let write_txn = db.begin_write().map_err(db_err)?;
        write_txn.open_table(USERS_TABLE).map_err(db_err)?;
        write_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
        write_txn.open_table(MESSAGES_TABLE).map_err(db_err)?;
        write_txn.open_table(MEMORIES_TABLE).map_err(db_err)?;
        write_txn.commit().map_err(db_err)?;

        Ok(Self {
            db: Arc::new(db),
            message_seq: AtomicU64::new(0),
        })
    }

    fn memory_key(user_id: &str, key: &str) -> String {
        format!("{user_id}:{key}")
    }
}

fn db_err<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Database(e.to_string())
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| AppError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| AppError::Serialization(e.to_string()))
}

#[async_trait]
impl ChatRepository for RedbRepository {
    async fn get_or_create_user(&self, external_id: &str) -> Result<User> {
        let write_txn = self.db.begin_write().map_err(db_err)?;
        let user = {
            let mut table = write_txn.open_table(USERS_TABLE).map_err(db_err)?;
            let existing = match table.get(external_id).map_err(db_err)? {
                Some(existing) => Some(decode(existing.value())?),
                None => None,
            };
            match existing {
                Some(user) => user,
                None => {
                    let user = User::new(external_id);
                    table
                        .insert(external_id, encode(&user)?.as_slice())
                        .map_err(db_err)?;
                    user
                }
            }
        };
        write_txn.commit().map_err(db_err)?;
        Ok(user)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
        match table.get(session_id).map_err(db_err)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    async fn create_session(&self, user_id: &str) -> Result<Session> {
        let session = Session::new(user_id);
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
            table
                .insert(session.id.as_str(), encode(&session)?.as_slice())
                .map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(session)
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<Session>> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;

        let mut sessions = Vec::new();
        for item in table.iter().map_err(db_err)? {
            let (_, value) = item.map_err(db_err)?;
            let session: Session = decode(value.value())?;
            if session.user_id == user_id {
                sessions.push(session);
            }
        }
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn merge_session_state(&self, session_id: &str, update: SessionState) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
            let existing = match table.get(session_id).map_err(db_err)? {
                Some(data) => Some(decode::<Session>(data.value())?),
                None => None,
            };
            if let Some(mut session) = existing {
                session.merge_state(update);
                table
                    .insert(session_id, encode(&session)?.as_slice())
                    .map_err(db_err)?;
            }
        }
        write_txn.commit().map_err(db_err)?;
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
        let seq = self.message_seq.fetch_add(1, Ordering::SeqCst);
        let key = format!(
            "{}:{:020}:{:06}",
            session_id,
            message.created_at.timestamp_millis(),
            seq
        );

        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(MESSAGES_TABLE).map_err(db_err)?;
            table
                .insert(key.as_str(), encode(&message)?.as_slice())
                .map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(message)
    }

    async fn get_history(&self, session_id: &str, limit: usize) -> Result<Vec<Message>> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(MESSAGES_TABLE).map_err(db_err)?;

        let prefix = format!("{session_id}:");
        let mut messages = Vec::new();
        for item in table.iter().map_err(db_err)? {
            let (key, value) = item.map_err(db_err)?;
            if key.value().starts_with(&prefix) {
                messages.push(decode::<Message>(value.value())?);
            }
        }
        // 键序即时间序，取末尾 limit 条
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    async fn list_memories(&self, user_id: &str) -> Result<Vec<MemoryRecord>> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(MEMORIES_TABLE).map_err(db_err)?;

        let prefix = format!("{user_id}:");
        let mut records = Vec::new();
        for item in table.iter().map_err(db_err)? {
            let (key, value) = item.map_err(db_err)?;
            if key.value().starts_with(&prefix) {
                records.push(decode::<MemoryRecord>(value.value())?);
            }
        }
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
        let slot = Self::memory_key(user_id, key);
        let write_txn = self.db.begin_write().map_err(db_err)?;
        let record = {
            let mut table = write_txn.open_table(MEMORIES_TABLE).map_err(db_err)?;
            let existing = match table.get(slot.as_str()).map_err(db_err)? {
                Some(data) => Some(decode::<MemoryRecord>(data.value())?),
                None => None,
            };
            let record = match existing {
                Some(mut record) => {
                    record.overwrite(value, confidence);
                    record
                }
                None => {
                    let mut record = MemoryRecord::new(user_id, memory_type, key, value);
                    record.confidence = confidence;
                    record
                }
            };
            table
                .insert(slot.as_str(), encode(&record)?.as_slice())
                .map_err(db_err)?;
            record
        };
        write_txn.commit().map_err(db_err)?;
        Ok(record)
    }

    async fn delete_memory(&self, user_id: &str, key: &str) -> Result<bool> {
        let slot = Self::memory_key(user_id, key);
        let write_txn = self.db.begin_write().map_err(db_err)?;
        let existed = {
            let mut table = write_txn.open_table(MEMORIES_TABLE).map_err(db_err)?;
            table.remove(slot.as_str()).map_err(db_err)?.is_some()
        };
        write_txn.commit().map_err(db_err)?;
        Ok(existed)
    }

    async fn delete_memories_by_type(
        &self,
        user_id: &str,
        memory_type: MemoryType,
    ) -> Result<usize> {
        let prefix = format!("{user_id}:");
        let write_txn = self.db.begin_write().map_err(db_err)?;
        let deleted = {
            let mut table = write_txn.open_table(MEMORIES_TABLE).map_err(db_err)?;
            let mut doomed = Vec::new();
            for item in table.iter().map_err(db_err)? {
                let (key, value) = item.map_err(db_err)?;
                if key.value().starts_with(&prefix) {
                    let record: MemoryRecord = decode(value.value())?;
                    if record.memory_type == memory_type {
                        doomed.push(key.value().to_string());
                    }
                }
            }
            for key in &doomed {
                table.remove(key.as_str()).map_err(db_err)?;
            }
            doomed.len()
        };
        write_txn.commit().map_err(db_err)?;
        Ok(deleted)
    }
}
