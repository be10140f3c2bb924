//! 记忆 DTO

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::memory::MemoryRecord;

/// 记忆记录响应
#[derive(Debug, Serialize)]
pub struct MemoryResponse {
    /// 记忆类型
    pub memory_type: String,
    /// 键
    pub key: String,
    /// 值
    pub value: String,
    /// 置信度
    pub confidence: f32,
    /// 来源
    pub source: String,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl From<MemoryRecord> for MemoryResponse {
    fn from(record: MemoryRecord) -> Self {
        Self {
            memory_type: record.memory_type.to_string(),
            key: record.key,
            value: record.value,
            confidence: record.confidence,
            source: record.source,
            updated_at: record.updated_at,
        }
    }
}

/// 删除记忆响应
#[derive(Debug, Serialize)]
pub struct DeleteMemoryResponse {
    /// 是否真的删除了一条记录
    pub deleted: bool,
}
