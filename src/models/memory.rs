//! 记忆数据模型
//!
//! 按 (user_id, key) 唯一的用户长期记忆：个人信息、偏好、意图、行为。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 记忆类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MemoryType {
    /// 个人信息 - 称呼、时区、语言
    #[serde(rename = "personal")]
    Personal,

    /// 偏好 - 视图、详情级别、回复格式、样式
    #[serde(rename = "preference")]
    Preference,

    /// 意图 - 浏览/购买/收藏/调研，关注的收藏集和价格区间
    #[serde(rename = "intent")]
    Intent,

    /// 行为 - 从交互中归纳的习惯
    #[serde(rename = "behavior")]
    Behavior,
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryType::Personal => write!(f, "personal"),
            MemoryType::Preference => write!(f, "preference"),
            MemoryType::Intent => write!(f, "intent"),
            MemoryType::Behavior => write!(f, "behavior"),
        }
    }
}

/// 核心记忆结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// 记忆唯一标识
    pub id: String,

    /// 所属用户 ID
    pub user_id: String,

    /// 记忆类型
    pub memory_type: MemoryType,

    /// 记忆键（每个用户下唯一）
    pub key: String,

    /// 记忆值
    pub value: String,

    /// 置信度 (0.0-1.0)
    pub confidence: f32,

    /// 来源类型
    pub source: String,

    /// 创建时间
    pub created_at: DateTime<Utc>,

    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// 创建新记忆
    pub fn new(user_id: &str, memory_type: MemoryType, key: &str, value: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            memory_type,
            key: key.to_string(),
            value: value.to_string(),
            confidence: 1.0,
            source: "conversation".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 覆盖记忆值（upsert 的更新分支）
    pub fn overwrite(&mut self, value: &str, confidence: f32) {
        self.value = value.to_string();
        self.confidence = confidence;
        self.updated_at = Utc::now();
    }
}

/// 标准记忆键
///
/// 个人信息、偏好、意图各自使用固定的键名集合。
pub mod keys {
    // --- 个人信息 (memory_type = personal) ---
    pub const DISPLAY_NAME: &str = "display_name";
    pub const TIMEZONE: &str = "timezone";
    pub const LANGUAGE: &str = "language";

    // --- 偏好 (memory_type = preference) ---
    pub const PREFERRED_VIEW: &str = "preferred_view";
    pub const DETAIL_LEVEL: &str = "detail_level";
    pub const RESPONSE_FORMAT: &str = "response_format";
    pub const STYLE_PREFERENCE: &str = "style_preference";

    // --- 意图 (memory_type = intent) ---
    pub const PRIMARY_INTENT: &str = "primary_intent";
    pub const INTEREST_COLLECTIONS: &str = "interest_collections";
    pub const PRICE_RANGE_INTEREST: &str = "price_range_interest";
}

/// 首选视图取值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreferredView {
    Grid,
    Table,
}

impl PreferredView {
    /// 解析取值（大小写不敏感），非法取值返回 None
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "grid" => Some(Self::Grid),
            "table" => Some(Self::Table),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Table => "table",
        }
    }
}

/// 详情级别取值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetailLevel {
    Minimal,
    Standard,
    Detailed,
    Full,
}

impl DetailLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "minimal" => Some(Self::Minimal),
            "standard" => Some(Self::Standard),
            "detailed" => Some(Self::Detailed),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Standard => "standard",
            Self::Detailed => "detailed",
            Self::Full => "full",
        }
    }
}

/// 回复格式取值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResponseFormat {
    Concise,
    Balanced,
    Detailed,
}

impl ResponseFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "concise" => Some(Self::Concise),
            "balanced" => Some(Self::Balanced),
            "detailed" => Some(Self::Detailed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concise => "concise",
            Self::Balanced => "balanced",
            Self::Detailed => "detailed",
        }
    }
}

/// 样式偏好取值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StylePreference {
    Minimal,
    Rich,
}

impl StylePreference {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "minimal" => Some(Self::Minimal),
            "rich" => Some(Self::Rich),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Rich => "rich",
        }
    }
}

/// 主要意图取值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimaryIntent {
    Browsing,
    Buying,
    Collecting,
    Research,
}

impl PrimaryIntent {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "browsing" => Some(Self::Browsing),
            "buying" => Some(Self::Buying),
            "collecting" => Some(Self::Collecting),
            "research" => Some(Self::Research),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browsing => "browsing",
            Self::Buying => "buying",
            Self::Collecting => "collecting",
            Self::Research => "research",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_record_creation() {
        let record = MemoryRecord::new("user-1", MemoryType::Preference, keys::PREFERRED_VIEW, "grid");
        assert_eq!(record.memory_type, MemoryType::Preference);
        assert_eq!(record.key, "preferred_view");
        assert_eq!(record.confidence, 1.0);
        assert_eq!(record.source, "conversation");
    }

    #[test]
    fn test_memory_overwrite_bumps_updated_at() {
        let mut record = MemoryRecord::new("user-1", MemoryType::Preference, keys::PREFERRED_VIEW, "grid");
        let created = record.created_at;
        record.overwrite("table", 0.9);
        assert_eq!(record.value, "table");
        assert_eq!(record.confidence, 0.9);
        assert!(record.updated_at >= created);
    }

    #[test]
    fn test_enum_validation_rejects_unknown_values() {
        assert_eq!(PreferredView::parse("GRID"), Some(PreferredView::Grid));
        assert_eq!(PreferredView::parse("mosaic"), None);
        assert_eq!(DetailLevel::parse("Full"), Some(DetailLevel::Full));
        assert_eq!(ResponseFormat::parse("verbose"), None);
        assert_eq!(PrimaryIntent::parse("research"), Some(PrimaryIntent::Research));
    }

    #[test]
    fn test_memory_type_serde() {
        let json = serde_json::to_string(&MemoryType::Personal).unwrap();
        assert_eq!(json, "\"personal\"");
        let t: MemoryType = serde_json::from_str("\"intent\"").unwrap();
        assert_eq!(t, MemoryType::Intent);
    }
}
