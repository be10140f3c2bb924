//! 会话 DTO

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::session::Session;

/// 会话信息响应
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// 会话 ID
    pub id: String,
    /// 会话标题
    pub title: Option<String>,
    /// 是否活跃
    pub is_active: bool,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            title: session.title,
            is_active: session.is_active,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}
