//! 会话数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// 会话状态：顶层键值的 JSON 对象，仅通过浅合并修改
pub type SessionState = serde_json::Map<String, Value>;

/// 会话实体
///
/// 承载一次多轮对话的元数据和会话级状态（如最近展示的 NFT 列表）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// 会话唯一标识
    pub id: String,

    /// 所属用户标识
    pub user_id: String,

    /// 会话标题
    pub title: Option<String>,

    /// 是否活跃
    pub is_active: bool,

    /// 会话级状态（JSON 对象）
    #[serde(default)]
    pub state: SessionState,

    /// 创建时间
    pub created_at: DateTime<Utc>,

    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// 创建新会话，状态为空对象
    pub fn new(user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: None,
            is_active: true,
            state: SessionState::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 浅合并状态更新：同名顶层键整体覆盖，未出现的键保留。
    /// 空更新是无操作，不触碰更新时间。
    pub fn merge_state(&mut self, update: SessionState) {
        if update.is_empty() {
            return;
        }
        for (key, value) in update {
            self.state.insert(key, value);
        }
        self.touch();
    }

    /// 更新最后活跃时间
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(pairs: &[(&str, Value)]) -> SessionState {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_shallow_merge_overwrites_and_preserves() {
        let mut session = Session::new("user-1");
        session.state = state(&[("x", json!(1)), ("y", json!(2))]);

        session.merge_state(state(&[("y", json!(3)), ("z", json!(4))]));

        assert_eq!(session.state.get("x"), Some(&json!(1)));
        assert_eq!(session.state.get("y"), Some(&json!(3)));
        assert_eq!(session.state.get("z"), Some(&json!(4)));
    }

    #[test]
    fn test_nested_values_are_replaced_not_deep_merged() {
        let mut session = Session::new("user-1");
        session.state = state(&[("params", json!({"limit": 10, "skip": 0}))]);

        session.merge_state(state(&[("params", json!({"limit": 5}))]));

        assert_eq!(session.state.get("params"), Some(&json!({"limit": 5})));
    }

    #[test]
    fn test_empty_merge_is_noop() {
        let mut session = Session::new("user-1");
        session.state = state(&[("x", json!(1))]);
        let before = session.updated_at;

        session.merge_state(SessionState::new());

        assert_eq!(session.state.get("x"), Some(&json!(1)));
        assert_eq!(session.updated_at, before);
    }
}
