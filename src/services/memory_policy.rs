//! 记忆写入策略
//!
//! 决定每一轮对话中哪些用户事实可以落库：
//! - 个人信息分支：用户要求遗忘时删除全部 personal 记录并立即返回
//!   （该分支互斥，当轮不再写入任何个人信息）；否则消息中的自报
//!   姓名与模型指令都可以写，处理顺序上模型指令在后、按键覆盖。
//! - 偏好/意向分支：有门禁——只有用户明确要求记住，或者模型发出了
//!   非空偏好指令，才会进入；偏好从不隐式存储。进入后每个维度先取
//!   模型指令值（按枚举校验），否则回退到消息关键词匹配；无法解析
//!   的维度保持原样，不用默认值覆盖。
//!
//! 关键词回退是启发式的，无关语境里出现 "grid" 之类的词会误判，
//! 这是已知的精度取舍，保持现状而不是悄悄收紧。

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::error::Result;
use crate::models::memory::{
    DetailLevel, MemoryType, PreferredView, PrimaryIntent, ResponseFormat, StylePreference, keys,
};
use crate::models::payload::{PersonalDirective, PreferenceDirective};
use crate::models::session::SessionState;
use crate::storage::repository::ChatRepository;

static DONT_REMEMBER_PERSONAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(don't remember|do not remember|forget|don't store|do not store|remove|delete)\s+(my\s+)?(name|details?|personal|info|information)\b",
    )
    .unwrap()
});

// 用户明确要求记住偏好（remember/save/store/keep/share + preference/choice 等组合）
static REMEMBER_ASK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(remember|save|store|keep|share|sharing)\s+(that\s+)?(my\s+)?(this\s+)?(preference|preferences|choice|choices|that\s+i\s+prefer|that\s+i\s+like|i\s+prefer|i\s+like)\b|\b(this\s+is|that'?s?)\s+(my\s+)?(preference|choice)\b|\b(want\s+to|would\s+like\s+to|please)\s+(remember|save|store|keep)\s+(my\s+)?(preference|choice|that\s+i\s+prefer)?\b",
    )
    .unwrap()
});

static NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)(?:call me|my name is|i'?m|i am|this is)\s+([a-zA-Z][a-zA-Z0-9_\s]{0,50})")
            .unwrap(),
        Regex::new(r"(?i)(?:you can call me|call me)\s+([a-zA-Z][a-zA-Z0-9_\s]{0,50})").unwrap(),
    ]
});

static COLLECTION_INTEREST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:interested in|like|love|collect)\s+(?:the\s+)?(?:collections?\s+)?([a-zA-Z0-9\s,]+?)(?:\s+collection)?[\.\!,\s]*$",
    )
    .unwrap()
});

static PRICE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:under|below|max|within)\s+(\d+(?:\.\d+)?)\s*ETH").unwrap());

/// 名字捕获里的填充词，不作为称呼存储
const NAME_STOPWORDS: [&str; 4] = ["me", "i", "a", "the"];

/// 记忆写入策略执行器
pub struct MemoryPolicy {
    repository: Arc<dyn ChatRepository>,
}

impl MemoryPolicy {
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    /// 按本轮输入决定记忆写入
    ///
    /// `personal_from_llm` / `preference_from_llm` 是标记提取出的原始
    /// 对象；门禁判断看原始对象是否为空（未知键也算开门），字段取值
    /// 走类型化视图。
    pub async fn apply(
        &self,
        user_id: &str,
        message: &str,
        personal_from_llm: &SessionState,
        preference_from_llm: &SessionState,
    ) -> Result<()> {
        let msg = message.trim();
        let msg_lower = msg.to_lowercase();

        if DONT_REMEMBER_PERSONAL.is_match(msg) {
            let deleted = self
                .repository
                .delete_memories_by_type(user_id, MemoryType::Personal)
                .await?;
            tracing::info!(user_id, deleted, "用户要求遗忘个人信息");
            return Ok(());
        }

        self.store_personal(user_id, msg, &PersonalDirective::from_map(personal_from_llm))
            .await?;

        let user_asked_remember = REMEMBER_ASK.is_match(msg);
        if !user_asked_remember && preference_from_llm.is_empty() {
            return Ok(());
        }

        self.store_preferences(
            user_id,
            msg,
            &msg_lower,
            &PreferenceDirective::from_map(preference_from_llm),
        )
        .await
    }

    async fn store_personal(
        &self,
        user_id: &str,
        msg: &str,
        directive: &PersonalDirective,
    ) -> Result<()> {
        // 消息里的自报姓名先写，之后模型指令按键覆盖
        for pattern in NAME_PATTERNS.iter() {
            if let Some(captures) = pattern.captures(msg) {
                if let Some(m) = captures.get(1) {
                    let name = m.as_str().trim();
                    if !name.is_empty()
                        && name.chars().count() <= 50
                        && !NAME_STOPWORDS.contains(&name.to_lowercase().as_str())
                    {
                        self.upsert(user_id, MemoryType::Personal, keys::DISPLAY_NAME, name)
                            .await?;
                    }
                }
                break;
            }
        }

        if let Some(name) = &directive.display_name {
            self.upsert(
                user_id,
                MemoryType::Personal,
                keys::DISPLAY_NAME,
                &truncate_chars(name, 100),
            )
            .await?;
        }
        if let Some(tz) = &directive.timezone {
            self.upsert(
                user_id,
                MemoryType::Personal,
                keys::TIMEZONE,
                &truncate_chars(tz, 100),
            )
            .await?;
        }
        if let Some(lang) = &directive.language {
            self.upsert(
                user_id,
                MemoryType::Personal,
                keys::LANGUAGE,
                &truncate_chars(lang, 50),
            )
            .await?;
        }
        Ok(())
    }

    async fn store_preferences(
        &self,
        user_id: &str,
        msg: &str,
        msg_lower: &str,
        directive: &PreferenceDirective,
    ) -> Result<()> {
        // 每个维度：指令值（枚举校验）优先，否则消息关键词回退
        if let Some(view) = directive
            .preferred_view
            .as_deref()
            .and_then(PreferredView::parse)
        {
            self.upsert(
                user_id,
                MemoryType::Preference,
                keys::PREFERRED_VIEW,
                view.as_str(),
            )
            .await?;
        } else if msg_lower.contains("table")
            || msg_lower.contains("list view")
            || msg_lower.contains("list format")
            || (msg_lower.contains("list")
                && (msg_lower.contains("view")
                    || msg_lower.contains("prefer")
                    || msg_lower.contains("preference")))
        {
            self.upsert(user_id, MemoryType::Preference, keys::PREFERRED_VIEW, "table")
                .await?;
        } else if msg_lower.contains("grid")
            || msg_lower.contains("card view")
            || msg_lower.contains("grid format")
        {
            self.upsert(user_id, MemoryType::Preference, keys::PREFERRED_VIEW, "grid")
                .await?;
        }

        if let Some(level) = directive
            .detail_level
            .as_deref()
            .and_then(DetailLevel::parse)
        {
            self.upsert(
                user_id,
                MemoryType::Preference,
                keys::DETAIL_LEVEL,
                level.as_str(),
            )
            .await?;
        } else if msg_lower.contains("more detail")
            || msg_lower.contains("full info")
            || msg_lower.contains("detailed")
        {
            self.upsert(user_id, MemoryType::Preference, keys::DETAIL_LEVEL, "detailed")
                .await?;
        } else if msg_lower.contains("brief")
            || msg_lower.contains("quick")
            || msg_lower.contains("minimal")
            || msg_lower.contains("less detail")
        {
            self.upsert(user_id, MemoryType::Preference, keys::DETAIL_LEVEL, "minimal")
                .await?;
        } else if msg_lower.contains("standard")
            && (msg_lower.contains("detail") || msg_lower.contains("info"))
        {
            self.upsert(user_id, MemoryType::Preference, keys::DETAIL_LEVEL, "standard")
                .await?;
        }

        if let Some(format) = directive
            .response_format
            .as_deref()
            .and_then(ResponseFormat::parse)
        {
            self.upsert(
                user_id,
                MemoryType::Preference,
                keys::RESPONSE_FORMAT,
                format.as_str(),
            )
            .await?;
        } else if msg_lower.contains("short")
            || msg_lower.contains("concise")
            || msg_lower.contains("quick answer")
        {
            self.upsert(
                user_id,
                MemoryType::Preference,
                keys::RESPONSE_FORMAT,
                "concise",
            )
            .await?;
        } else if msg_lower.contains("detailed")
            || msg_lower.contains("full")
            || msg_lower.contains("explain more")
        {
            self.upsert(
                user_id,
                MemoryType::Preference,
                keys::RESPONSE_FORMAT,
                "detailed",
            )
            .await?;
        } else if msg_lower.contains("balanced") {
            self.upsert(
                user_id,
                MemoryType::Preference,
                keys::RESPONSE_FORMAT,
                "balanced",
            )
            .await?;
        }

        if let Some(style) = directive
            .style_preference
            .as_deref()
            .and_then(StylePreference::parse)
        {
            self.upsert(
                user_id,
                MemoryType::Preference,
                keys::STYLE_PREFERENCE,
                style.as_str(),
            )
            .await?;
        } else if msg_lower.contains("minimal")
            && (msg_lower.contains("style")
                || msg_lower.contains("look")
                || msg_lower.contains("prefer"))
        {
            self.upsert(
                user_id,
                MemoryType::Preference,
                keys::STYLE_PREFERENCE,
                "minimal",
            )
            .await?;
        } else if msg_lower.contains("rich") || msg_lower.contains("more style") {
            self.upsert(user_id, MemoryType::Preference, keys::STYLE_PREFERENCE, "rich")
                .await?;
        }

        if let Some(intent) = directive
            .primary_intent
            .as_deref()
            .and_then(PrimaryIntent::parse)
        {
            self.upsert(
                user_id,
                MemoryType::Intent,
                keys::PRIMARY_INTENT,
                intent.as_str(),
            )
            .await?;
        } else if msg_lower.contains("just browsing")
            || msg_lower.contains("browsing")
            || msg_lower.contains("looking around")
        {
            self.upsert(user_id, MemoryType::Intent, keys::PRIMARY_INTENT, "browsing")
                .await?;
        } else if msg_lower.contains("looking to buy")
            || msg_lower.contains("want to buy")
            || msg_lower.contains("buying")
        {
            self.upsert(user_id, MemoryType::Intent, keys::PRIMARY_INTENT, "buying")
                .await?;
        } else if msg_lower.contains("collector") || msg_lower.contains("collecting") {
            self.upsert(user_id, MemoryType::Intent, keys::PRIMARY_INTENT, "collecting")
                .await?;
        } else if msg_lower.contains("research")
            || msg_lower.contains("comparing")
            || msg_lower.contains("analysis")
        {
            self.upsert(user_id, MemoryType::Intent, keys::PRIMARY_INTENT, "research")
                .await?;
        }

        if let Some(captures) = COLLECTION_INTEREST.captures(msg) {
            if let Some(m) = captures.get(1) {
                let raw = m.as_str().trim();
                if !raw.is_empty() && raw.chars().count() <= 200 {
                    self.upsert(user_id, MemoryType::Intent, keys::INTEREST_COLLECTIONS, raw)
                        .await?;
                }
            }
        }

        if let Some(captures) = PRICE_RANGE.captures(msg) {
            if let Some(m) = captures.get(1) {
                self.upsert(
                    user_id,
                    MemoryType::Intent,
                    keys::PRICE_RANGE_INTEREST,
                    &format!("under {} ETH", m.as_str()),
                )
                .await?;
            }
        }

        Ok(())
    }

    async fn upsert(
        &self,
        user_id: &str,
        memory_type: MemoryType,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.repository
            .upsert_memory(user_id, memory_type, key, value, 1.0)
            .await?;
        tracing::debug!(user_id, key, "写入用户记忆");
        Ok(())
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memstore::InMemoryRepository;
    use serde_json::json;

    fn policy() -> (MemoryPolicy, Arc<dyn ChatRepository>) {
        let repo: Arc<dyn ChatRepository> = Arc::new(InMemoryRepository::new());
        (MemoryPolicy::new(repo.clone()), repo)
    }

    fn map(value: serde_json::Value) -> SessionState {
        match value {
            serde_json::Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_forget_deletes_personal_and_blocks_writes() {
        let (policy, repo) = policy();
        repo.upsert_memory("u1", MemoryType::Personal, keys::DISPLAY_NAME, "Old", 1.0)
            .await
            .unwrap();

        let personal = map(json!({"display_name": "Alex"}));
        policy
            .apply("u1", "please forget my details", &personal, &SessionState::new())
            .await
            .unwrap();

        let records = repo.list_memories("u1").await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_name_from_message_then_directive_wins() {
        let (policy, repo) = policy();
        let personal = map(json!({"display_name": "Alexandra"}));
        policy
            .apply("u1", "call me Alex", &personal, &SessionState::new())
            .await
            .unwrap();

        let records = repo.list_memories("u1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, "Alexandra");
    }

    #[tokio::test]
    async fn test_name_stopword_not_stored() {
        let (policy, repo) = policy();
        policy
            .apply("u1", "i'm a", &SessionState::new(), &SessionState::new())
            .await
            .unwrap();
        assert!(repo.list_memories("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preference_not_stored_without_consent() {
        let (policy, repo) = policy();
        policy
            .apply("u1", "I like grid view", &SessionState::new(), &SessionState::new())
            .await
            .unwrap();
        assert!(repo.list_memories("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remember_ask_opens_keyword_fallback() {
        let (policy, repo) = policy();
        policy
            .apply(
                "u1",
                "please remember my preference for grid format",
                &SessionState::new(),
                &SessionState::new(),
            )
            .await
            .unwrap();

        let records = repo.list_memories("u1").await.unwrap();
        let view = records
            .iter()
            .find(|r| r.key == keys::PREFERRED_VIEW)
            .unwrap();
        assert_eq!(view.value, "grid");
    }

    #[tokio::test]
    async fn test_llm_directive_opens_gate_and_is_validated() {
        let (policy, repo) = policy();
        let preference = map(json!({"preferred_view": "Table", "detail_level": "bogus"}));
        policy
            .apply("u1", "hello", &SessionState::new(), &preference)
            .await
            .unwrap();

        let records = repo.list_memories("u1").await.unwrap();
        let view = records
            .iter()
            .find(|r| r.key == keys::PREFERRED_VIEW)
            .unwrap();
        assert_eq!(view.value, "table");
        // 非法枚举值且消息无关键词，维度保持未写入
        assert!(records.iter().all(|r| r.key != keys::DETAIL_LEVEL));
    }

    #[tokio::test]
    async fn test_price_ceiling_interest() {
        let (policy, repo) = policy();
        let preference = map(json!({"noise": true}));
        policy
            .apply("u1", "show me NFTs under 2.5 ETH", &SessionState::new(), &preference)
            .await
            .unwrap();

        let records = repo.list_memories("u1").await.unwrap();
        let price = records
            .iter()
            .find(|r| r.key == keys::PRICE_RANGE_INTEREST)
            .unwrap();
        assert_eq!(price.value, "under 2.5 ETH");
    }
}
