//! 上下文构建服务
//!
//! 为每一轮模型调用组装系统提示：基础指令 + 用户记忆 + 会话状态
//! + 最近对话。blocks_json 形态的历史消息在这里展开回可读文本。

use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::Result;
use crate::models::memory::{MemoryRecord, MemoryType};
use crate::models::message::{ContentType, Message, MessageRole, StoredBlock};
use crate::models::payload::SessionDataPayload;
use crate::models::session::SessionState;
use crate::storage::repository::ChatRepository;

/// 系统提示里列表最多展开的条目数
const STATE_LIST_LIMIT: usize = 20;
/// 带入提示的最近消息条数
const HISTORY_TAIL: usize = 10;
/// 单条历史消息截断长度（字符）
const HISTORY_MESSAGE_LIMIT: usize = 300;

/// 构建好的对话上下文
pub struct ConversationContext {
    /// 展开后的历史消息（role, content）
    pub history: Vec<(MessageRole, String)>,
    /// 按类型分节的记忆文本，空字符串表示没有记忆
    pub memories: String,
    /// 当前会话状态
    pub session_state: SessionState,
}

/// 上下文管理器
pub struct ContextManager {
    repository: Arc<dyn ChatRepository>,
}

impl ContextManager {
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    /// 收集一轮调用所需的全部上下文
    pub async fn build_context(
        &self,
        user_id: &str,
        session_id: &str,
        max_history: usize,
    ) -> Result<ConversationContext> {
        let messages = self.repository.get_history(session_id, max_history).await?;
        let history = format_history(&messages);

        let records = self.repository.list_memories(user_id).await?;
        let memories = format_memories(&records);

        let session_state = self
            .repository
            .get_session(session_id)
            .await?
            .map(|s| s.state)
            .unwrap_or_default();

        Ok(ConversationContext {
            history,
            memories,
            session_state,
        })
    }

    /// 组合基础指令与用户上下文为系统提示
    pub fn build_system_prompt(&self, base_instructions: &str, context: &ConversationContext) -> String {
        let mut parts = vec![base_instructions.to_string()];

        if !context.memories.is_empty() {
            parts.push(context.memories.clone());
        }

        parts.push(format_session_state(&context.session_state));

        if !context.history.is_empty() {
            parts.push(format_recent_history(&context.history));
        }

        parts.join("\n\n")
    }
}

/// 历史消息展开：blocks_json 内容转为 markdown 与摘要拼接的纯文本
fn format_history(messages: &[Message]) -> Vec<(MessageRole, String)> {
    messages
        .iter()
        .filter(|m| matches!(m.role, MessageRole::User | MessageRole::Assistant))
        .map(|m| {
            let content = match m.content_type {
                ContentType::BlocksJson => expand_blocks_json(&m.content),
                ContentType::Markdown => m.content.clone(),
            };
            (m.role, content)
        })
        .collect()
}

fn expand_blocks_json(content: &str) -> String {
    let Ok(blocks) = serde_json::from_str::<Vec<StoredBlock>>(content) else {
        return content.to_string();
    };
    let mut parts = Vec::new();
    for block in &blocks {
        let md = block.markdown.trim();
        if !md.is_empty() {
            parts.push(md.to_string());
        }
        let data = block.component_data.trim();
        if !data.is_empty() {
            parts.push(data.to_string());
        }
    }
    if parts.is_empty() {
        content.to_string()
    } else {
        parts.join("\n\n")
    }
}

/// 记忆按类型分节输出，没有记忆返回空字符串
fn format_memories(records: &[MemoryRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut personal = Vec::new();
    let mut preference = Vec::new();
    let mut intent = Vec::new();
    for record in records {
        match record.memory_type {
            MemoryType::Personal => personal.push(record),
            MemoryType::Preference => preference.push(record),
            MemoryType::Intent | MemoryType::Behavior => intent.push(record),
        }
    }

    let mut sections = Vec::new();
    if !personal.is_empty() {
        sections.push("## User Personal Details (use when addressing the user):".to_string());
        for r in &personal {
            sections.push(format!("- {}: {}", r.key, r.value));
        }
    }
    if !preference.is_empty() {
        sections.push("## User Preferences (page/response format, styling):".to_string());
        for r in &preference {
            sections.push(format!("- {}: {}", r.key, r.value));
        }
    }
    if !intent.is_empty() {
        sections.push("## User Intents & Behavior (tailor suggestions):".to_string());
        for r in &intent {
            sections.push(format!("- {}: {}", r.key, r.value));
        }
    }
    sections.join("\n")
}

fn format_session_state(state: &SessionState) -> String {
    let payload = SessionDataPayload::from_state(state);
    let mut out = String::from("\n## Current Session State:\n");
    out.push_str(
        "- view_type: infer from user query — e.g. 'list of 5 NFTs', 'show as list' → table; otherwise default grid; do not ask user to confirm)\n",
    );

    if !payload.nft_list.is_empty() {
        out.push_str(
            "\n**Last NFTs listed in this session (use these for get_nft_details when user says 'the first one', 'that one', 'the third', 'the Crypto Kings one', etc.):**\n",
        );
        for (i, nft) in payload.nft_list.iter().take(STATE_LIST_LIMIT).enumerate() {
            let _ = writeln!(out, "- #{}: {} — {} ({})", i + 1, nft.id, nft.name, nft.collection);
        }
        out.push_str("Use the **id** value as nft_id in get_nft_details. Never ask the user for NFT ID.\n");
    }

    if !payload.collection_list.is_empty() {
        out.push_str(
            "\n**Last collections listed in this session (use collection name for list_nfts when user says 'NFTs from the first collection', 'that collection', etc.):**\n",
        );
        for (i, col) in payload.collection_list.iter().take(STATE_LIST_LIMIT).enumerate() {
            let _ = writeln!(out, "- #{}: {} ({} NFTs)", i + 1, col.name, col.nft_count);
        }
    }

    if let Some(params) = &payload.last_list_params {
        let prev_skip = params.skip.unwrap_or(0);
        let prev_limit = params.limit.unwrap_or(10);
        let next_skip = prev_skip + prev_limit;
        let mut fields = vec![
            format!("limit={prev_limit}"),
            format!("skip={prev_skip}"),
            format!("sort_by={}", params.sort_by.as_deref().unwrap_or("tokenId")),
            format!("order={}", params.order.as_deref().unwrap_or("asc")),
        ];
        if let Some(collection) = &params.collection {
            fields.push(format!("collection={collection:?}"));
        }
        if let Some(search) = &params.search {
            fields.push(format!("search={search:?}"));
        }
        if let Some(status) = &params.status {
            fields.push(format!("status={status}"));
        }
        if let Some(min) = params.min_price_eth {
            fields.push(format!("min_price_eth={min}"));
        }
        if let Some(max) = params.max_price_eth {
            fields.push(format!("max_price_eth={max}"));
        }
        let _ = writeln!(
            out,
            "\n**Last list_nfts query (for pagination — 'next N', 'next 5', 'more', 'next page'):** {}. To get the next N NFTs, use the same filters and sort with **skip={next_skip}** and **limit=N** (e.g. 'next 5' → skip={next_skip}, limit=5).",
            fields.join(", ")
        );
    }

    for (key, value) in state {
        if matches!(key.as_str(), "nft_list" | "collection_list" | "last_list_params") {
            continue;
        }
        let _ = writeln!(out, "- {key}: {value}");
    }

    out
}

fn format_recent_history(history: &[(MessageRole, String)]) -> String {
    let mut out = String::from("\n## Recent Conversation:\n");
    let start = history.len().saturating_sub(HISTORY_TAIL);
    for (role, content) in &history[start..] {
        let role_label = match role {
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
            MessageRole::System => "System",
        };
        let truncated: String = content.chars().take(HISTORY_MESSAGE_LIMIT).collect();
        let _ = writeln!(out, "**{role_label}**: {truncated}");
    }
    out
}
