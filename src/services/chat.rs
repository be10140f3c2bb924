//! 对话服务
//!
//! 一轮对话的完整流水线：落库用户消息 → 组装上下文 → 调用模型 →
//! 按固定顺序提取三种标记 → 清洗 → 切块 → 合并会话状态 / 写入
//! 用户记忆 / 压缩入库，最后返回保证无标记的内容块序列。
//!
//! 流水线内部没有并行；模型调用是唯一的挂起点。同一会话的并发
//! 请求不做串行化保证，会话状态按后写覆盖处理。

use std::sync::Arc;

use crate::agent::{AgentRuntime, BASE_INSTRUCTIONS};
use crate::error::Result;
use crate::models::chat::ContentBlock;
use crate::models::message::{ContentType, MessageRole};
use crate::models::payload::SessionDataPayload;
use crate::models::session::Session;
use crate::parser::{MarkerKind, extract_and_strip, parse_blocks, sanitize_for_user};
use crate::services::compaction::HistoryCompactor;
use crate::services::context::ContextManager;
use crate::services::memory_policy::MemoryPolicy;
use crate::storage::repository::ChatRepository;

/// 上下文带入的最大历史条数
const MAX_HISTORY: usize = 20;

/// 对话服务
pub struct ChatService {
    repository: Arc<dyn ChatRepository>,
    agent: Arc<dyn AgentRuntime>,
    context_manager: ContextManager,
    memory_policy: MemoryPolicy,
}

impl ChatService {
    pub fn new(repository: Arc<dyn ChatRepository>, agent: Arc<dyn AgentRuntime>) -> Self {
        Self {
            context_manager: ContextManager::new(repository.clone()),
            memory_policy: MemoryPolicy::new(repository.clone()),
            repository,
            agent,
        }
    }

    /// 端到端处理一条用户消息，返回（会话 ID，内容块序列）
    ///
    /// 返回的每个块都保证不含任何内部标记。持久化失败让整轮失败，
    /// 不会静默丢弃助手消息；标记解析问题就地恢复，永不升级为错误。
    pub async fn process_message(
        &self,
        external_user_id: &str,
        session_id: Option<&str>,
        message: &str,
    ) -> Result<(String, Vec<ContentBlock>)> {
        let user = self.repository.get_or_create_user(external_user_id).await?;
        let session = self.resolve_session(&user.id, session_id).await?;

        self.repository
            .add_message(&session.id, MessageRole::User, message, ContentType::Markdown)
            .await?;

        let context = self
            .context_manager
            .build_context(&user.id, &session.id, MAX_HISTORY)
            .await?;
        let system_prompt = self
            .context_manager
            .build_system_prompt(BASE_INSTRUCTIONS, &context);

        let raw_response = self.agent.invoke(&system_prompt, message).await?;

        // 固定顺序提取：会话数据 → 个人指令 → 偏好指令，逐步剥离
        let (state_updates, stripped) = extract_and_strip(&raw_response, MarkerKind::SessionData);
        if !state_updates.is_empty() {
            self.repository
                .merge_session_state(&session.id, state_updates.clone())
                .await?;
        }
        let (personal_from_llm, stripped) = extract_and_strip(&stripped, MarkerKind::StorePersonal);
        let (preference_from_llm, stripped) =
            extract_and_strip(&stripped, MarkerKind::StorePreference);

        let stripped = sanitize_for_user(&stripped);
        let blocks = parse_blocks(&stripped);

        // 逐块再清洗一次：切块可能让组件边界旁的残片重新暴露
        let mut sanitized_blocks = Vec::with_capacity(blocks.len());
        for block in &blocks {
            match block {
                ContentBlock::Text { markdown } => {
                    let cleaned = sanitize_for_user(markdown);
                    let cleaned = cleaned.trim();
                    if !cleaned.is_empty() {
                        sanitized_blocks.push(ContentBlock::text(cleaned));
                    }
                }
                component => sanitized_blocks.push(component.clone()),
            }
        }

        let payload = SessionDataPayload::from_state(&state_updates);
        let storage_json = HistoryCompactor::build_storage_json(&blocks, &payload)?;
        self.repository
            .add_message(
                &session.id,
                MessageRole::Assistant,
                &storage_json,
                ContentType::BlocksJson,
            )
            .await?;

        self.memory_policy
            .apply(&user.id, message, &personal_from_llm, &preference_from_llm)
            .await?;

        tracing::info!(
            session_id = %session.id,
            blocks = sanitized_blocks.len(),
            state_keys = state_updates.len(),
            "对话轮处理完成"
        );

        Ok((session.id, sanitized_blocks))
    }

    /// 客户端给了会话 ID 就续上，找不到或未给就新建
    async fn resolve_session(&self, user_id: &str, session_id: Option<&str>) -> Result<Session> {
        if let Some(id) = session_id {
            if let Some(session) = self.repository.get_session(id).await? {
                return Ok(session);
            }
        }
        self.repository.create_session(user_id).await
    }
}

/// 创建对话服务
pub fn create_chat_service(
    repository: Arc<dyn ChatRepository>,
    agent: Arc<dyn AgentRuntime>,
) -> Arc<ChatService> {
    Arc::new(ChatService::new(repository, agent))
}
