//! 服务模块

pub mod chat;
pub mod compaction;
pub mod context;
pub mod memory_policy;

pub use chat::{ChatService, create_chat_service};
pub use compaction::HistoryCompactor;
pub use context::{ContextManager, ConversationContext};
pub use memory_policy::MemoryPolicy;
