//! 数据模型模块

pub mod chat;
pub mod memory;
pub mod message;
pub mod payload;
pub mod session;
pub mod user;

pub use chat::ContentBlock;
pub use memory::{MemoryRecord, MemoryType};
pub use message::{ContentType, Message, MessageRole, StoredBlock};
pub use payload::{PersonalDirective, PreferenceDirective, SessionDataPayload};
pub use session::{Session, SessionState};
pub use user::User;
