//! 助手运行时模块

pub mod instructions;
pub mod llm;

pub use instructions::BASE_INSTRUCTIONS;
pub use llm::{AgentRuntime, OpenAiCompatAgent, create_agent};
