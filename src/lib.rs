//! Curator - NFT 市场对话中间件服务
//!
//! 位于终端用户与大模型助手之间的会话层：解析模型输出中的响应标记
//! （会话数据、记忆指令），把它们落到会话状态与用户长期记忆里，并
//! 保证回传用户的文本不含任何内部标记。

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod parser;
pub mod services;
pub mod storage;
