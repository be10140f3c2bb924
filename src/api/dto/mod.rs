//! API DTO 模块

pub mod chat_dto;
pub mod memory_dto;
pub mod session_dto;
