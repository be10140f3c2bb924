//! 响应标记协议解析
//!
//! 模型输出是不可信的自由文本，其中内嵌三种带 JSON 负载的控制标记
//! （会话数据、个人信息指令、偏好指令）以及组件块。本模块负责：
//! 提取并剥离标记（marker）、面向用户的净化（sanitizer）、
//! 以及把净化后的文本拆分为内容块（blocks）。
//! 所有解析失败都就地恢复，绝不让一轮对话失败。

pub mod blocks;
pub mod marker;
pub mod sanitizer;

pub use blocks::{parse_blocks, wrap_component, COMPONENT_END, COMPONENT_START};
pub use marker::{extract_and_strip, MarkerKind};
pub use sanitizer::sanitize_for_user;
