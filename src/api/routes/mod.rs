//! API 路由模块

pub mod chat_routes;
pub mod user_routes;
