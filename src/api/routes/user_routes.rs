//! 用户资源路由
//!
//! 会话列表与长期记忆都挂在用户外部标识之下。

use axum::{
    Router,
    routing::{delete, get},
};

use crate::api::app_state::AppState;
use crate::api::handlers::memory_handler::{delete_memory, list_memories};
use crate::api::handlers::session_handler::list_sessions;

/// 创建用户资源路由器
pub fn create_user_router() -> Router<AppState> {
    Router::new()
        .route("/users/:external_id/sessions", get(list_sessions))
        .route("/users/:external_id/memories", get(list_memories))
        .route("/users/:external_id/memories/:key", delete(delete_memory))
}
