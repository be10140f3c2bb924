//! API 模块
//!
//! 提供 REST API 支持。

pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod routes;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::app_state::AppState;

pub fn create_router(app_state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::chat_routes::create_chat_router())
        .merge(routes::user_routes::create_user_router());

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
