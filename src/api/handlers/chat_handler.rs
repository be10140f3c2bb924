use axum::{Json, extract::State, response::IntoResponse};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::chat_dto::*},
    error::AppError,
};

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id 不能为空".to_string()));
    }
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("message 不能为空".to_string()));
    }

    debug!(user_id = %request.user_id, "处理对话请求");

    let result = state
        .chat_service
        .process_message(
            &request.user_id,
            request.session_id.as_deref(),
            &request.message,
        )
        .await;

    match result {
        Ok((session_id, blocks)) => {
            state.metrics.record_turn();
            Ok(Json(ChatResponse { session_id, blocks }))
        }
        Err(err) => {
            if matches!(err, AppError::Agent(_)) {
                state.metrics.record_agent_failure();
            }
            state.metrics.record_error();
            Err(err)
        }
    }
}
