use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{
        app_state::AppState,
        dto::memory_dto::{DeleteMemoryResponse, MemoryResponse},
    },
    error::AppError,
};

pub async fn list_memories(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!(%external_id, "列出用户记忆");

    let user = state.repository.get_or_create_user(&external_id).await?;
    let records = state.repository.list_memories(&user.id).await?;

    let responses: Vec<MemoryResponse> = records.into_iter().map(MemoryResponse::from).collect();
    Ok(Json(responses))
}

pub async fn delete_memory(
    State(state): State<AppState>,
    Path((external_id, key)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    debug!(%external_id, %key, "删除用户记忆");

    let user = state.repository.get_or_create_user(&external_id).await?;
    let deleted = state.repository.delete_memory(&user.id, &key).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("记忆不存在: {key}")));
    }

    Ok(Json(DeleteMemoryResponse { deleted }))
}
