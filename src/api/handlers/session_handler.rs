use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::session_dto::SessionResponse},
    error::AppError,
};

pub async fn list_sessions(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!(%external_id, "列出用户会话");

    let user = state.repository.get_or_create_user(&external_id).await?;
    let sessions = state.repository.list_sessions(&user.id).await?;

    let responses: Vec<SessionResponse> = sessions.into_iter().map(SessionResponse::from).collect();
    Ok(Json(responses))
}
