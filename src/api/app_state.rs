use std::sync::Arc;

use crate::observability::AppMetrics;
use crate::services::chat::ChatService;
use crate::storage::repository::ChatRepository;

/// Application state containing all shared services
#[derive(Clone)]
pub struct AppState {
    /// Chat pipeline service
    pub chat_service: Arc<ChatService>,
    /// Persistence backend
    pub repository: Arc<dyn ChatRepository>,
    /// Application metrics
    pub metrics: Arc<AppMetrics>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("chat_service", &"Arc<ChatService>")
            .field("repository", &"Arc<dyn ChatRepository>")
            .field("metrics", &"Arc<AppMetrics>")
            .finish()
    }
}
