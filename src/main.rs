use curator::agent::create_agent;
use curator::api::{self, app_state::AppState};
use curator::config::loader::ConfigLoader;
use curator::observability::{ObservabilityState, create_observability_router, init_tracing};
use curator::services::create_chat_service;
use curator::storage::create_repository;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("curator");

    info!("Starting Curator...");

    let config = ConfigLoader::load()?;
    ConfigLoader::validate(&config)?;
    info!("Configuration loaded successfully");

    let repository = create_repository(&config.database)?;
    info!("Repository initialized (backend: {})", config.database.backend);

    let agent = create_agent(&config.agent)?;
    info!("Agent runtime initialized (model: {})", config.agent.model);

    let chat_service = create_chat_service(repository.clone(), agent);
    info!("Chat service initialized");

    let observability_state = Arc::new(ObservabilityState::new(
        env!("CARGO_PKG_VERSION").to_string(),
    ));
    let app_state = AppState {
        chat_service,
        repository,
        metrics: observability_state.metrics.clone(),
    };

    let api_router = api::create_router(app_state);
    let router = create_observability_router(observability_state).merge(api_router);
    info!("API router created with observability endpoints");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
