use std::sync::Arc;

use lynn_coach::coach::{CoachRouteState, coach_routes};
use lynn_coach::config::{CoachConfig, KnowledgeSource};
use lynn_coach::llm::GeminiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // A missing API key is fatal before anything is served
    let config = CoachConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export GOOGLE_API_KEY=...");
        std::process::exit(1);
    });

    eprintln!("⭐ {} v{}", config.options.persona, env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   API: http://0.0.0.0:{}/api/sessions", config.port);
    match &config.options.knowledge_source {
        KnowledgeSource::Uploads => eprintln!("   Knowledge: uploads"),
        KnowledgeSource::LocalFolder(dir) => {
            eprintln!("   Knowledge: folder {}", dir.display())
        }
    }

    let model = Arc::new(GeminiClient::new(config.api_key.clone(), config.model.clone())?);
    let state = CoachRouteState::new(model, config.options.clone());
    let app = coach_routes(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Coach API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
