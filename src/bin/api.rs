use loan_eligibility_assistant::{
    api::{start_server, ApiState},
    completion::ChatCompletionsClient,
    config::AssistantConfig,
    conversational::FallbackResponder,
    dialogue::DialogueEngine,
    state::InMemorySessionStore,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables (before tracing so RUST_LOG in .env applies)
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AssistantConfig::from_env()?;

    if config.completion.api_key.is_none() {
        warn!("⚠️  GROK_API_KEY not set, off-flow messages will get the default reply");
    }

    info!("🚀 Loan Eligibility Assistant - API Server");
    info!("📍 Port: {}", config.port);

    // Create components
    let completion = Arc::new(ChatCompletionsClient::new(&config.completion)?);
    let fallback = FallbackResponder::new(completion).with_timeout(config.completion.timeout);
    let engine = Arc::new(DialogueEngine::new(fallback));
    let sessions = Arc::new(InMemorySessionStore::new());

    info!("✅ Dialogue engine initialized");
    info!("📡 Starting API server...");

    // Start API server
    start_server(ApiState::new(engine, sessions), config.port).await?;

    Ok(())
}
