use loan_eligibility_assistant::{
    completion::ChatCompletionsClient,
    config::AssistantConfig,
    conversational::FallbackResponder,
    dialogue::{DialogueEngine, RESET_REPLY},
    models::SessionState,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env first so RUST_LOG from it reaches the filter
    dotenv::dotenv().ok();

    // Initialize tracing (stderr keeps the chat on stdout readable)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = AssistantConfig::from_env()?;
    let completion = Arc::new(ChatCompletionsClient::new(&config.completion)?);
    let fallback = FallbackResponder::new(completion).with_timeout(config.completion.timeout);
    let engine = DialogueEngine::new(fallback);

    info!("Loan assistant chat starting");

    println!("{}", RESET_REPLY);
    println!("(type 'reset' to start over, 'exit' to quit)\n");

    let mut state = SessionState::Idle;
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        let outcome = match message.to_lowercase().as_str() {
            "exit" | "quit" => break,
            "reset" => DialogueEngine::reset_session(),
            _ => engine.process_turn(state, message).await,
        };

        state = outcome.state;
        println!("\n{}\n", outcome.reply);
    }

    Ok(())
}
