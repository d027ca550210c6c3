use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use turing_test::{llm::LlmConfig, state::AppState};

fn default_bind_addr() -> SocketAddr {
    ([0, 0, 0, 0], 8501).into()
}

fn bind_addr() -> SocketAddr {
    match std::env::var("BIND_ADDR") {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().unwrap_or_else(|e| {
            let default = default_bind_addr();
            tracing::warn!("Invalid BIND_ADDR {:?} ({}), using {}", raw, e, default);
            default
        }),
        _ => default_bind_addr(),
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turing_test=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Turing Test Challenge...");

    let llm_config = LlmConfig::from_env();
    tracing::info!(
        "Providers: Gemini at {}, OpenAI at {}",
        llm_config.gemini_base_url,
        llm_config.openai_base_url
    );

    let state = Arc::new(AppState::from_config(llm_config));
    tracing::info!("Loaded {} questions", state.questions.len());

    let app = turing_test::router(state);

    let addr = bind_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
