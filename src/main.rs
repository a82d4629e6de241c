mod bootstrap;
mod chain;
mod config;
mod error;
mod metadata;
mod middleware;
mod notes;
mod server;
mod status;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,server=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("🚀 Starting NoteChain backend");

    dotenv::dotenv().ok();
    let config = config::Config::from_env();

    let state = bootstrap::initialize_app_state(&config)?;
    let worker = state.worker.clone();

    let app = server::create_app(state, &config).await;
    server::run_server(app, &config.bind_address, worker).await?;

    Ok(())
}
