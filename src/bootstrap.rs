use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::chain::{BlockfrostClient, ReconciliationWorker, WorkerConfig};
use crate::config::Config;
use crate::error::AppResult;
use crate::notes::repository::NoteRepository;

#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<NoteRepository>,
    pub chain: Arc<BlockfrostClient>,
    pub worker: Arc<ReconciliationWorker>,
}

/// Wire the repository, the confirmation client, and the reconciliation
/// worker, and start the worker's poll loop.
pub fn initialize_app_state(config: &Config) -> AppResult<AppState> {
    info!("Initializing application components...");

    let notes = Arc::new(NoteRepository::new());
    info!("✅ Note repository initialized");

    let chain = Arc::new(BlockfrostClient::new(
        &config.blockfrost_api_url,
        &config.blockfrost_project_id,
        Duration::from_secs(config.query_timeout_secs),
    )?);
    info!(
        "✅ Confirmation client initialized ({})",
        config.blockfrost_api_url
    );

    let worker_config = WorkerConfig {
        interval: Duration::from_millis(config.worker_interval_ms),
        ..WorkerConfig::default()
    };
    let worker = Arc::new(ReconciliationWorker::new(
        worker_config,
        notes.clone(),
        chain.clone(),
    ));
    worker.start();

    Ok(AppState {
        notes,
        chain,
        worker,
    })
}
