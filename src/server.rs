use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::State,
    middleware,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    bootstrap::AppState,
    chain::handlers::{build_tx_payload, get_transaction_status, recover_notes},
    chain::ReconciliationWorker,
    config::Config,
    middleware::{
        cors::create_cors_layer,
        rate_limit::{rate_limit_middleware, RateLimitLayer},
        wallet_auth::require_wallet_address,
    },
    notes::handlers::{
        create_note, delete_note, get_all_notes, get_archived_notes, get_note, search_notes,
        set_pinned, set_starred, update_note,
    },
    status::handlers::{get_pending_transactions, get_status_stats, update_transaction_status},
};

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "message": "Server is running",
        "worker": {
            "running": state.worker.is_running(),
            "intervalMs": state.worker.interval().as_millis() as u64,
        }
    }))
}

pub async fn create_app(state: AppState, config: &Config) -> Router {
    info!("⚙️ Setting up HTTP routes...");

    // default: 100 requests per minute across the API surface
    let rate_limit = RateLimitLayer::per_minute(NonZeroU32::new(100).expect("nonzero"));

    let notes_routes = Router::new()
        .route("/", post(create_note).get(get_all_notes))
        .route("/search", get(search_notes))
        .route("/archived", get(get_archived_notes))
        .route("/:note_id", get(get_note).put(update_note).delete(delete_note))
        .route("/:note_id/pin", patch(set_pinned))
        .route("/:note_id/star", patch(set_starred))
        .layer(middleware::from_fn(require_wallet_address));

    // used by the worker host and operators; no wallet scoping
    let status_routes = Router::new()
        .route("/pending", get(get_pending_transactions))
        .route("/update", post(update_transaction_status))
        .route("/stats", get(get_status_stats));

    let chain_routes = Router::new()
        .route("/transaction/:tx_hash", get(get_transaction_status))
        .route("/payload", post(build_tx_payload))
        .route("/recover", post(recover_notes))
        .layer(middleware::from_fn(require_wallet_address));

    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api/notes", notes_routes)
        .nest("/api/status", status_routes)
        .nest("/api/chain", chain_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(create_cors_layer(&config.frontend_url))
                .layer(Extension(rate_limit))
                .layer(middleware::from_fn(rate_limit_middleware)),
        )
        .with_state(state);

    info!("✓ HTTP routes configured");
    app
}

pub async fn run_server(
    app: Router,
    bind_address: &str,
    worker: Arc<ReconciliationWorker>,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("🌐 Server listening on: {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    // cooperative worker shutdown before the process exits
    worker.stop();
    Ok(())
}
