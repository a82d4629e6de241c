use axum::{extract::State, Json};
use tracing::info;

use crate::bootstrap::AppState;
use crate::error::{AppError, AppResult};
use crate::notes::models::TxStatus;
use crate::status::models::{
    PendingResponse, PendingTransaction, StatsResponse, UpdateStatusRequest, UpdateStatusResponse,
};

/// GET /api/status/pending
///
/// Projection of every note awaiting confirmation, one entry per latest
/// record. Notes without a discoverable reference are excluded.
pub async fn get_pending_transactions(State(state): State<AppState>) -> Json<PendingResponse> {
    let pending = state.notes.find_pending(usize::MAX).await;

    let pending_transactions: Vec<PendingTransaction> = pending
        .iter()
        .filter_map(|note| {
            let record = note.latest_transaction()?;
            Some(PendingTransaction {
                note_id: note.note_id.clone(),
                wallet_address: note.wallet_address.clone(),
                tx_hash: record.tx_hash.clone(),
                operation: record.operation,
                timestamp: record.timestamp,
            })
        })
        .collect();

    let count = pending_transactions.len();
    Json(PendingResponse {
        pending_transactions,
        count,
    })
}

/// POST /api/status/update
///
/// Push one status transition by reference. Funnels through the same
/// idempotent transition as the reconciliation worker, so the two can run
/// concurrently.
pub async fn update_transaction_status(
    State(state): State<AppState>,
    Json(request): Json<UpdateStatusRequest>,
) -> AppResult<Json<UpdateStatusResponse>> {
    let (tx_hash, requested) = match (&request.tx_hash, &request.status) {
        (Some(tx_hash), Some(status)) if !tx_hash.is_empty() => (tx_hash, status),
        _ => {
            return Err(AppError::Validation(
                "txHash and status are required".to_string(),
            ))
        }
    };
    let status = TxStatus::parse(requested)
        .ok_or_else(|| AppError::Validation(format!("Invalid status: {}", requested)))?;

    let note = state
        .notes
        .apply_status_by_hash(tx_hash, status, request.block_height, request.block_time)
        .await?;

    info!("Transaction {}: {}", status, tx_hash);

    Ok(Json(UpdateStatusResponse {
        note,
        message: format!("Transaction status updated to {}", status),
    }))
}

/// GET /api/status/stats
pub async fn get_status_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.notes.stats().await;
    Json(StatsResponse {
        total: stats.total(),
        stats,
    })
}
