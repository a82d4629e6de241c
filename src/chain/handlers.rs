use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bootstrap::AppState;
use crate::chain::confirmation::{ConfirmationClient, ConfirmationOutcome};
use crate::chain::recovery::{self, RecoveredNote};
use crate::error::{AppError, AppResult};
use crate::metadata;
use crate::middleware::wallet_auth::WalletAddress;
use crate::notes::models::TxOperation;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatusResponse {
    pub tx_hash: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_time: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecoveryResponse {
    pub notes: Vec<RecoveredNote>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxPayloadRequest {
    pub note_id: String,
    pub operation: TxOperation,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// GET /api/chain/transaction/:tx_hash — direct confirmation probe.
pub async fn get_transaction_status(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
) -> AppResult<Json<TransactionStatusResponse>> {
    let outcome = state.chain.check_transaction(&tx_hash).await?;

    let response = match outcome {
        ConfirmationOutcome::Confirmed(details) => TransactionStatusResponse {
            tx_hash,
            status: "confirmed",
            block_height: details.block_height,
            block_time: details.block_time,
        },
        ConfirmationOutcome::NotYetFinal => TransactionStatusResponse {
            tx_hash,
            status: "pending",
            block_height: None,
            block_time: None,
        },
        ConfirmationOutcome::Rejected => TransactionStatusResponse {
            tx_hash,
            status: "failed",
            block_height: None,
            block_time: None,
        },
        ConfirmationOutcome::Indeterminate(_) => TransactionStatusResponse {
            tx_hash,
            status: "unknown",
            block_height: None,
            block_time: None,
        },
    };

    Ok(Json(response))
}

/// POST /api/chain/payload — assemble the unsigned-transaction payload the
/// caller's wallet signs and submits: chunked metadata, recipient (their
/// own address) and the minimum amount.
pub async fn build_tx_payload(
    Extension(WalletAddress(wallet)): Extension<WalletAddress>,
    Json(request): Json<TxPayloadRequest>,
) -> AppResult<Json<Value>> {
    if request.note_id.is_empty() {
        return Err(AppError::Validation("noteId is required".to_string()));
    }

    let payload = metadata::build_tx_payload(
        request.operation,
        &request.note_id,
        &request.title,
        &request.content,
        &wallet,
    );
    Ok(Json(payload))
}

/// POST /api/chain/recover — rebuild the caller's notes from on-chain
/// metadata.
pub async fn recover_notes(
    State(state): State<AppState>,
    Extension(WalletAddress(wallet)): Extension<WalletAddress>,
) -> AppResult<Json<RecoveryResponse>> {
    let notes = recovery::retrieve_notes(&state.chain, &wallet).await?;
    let count = notes.len();
    Ok(Json(RecoveryResponse { notes, count }))
}
