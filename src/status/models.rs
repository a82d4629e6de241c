use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notes::models::{Note, TxOperation};
use crate::notes::repository::StatusStats;

/// One pending mirror write, as seen by the status surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    pub note_id: String,
    pub wallet_address: String,
    pub tx_hash: String,
    pub operation: TxOperation,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingResponse {
    pub pending_transactions: Vec<PendingTransaction>,
    pub count: usize,
}

/// Both fields are checked by the handler so their absence is a 400, not a
/// deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub tx_hash: Option<String>,
    pub status: Option<String>,
    pub block_height: Option<u64>,
    pub block_time: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UpdateStatusResponse {
    pub note: Note,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: StatusStats,
    pub total: usize,
}
