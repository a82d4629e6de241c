use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Reconciliation status shared by notes and their transaction records.
///
/// `Confirmed` and `Failed` are terminal: a record never leaves either
/// state, and re-applying the same terminal transition is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Pending => "pending",
            TxStatus::Confirmed => "confirmed",
            TxStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<TxStatus> {
        match s {
            "pending" => Some(TxStatus::Pending),
            "confirmed" => Some(TxStatus::Confirmed),
            "failed" => Some(TxStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TxStatus::Pending)
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The closed set of mirrored write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxOperation {
    Create,
    Update,
    Delete,
}

impl TxOperation {
    /// Action string written into on-chain metadata.
    pub fn metadata_action(&self) -> &'static str {
        match self {
            TxOperation::Create => "CREATE_NOTE",
            TxOperation::Update => "UPDATE_NOTE",
            TxOperation::Delete => "DELETE_NOTE",
        }
    }
}

/// One mirrored write attempt and its convergence status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub operation: TxOperation,
    pub tx_hash: String,
    pub status: TxStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_time: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    fn new(operation: TxOperation, tx_hash: String) -> Self {
        Self {
            operation,
            tx_hash,
            status: TxStatus::Pending,
            confirmed_at: None,
            block_height: None,
            block_time: None,
            timestamp: Utc::now(),
        }
    }

    /// Transition to `confirmed`. Idempotent when already confirmed;
    /// rejected when the record already failed.
    pub fn mark_confirmed(
        &mut self,
        block_height: Option<u64>,
        block_time: Option<i64>,
    ) -> AppResult<()> {
        match self.status {
            TxStatus::Confirmed => Ok(()),
            TxStatus::Failed => Err(AppError::InvalidTransition {
                current: self.status.to_string(),
                requested: TxStatus::Confirmed.to_string(),
            }),
            TxStatus::Pending => {
                self.status = TxStatus::Confirmed;
                self.confirmed_at = Some(Utc::now());
                self.block_height = block_height;
                self.block_time = block_time;
                Ok(())
            }
        }
    }

    /// Transition to `failed`. Idempotent when already failed; rejected
    /// when the record already confirmed.
    pub fn mark_failed(&mut self) -> AppResult<()> {
        match self.status {
            TxStatus::Failed => Ok(()),
            TxStatus::Confirmed => Err(AppError::InvalidTransition {
                current: self.status.to_string(),
                requested: TxStatus::Failed.to_string(),
            }),
            TxStatus::Pending => {
                self.status = TxStatus::Failed;
                Ok(())
            }
        }
    }

    /// Apply a requested status through the transition rules above.
    /// Requesting `pending` is valid only when the record is still pending.
    pub fn apply_status(
        &mut self,
        status: TxStatus,
        block_height: Option<u64>,
        block_time: Option<i64>,
    ) -> AppResult<()> {
        match status {
            TxStatus::Confirmed => self.mark_confirmed(block_height, block_time),
            TxStatus::Failed => self.mark_failed(),
            TxStatus::Pending => {
                if !self.status.is_terminal() {
                    Ok(())
                } else {
                    Err(AppError::InvalidTransition {
                        current: self.status.to_string(),
                        requested: TxStatus::Pending.to_string(),
                    })
                }
            }
        }
    }
}

/// A user note with its append-only mirror history.
///
/// `status` always equals the status of the latest transaction record;
/// every mutation that touches the history must finish with
/// [`Note::sync_status`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub note_id: String,
    pub title: String,
    pub content: String,
    pub wallet_address: String,
    pub status: TxStatus,
    pub archived: bool,
    pub pinned: bool,
    pub starred: bool,
    pub transaction_history: Vec<TransactionRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Create a note together with its initial `CREATE` record.
    pub fn new(
        note_id: String,
        title: String,
        content: String,
        wallet_address: String,
        tx_hash: &str,
    ) -> AppResult<Self> {
        let now = Utc::now();
        let mut note = Self {
            id: Uuid::new_v4(),
            note_id,
            title,
            content,
            wallet_address,
            status: TxStatus::Pending,
            archived: false,
            pinned: false,
            starred: false,
            transaction_history: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        note.append_transaction(TxOperation::Create, tx_hash)?;
        Ok(note)
    }

    /// Append one mirror record and reset the note to `pending`. The only
    /// state-creating operation on the history.
    pub fn append_transaction(&mut self, operation: TxOperation, tx_hash: &str) -> AppResult<()> {
        if tx_hash.is_empty() {
            return Err(AppError::Validation(
                "transaction hash must not be empty".to_string(),
            ));
        }
        self.transaction_history
            .push(TransactionRecord::new(operation, tx_hash.to_string()));
        self.status = TxStatus::Pending;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn latest_transaction(&self) -> Option<&TransactionRecord> {
        self.transaction_history.last()
    }

    pub fn latest_transaction_mut(&mut self) -> Option<&mut TransactionRecord> {
        self.transaction_history.last_mut()
    }

    /// Recompute the overall status from the latest record.
    pub fn sync_status(&mut self) {
        if let Some(last) = self.transaction_history.last() {
            self.status = last.status;
        }
    }
}
