use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

/// Confirmation details returned by the indexer for a finalized
/// transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TxDetails {
    pub block_height: Option<u64>,
    pub block_time: Option<i64>,
}

/// Single-shot answer for one reference id.
///
/// `Indeterminate` is not an error: the caller leaves the record pending
/// and asks again on the next cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// The transaction is on-ledger and final.
    Confirmed(TxDetails),
    /// Not indexed yet. Expected and common while a transaction settles.
    NotYetFinal,
    /// The indexer rejected the reference outright; a definitive failure.
    Rejected,
    /// Timeout, server error, or transport failure. Try again later.
    Indeterminate(String),
}

/// Boundary to the external ledger-indexing service. One query, no retry
/// or backoff; cadence belongs to the reconciliation worker.
#[async_trait]
pub trait ConfirmationClient: Send + Sync {
    async fn check_transaction(&self, reference: &str) -> AppResult<ConfirmationOutcome>;
}

/// Blockfrost-backed implementation.
pub struct BlockfrostClient {
    client: Client,
    base_url: String,
    project_id: String,
}

impl BlockfrostClient {
    /// `timeout` bounds every request so one hung call cannot stall a
    /// worker batch.
    pub fn new(base_url: &str, project_id: &str, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
        })
    }

    /// Fetch the metadata list attached to a transaction, if any.
    pub async fn transaction_metadata(
        &self,
        tx_hash: &str,
    ) -> AppResult<Option<serde_json::Value>> {
        let url = format!("{}/txs/{}/metadata", self.base_url, tx_hash);
        let response = self
            .client
            .get(&url)
            .header("project_id", &self.project_id)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(Some(response.json().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(AppError::External(format!(
                "Metadata fetch for {} returned {}",
                tx_hash, status
            ))),
        }
    }

    /// Transaction hashes seen for a wallet address, newest first.
    pub async fn wallet_transactions(&self, wallet_address: &str) -> AppResult<Vec<String>> {
        #[derive(Deserialize)]
        struct AddressTx {
            tx_hash: String,
        }

        let url = format!("{}/addresses/{}/transactions", self.base_url, wallet_address);
        let response = self
            .client
            .get(&url)
            .header("project_id", &self.project_id)
            .query(&[("order", "desc"), ("count", "100")])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let txs: Vec<AddressTx> = response.json().await?;
                Ok(txs.into_iter().map(|t| t.tx_hash).collect())
            }
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status => Err(AppError::External(format!(
                "Address transaction listing returned {}",
                status
            ))),
        }
    }
}

/// Outcome for a non-200 indexer response. 404 means "not indexed yet",
/// 400 means the reference itself is bad; everything else is inconclusive.
fn outcome_for_status(status: StatusCode) -> ConfirmationOutcome {
    match status {
        StatusCode::NOT_FOUND => ConfirmationOutcome::NotYetFinal,
        StatusCode::BAD_REQUEST => ConfirmationOutcome::Rejected,
        status => ConfirmationOutcome::Indeterminate(format!("unexpected status {}", status)),
    }
}

#[async_trait]
impl ConfirmationClient for BlockfrostClient {
    async fn check_transaction(&self, reference: &str) -> AppResult<ConfirmationOutcome> {
        let url = format!("{}/txs/{}", self.base_url, reference);
        let response = match self
            .client
            .get(&url)
            .header("project_id", &self.project_id)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Transaction lookup for {} did not complete: {}", reference, e);
                return Ok(ConfirmationOutcome::Indeterminate(e.to_string()));
            }
        };

        if response.status() == StatusCode::OK {
            let details: TxDetails = match response.json().await {
                Ok(details) => details,
                Err(e) => {
                    return Ok(ConfirmationOutcome::Indeterminate(format!(
                        "unreadable response body: {}",
                        e
                    )))
                }
            };
            debug!("Transaction confirmed: {}", reference);
            return Ok(ConfirmationOutcome::Confirmed(details));
        }

        Ok(outcome_for_status(response.status()))
    }
}
