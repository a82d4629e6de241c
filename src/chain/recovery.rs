use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::chain::confirmation::BlockfrostClient;
use crate::error::AppResult;
use crate::metadata::{self, METADATA_LABEL};

/// A note reassembled from on-chain metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveredNote {
    pub tx_hash: String,
    pub note_id: String,
    pub action: String,
    pub title: String,
    pub content: String,
    pub timestamp: String,
}

/// Walk a wallet's transactions and rebuild every note operation recorded
/// under our metadata label. Transactions without app metadata are skipped;
/// a metadata fetch failure skips that transaction rather than aborting the
/// whole recovery.
pub async fn retrieve_notes(
    client: &BlockfrostClient,
    wallet_address: &str,
) -> AppResult<Vec<RecoveredNote>> {
    info!("Retrieving notes for {}", wallet_address);

    let tx_hashes = client.wallet_transactions(wallet_address).await?;
    let mut notes = Vec::new();

    for tx_hash in tx_hashes {
        let entries = match client.transaction_metadata(&tx_hash).await {
            Ok(Some(entries)) => entries,
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping metadata for {}: {}", tx_hash, e);
                continue;
            }
        };

        if let Some(body) = app_metadata(&entries) {
            notes.push(RecoveredNote {
                tx_hash,
                note_id: field_str(body, "note_id"),
                action: field_str(body, "action"),
                title: metadata::reconstruct_title(body.get("title")),
                content: metadata::reconstruct_content(body.get("content")),
                timestamp: field_str(body, "timestamp"),
            });
        }
    }

    info!("Retrieved {} note(s) from chain", notes.len());
    Ok(notes)
}

/// Select our app's entry from a transaction's metadata list
/// (`[{label, json_metadata}, ..]`).
fn app_metadata(entries: &Value) -> Option<&Value> {
    let label = METADATA_LABEL.to_string();
    entries
        .as_array()?
        .iter()
        .find(|entry| entry.get("label").and_then(Value::as_str) == Some(label.as_str()))
        .and_then(|entry| entry.get("json_metadata"))
}

fn field_str(body: &Value, key: &str) -> String {
    body.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
