//! On-chain metadata construction for note operations.
//!
//! Notes are mirrored to the ledger as transaction metadata under label
//! 42819 (not reserved, safe for custom apps). Title and content are split
//! into 64-byte chunks by the codec; title continuations carry `T*` frame
//! labels, content keeps the historical plain chunk list.

pub mod codec;

use chrono::Utc;
use serde_json::{json, Value};

use crate::notes::models::TxOperation;

/// Metadata label registered for note operations.
pub const METADATA_LABEL: u64 = 42819;

/// Cardano metadata string limit, in bytes.
pub const METADATA_STRING_LIMIT: usize = 64;

/// Minimum transaction amount: 1 ADA in lovelace.
pub const MIN_TX_LOVELACE: u64 = 1_000_000;

const TITLE_TAG: char = 'T';

/// Build the metadata payload for one note operation, keyed by
/// [`METADATA_LABEL`]. Delete operations carry no title/content.
pub fn build_note_metadata(
    operation: TxOperation,
    note_id: &str,
    title: &str,
    content: &str,
) -> Value {
    let mut body = json!({
        "action": operation.metadata_action(),
        "note_id": note_id,
        "timestamp": Utc::now().to_rfc3339(),
    });

    if operation != TxOperation::Delete {
        body["title"] = format_title(title);
        body["content"] = format_content(content);
    }

    let mut wrapper = serde_json::Map::new();
    wrapper.insert(METADATA_LABEL.to_string(), body);
    Value::Object(wrapper)
}

/// Everything a wallet needs to assemble and sign the mirror transaction:
/// metadata, recipient (the caller's own address) and the minimum amount.
pub fn build_tx_payload(
    operation: TxOperation,
    note_id: &str,
    title: &str,
    content: &str,
    wallet_address: &str,
) -> Value {
    json!({
        "operation": operation.metadata_action(),
        "metadata": build_note_metadata(operation, note_id, title, content),
        "recipient": wallet_address,
        "amount": MIN_TX_LOVELACE.to_string(),
        "noteId": note_id,
    })
}

/// Titles use labeled frames (`T1:`, `T2:` continuations) so a flattened
/// metadata map still reassembles unambiguously.
fn format_title(text: &str) -> Value {
    let frames = codec::encode_labeled(text, METADATA_STRING_LIMIT, TITLE_TAG);
    wrap_chunks(frames)
}

/// Content keeps the historical shape: plain 64-byte chunks, joined in
/// order on read.
fn format_content(text: &str) -> Value {
    let chunks = codec::encode(text, METADATA_STRING_LIMIT);
    wrap_chunks(chunks)
}

fn wrap_chunks(chunks: Vec<String>) -> Value {
    match chunks.len() {
        0 => Value::String(String::new()),
        1 => Value::String(chunks.into_iter().next().unwrap_or_default()),
        _ => Value::Array(chunks.into_iter().map(Value::String).collect()),
    }
}

/// Rebuild a stored title field from either shape.
pub fn reconstruct_title(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => {
            let frames: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
            codec::decode_labeled(&frames, TITLE_TAG)
        }
        _ => String::new(),
    }
}

/// Rebuild a stored content field: a plain string, or chunks joined in
/// order.
pub fn reconstruct_content(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => {
            let chunks: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
            codec::decode(&chunks)
        }
        _ => String::new(),
    }
}

/// Validate a Cardano transaction hash: 64 hex characters.
pub fn is_valid_tx_hash(hash: &str) -> bool {
    hash.len() == 64 && hash.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate a Cardano wallet address by bech32 prefix.
pub fn is_valid_wallet_address(address: &str) -> bool {
    const VALID_PREFIXES: [&str; 3] = ["addr1", "addr_test", "addr_vkh"];
    VALID_PREFIXES.iter().any(|p| address.starts_with(p))
}
