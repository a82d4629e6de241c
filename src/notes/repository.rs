use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::notes::models::{Note, TxOperation, TxStatus};

/// Counts of notes grouped by reconciliation status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusStats {
    pub pending: usize,
    pub confirmed: usize,
    pub failed: usize,
}

impl StatusStats {
    pub fn total(&self) -> usize {
        self.pending + self.confirmed + self.failed
    }
}

/// In-memory note store, keyed by the caller-visible note id.
pub struct NoteRepository {
    notes: RwLock<HashMap<String, Note>>,
}

impl NoteRepository {
    pub fn new() -> Self {
        Self {
            notes: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_note(&self, note: Note) -> AppResult<Note> {
        let mut notes = self.notes.write().await;
        if notes.contains_key(&note.note_id) {
            return Err(AppError::Conflict(format!(
                "Note id {} already exists",
                note.note_id
            )));
        }
        notes.insert(note.note_id.clone(), note.clone());
        Ok(note)
    }

    /// Single note lookup, scoped to the owning wallet, archived excluded.
    pub async fn get_note(&self, note_id: &str, wallet_address: &str) -> AppResult<Note> {
        let notes = self.notes.read().await;
        notes
            .get(note_id)
            .filter(|n| n.wallet_address == wallet_address && !n.archived)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Note {} not found", note_id)))
    }

    /// All non-archived notes, newest first.
    pub async fn list_notes(&self) -> Vec<Note> {
        let notes = self.notes.read().await;
        let mut active: Vec<Note> = notes.values().filter(|n| !n.archived).cloned().collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        active
    }

    /// Archived notes, most recently touched first.
    pub async fn list_archived(&self) -> Vec<Note> {
        let notes = self.notes.read().await;
        let mut archived: Vec<Note> = notes.values().filter(|n| n.archived).cloned().collect();
        archived.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        archived
    }

    /// Case-insensitive title/content search within one wallet's notes.
    pub async fn search_notes(&self, wallet_address: &str, query: &str) -> Vec<Note> {
        let needle = query.to_lowercase();
        let notes = self.notes.read().await;
        let mut found: Vec<Note> = notes
            .values()
            .filter(|n| {
                n.wallet_address == wallet_address
                    && !n.archived
                    && (n.title.to_lowercase().contains(&needle)
                        || n.content.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }

    /// Apply new title/content and append the `UPDATE` mirror record.
    pub async fn update_note(
        &self,
        note_id: &str,
        wallet_address: &str,
        title: Option<String>,
        content: Option<String>,
        tx_hash: &str,
    ) -> AppResult<Note> {
        let mut notes = self.notes.write().await;
        let note = Self::find_owned_mut(&mut notes, note_id, wallet_address)?;

        if let Some(title) = title {
            note.title = title;
        }
        if let Some(content) = content {
            note.content = content;
        }
        note.append_transaction(TxOperation::Update, tx_hash)?;
        Ok(note.clone())
    }

    /// Archive the note and append the `DELETE` mirror record.
    pub async fn archive_note(
        &self,
        note_id: &str,
        wallet_address: &str,
        tx_hash: &str,
    ) -> AppResult<Note> {
        let mut notes = self.notes.write().await;
        let note = Self::find_owned_mut(&mut notes, note_id, wallet_address)?;

        note.append_transaction(TxOperation::Delete, tx_hash)?;
        note.archived = true;
        Ok(note.clone())
    }

    /// Local-only flag flip. Never appends a record, never touches status.
    pub async fn set_pinned(
        &self,
        note_id: &str,
        wallet_address: &str,
        pinned: bool,
    ) -> AppResult<Note> {
        let mut notes = self.notes.write().await;
        let note = Self::find_owned_mut(&mut notes, note_id, wallet_address)?;
        note.pinned = pinned;
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    /// Local-only flag flip. Never appends a record, never touches status.
    pub async fn set_starred(
        &self,
        note_id: &str,
        wallet_address: &str,
        starred: bool,
    ) -> AppResult<Note> {
        let mut notes = self.notes.write().await;
        let note = Self::find_owned_mut(&mut notes, note_id, wallet_address)?;
        note.starred = starred;
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    /// Notes whose overall status is `pending`, up to `limit`. Order is
    /// arbitrary; every cycle re-scans the full set so nothing starves.
    pub async fn find_pending(&self, limit: usize) -> Vec<Note> {
        let notes = self.notes.read().await;
        notes
            .values()
            .filter(|n| n.status == TxStatus::Pending)
            .take(limit)
            .cloned()
            .collect()
    }

    /// The single transition entry point shared by the reconciliation
    /// worker and the status surface: locate the record carrying `tx_hash`
    /// (references are not indexed, so this scans) and move it through the
    /// monotone state machine. The owning note's overall status is resynced
    /// from its latest record.
    pub async fn apply_status_by_hash(
        &self,
        tx_hash: &str,
        status: TxStatus,
        block_height: Option<u64>,
        block_time: Option<i64>,
    ) -> AppResult<Note> {
        let mut notes = self.notes.write().await;
        let note = notes
            .values_mut()
            .find(|n| n.transaction_history.iter().any(|tx| tx.tx_hash == tx_hash))
            .ok_or_else(|| {
                AppError::NotFound(format!("No note carries transaction {}", tx_hash))
            })?;

        let record = note
            .transaction_history
            .iter_mut()
            .find(|tx| tx.tx_hash == tx_hash)
            .ok_or_else(|| AppError::Internal("record vanished during scan".to_string()))?;

        record.apply_status(status, block_height, block_time)?;
        note.sync_status();
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    /// Counts grouped by overall note status.
    pub async fn stats(&self) -> StatusStats {
        let notes = self.notes.read().await;
        let mut stats = StatusStats::default();
        for note in notes.values() {
            match note.status {
                TxStatus::Pending => stats.pending += 1,
                TxStatus::Confirmed => stats.confirmed += 1,
                TxStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }

    fn find_owned_mut<'a>(
        notes: &'a mut HashMap<String, Note>,
        note_id: &str,
        wallet_address: &str,
    ) -> AppResult<&'a mut Note> {
        notes
            .get_mut(note_id)
            .filter(|n| n.wallet_address == wallet_address && !n.archived)
            .ok_or_else(|| AppError::NotFound(format!("Note {} not found", note_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "addr1qtest";

    fn tx(c: char) -> String {
        std::iter::repeat(c).take(64).collect()
    }

    async fn seeded_repo() -> NoteRepository {
        let repo = NoteRepository::new();
        let note = Note::new(
            "note-1".to_string(),
            "First".to_string(),
            "hello world".to_string(),
            WALLET.to_string(),
            &tx('a'),
        )
        .unwrap();
        repo.create_note(note).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn duplicate_note_id_is_a_conflict() {
        let repo = seeded_repo().await;
        let dup = Note::new(
            "note-1".to_string(),
            "Other".to_string(),
            "text".to_string(),
            WALLET.to_string(),
            &tx('b'),
        )
        .unwrap();
        let err = repo.create_note(dup).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_appends_record_and_resets_status() {
        let repo = seeded_repo().await;
        repo.apply_status_by_hash(&tx('a'), TxStatus::Confirmed, Some(5), None)
            .await
            .unwrap();

        let note = repo
            .update_note("note-1", WALLET, Some("New".into()), None, &tx('b'))
            .await
            .unwrap();
        assert_eq!(note.title, "New");
        assert_eq!(note.content, "hello world");
        assert_eq!(note.status, TxStatus::Pending);
        assert_eq!(note.transaction_history.len(), 2);
    }

    #[tokio::test]
    async fn archive_hides_note_from_active_lookups() {
        let repo = seeded_repo().await;
        repo.archive_note("note-1", WALLET, &tx('b')).await.unwrap();

        assert!(repo.get_note("note-1", WALLET).await.is_err());
        assert!(repo.list_notes().await.is_empty());
        assert_eq!(repo.list_archived().await.len(), 1);
        // the DELETE record still reconciles
        assert_eq!(repo.find_pending(50).await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_reference_is_not_found() {
        let repo = seeded_repo().await;
        let err = repo
            .apply_status_by_hash("zzz", TxStatus::Confirmed, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn apply_status_syncs_note_with_latest_record() {
        let repo = seeded_repo().await;
        let note = repo
            .apply_status_by_hash(&tx('a'), TxStatus::Confirmed, Some(100), Some(1_700_000_000))
            .await
            .unwrap();
        assert_eq!(note.status, TxStatus::Confirmed);
        let record = note.latest_transaction().unwrap();
        assert_eq!(record.block_height, Some(100));
        assert!(record.confirmed_at.is_some());
    }

    #[tokio::test]
    async fn confirming_an_old_record_keeps_overall_status_on_frontier() {
        let repo = seeded_repo().await;
        repo.update_note("note-1", WALLET, None, None, &tx('b'))
            .await
            .unwrap();

        // the earlier CREATE confirms late; the latest record is still pending
        let note = repo
            .apply_status_by_hash(&tx('a'), TxStatus::Confirmed, None, None)
            .await
            .unwrap();
        assert_eq!(note.status, TxStatus::Pending);
    }

    #[tokio::test]
    async fn pin_and_star_never_touch_reconciliation() {
        let repo = seeded_repo().await;
        let note = repo.set_pinned("note-1", WALLET, true).await.unwrap();
        assert!(note.pinned);
        let note = repo.set_starred("note-1", WALLET, true).await.unwrap();
        assert!(note.starred);
        assert_eq!(note.transaction_history.len(), 1);
        assert_eq!(note.status, TxStatus::Pending);
    }

    #[tokio::test]
    async fn search_is_scoped_and_case_insensitive() {
        let repo = seeded_repo().await;
        assert_eq!(repo.search_notes(WALLET, "HELLO").await.len(), 1);
        assert!(repo.search_notes(WALLET, "missing").await.is_empty());
        assert!(repo.search_notes("addr1other", "hello").await.is_empty());
    }

    #[tokio::test]
    async fn stats_group_by_overall_status() {
        let repo = seeded_repo().await;
        let second = Note::new(
            "note-2".to_string(),
            "Second".to_string(),
            "text".to_string(),
            WALLET.to_string(),
            &tx('c'),
        )
        .unwrap();
        repo.create_note(second).await.unwrap();
        repo.apply_status_by_hash(&tx('c'), TxStatus::Failed, None, None)
            .await
            .unwrap();

        let stats = repo.stats().await;
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.confirmed, 0);
        assert_eq!(stats.total(), 2);
    }
}
