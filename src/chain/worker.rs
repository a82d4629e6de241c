use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::chain::confirmation::{ConfirmationClient, ConfirmationOutcome};
use crate::notes::models::TxStatus;
use crate::notes::repository::NoteRepository;

/// Reconciliation worker tuning.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Time between poll cycles.
    pub interval: Duration,
    /// Maximum notes examined per cycle.
    pub batch_limit: usize,
    /// Self-throttle between indexer queries within one cycle.
    pub item_delay: Duration,
    /// Upper bound on a single confirmation query.
    pub query_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(20),
            batch_limit: 50,
            item_delay: Duration::from_millis(500),
            query_timeout: Duration::from_secs(10),
        }
    }
}

/// Per-cycle outcome counts, logged for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub confirmed: usize,
    pub still_pending: usize,
    pub failed: usize,
}

enum ItemOutcome {
    Confirmed,
    StillPending,
    Failed,
}

struct RunningTask {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

/// The only writer that advances transaction records out of `pending`.
///
/// An explicit owned resource: whoever hosts the process constructs one,
/// injects the repository and a confirmation client, and calls
/// [`start`](Self::start)/[`stop`](Self::stop). All reconciliation state
/// lives in the notes themselves, so a restarted worker picks up exactly
/// where the previous one left off.
pub struct ReconciliationWorker {
    config: WorkerConfig,
    notes: Arc<NoteRepository>,
    client: Arc<dyn ConfirmationClient>,
    running: Mutex<Option<RunningTask>>,
}

impl ReconciliationWorker {
    pub fn new(
        config: WorkerConfig,
        notes: Arc<NoteRepository>,
        client: Arc<dyn ConfirmationClient>,
    ) -> Self {
        Self {
            config,
            notes,
            client,
            running: Mutex::new(None),
        }
    }

    /// Spawn the poll loop. Calling `start` while already running is a
    /// warning-level no-op.
    pub fn start(self: &Arc<Self>) {
        let mut running = self.running.lock();
        if running.is_some() {
            warn!("Reconciliation worker already running");
            return;
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let worker = Arc::clone(self);

        let handle = tokio::spawn(async move {
            // first tick fires immediately, then every interval
            let mut ticker = interval(worker.config.interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        worker.run_cycle().await;
                    }
                    _ = shutdown_rx.changed() => {
                        info!("Reconciliation worker stopped");
                        break;
                    }
                }
            }
        });

        info!(
            "Reconciliation worker started (interval: {}s, batch: {})",
            self.config.interval.as_secs(),
            self.config.batch_limit
        );
        *running = Some(RunningTask { handle, shutdown });
    }

    /// Cooperative shutdown. Safe to call when already stopped.
    pub fn stop(&self) {
        let mut running = self.running.lock();
        match running.take() {
            Some(task) => {
                // the loop observes the watch change and exits on its own;
                // the detached handle is simply dropped
                let _ = task.shutdown.send(true);
            }
            None => debug!("Reconciliation worker already stopped"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .map_or(false, |task| !task.handle.is_finished())
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    /// One full scan of the pending set. Public so tests can drive cycles
    /// without a ticker.
    pub async fn run_cycle(&self) -> CycleSummary {
        let pending = self.notes.find_pending(self.config.batch_limit).await;
        let mut summary = CycleSummary::default();

        if pending.is_empty() {
            debug!("No pending transactions");
            return summary;
        }

        info!("Found {} pending transaction(s)", pending.len());

        for (i, note) in pending.iter().enumerate() {
            // only the entity's current frontier is reconciled
            let record = match note.latest_transaction() {
                Some(record) if record.status == TxStatus::Pending => record.clone(),
                _ => continue,
            };

            match self.reconcile_one(&record.tx_hash).await {
                ItemOutcome::Confirmed => summary.confirmed += 1,
                ItemOutcome::StillPending => summary.still_pending += 1,
                ItemOutcome::Failed => summary.failed += 1,
            }

            // respect the indexer's request budget
            if i + 1 < pending.len() && !self.config.item_delay.is_zero() {
                sleep(self.config.item_delay).await;
            }
        }

        info!(
            "Cycle summary: {} confirmed, {} pending, {} failed",
            summary.confirmed, summary.still_pending, summary.failed
        );
        summary
    }

    /// Query and transition a single reference. Every failure is contained
    /// here; nothing propagates past the current item.
    async fn reconcile_one(&self, tx_hash: &str) -> ItemOutcome {
        let outcome = match timeout(
            self.config.query_timeout,
            self.client.check_transaction(tx_hash),
        )
        .await
        {
            Err(_) => {
                warn!("Confirmation query timed out: {}", tx_hash);
                return ItemOutcome::StillPending;
            }
            Ok(Err(e)) => {
                error!("Confirmation query error for {}: {}", tx_hash, e);
                return ItemOutcome::StillPending;
            }
            Ok(Ok(outcome)) => outcome,
        };

        match outcome {
            ConfirmationOutcome::Confirmed(details) => {
                match self
                    .notes
                    .apply_status_by_hash(
                        tx_hash,
                        TxStatus::Confirmed,
                        details.block_height,
                        details.block_time,
                    )
                    .await
                {
                    Ok(_) => {
                        info!("Confirmed: {}", tx_hash);
                        ItemOutcome::Confirmed
                    }
                    Err(e) => {
                        error!("Failed to persist confirmation for {}: {}", tx_hash, e);
                        ItemOutcome::StillPending
                    }
                }
            }
            ConfirmationOutcome::Rejected => {
                match self
                    .notes
                    .apply_status_by_hash(tx_hash, TxStatus::Failed, None, None)
                    .await
                {
                    Ok(_) => {
                        warn!("Rejected by indexer: {}", tx_hash);
                        ItemOutcome::Failed
                    }
                    Err(e) => {
                        error!("Failed to persist rejection for {}: {}", tx_hash, e);
                        ItemOutcome::StillPending
                    }
                }
            }
            ConfirmationOutcome::NotYetFinal => {
                debug!("Still pending: {}", tx_hash);
                ItemOutcome::StillPending
            }
            ConfirmationOutcome::Indeterminate(reason) => {
                warn!("Indeterminate check for {}: {}", tx_hash, reason);
                ItemOutcome::StillPending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::confirmation::TxDetails;
    use crate::error::{AppError, AppResult};
    use crate::notes::models::Note;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Scripted confirmation client: consumes one canned response per call
    /// for each reference, repeating the last one when exhausted.
    struct MockClient {
        responses: parking_lot::Mutex<HashMap<String, Vec<AppResult<ConfirmationOutcome>>>>,
    }

    impl MockClient {
        fn new() -> Self {
            Self {
                responses: parking_lot::Mutex::new(HashMap::new()),
            }
        }

        fn script(self, reference: &str, outcomes: Vec<AppResult<ConfirmationOutcome>>) -> Self {
            self.responses
                .lock()
                .insert(reference.to_string(), outcomes);
            self
        }
    }

    #[async_trait]
    impl ConfirmationClient for MockClient {
        async fn check_transaction(&self, reference: &str) -> AppResult<ConfirmationOutcome> {
            let mut responses = self.responses.lock();
            match responses.get_mut(reference) {
                Some(outcomes) if outcomes.len() > 1 => outcomes.remove(0),
                Some(outcomes) => clone_result(outcomes.first()),
                None => Ok(ConfirmationOutcome::NotYetFinal),
            }
        }
    }

    fn clone_result(
        result: Option<&AppResult<ConfirmationOutcome>>,
    ) -> AppResult<ConfirmationOutcome> {
        match result {
            Some(Ok(outcome)) => Ok(outcome.clone()),
            Some(Err(_)) => Err(AppError::External("scripted failure".to_string())),
            None => Ok(ConfirmationOutcome::NotYetFinal),
        }
    }

    fn tx(c: char) -> String {
        std::iter::repeat(c).take(64).collect()
    }

    fn test_config() -> WorkerConfig {
        WorkerConfig {
            interval: Duration::from_secs(3600),
            batch_limit: 50,
            item_delay: Duration::ZERO,
            query_timeout: Duration::from_secs(1),
        }
    }

    async fn repo_with(notes: &[(&str, char)]) -> Arc<NoteRepository> {
        let repo = Arc::new(NoteRepository::new());
        for (note_id, hash_char) in notes {
            let note = Note::new(
                note_id.to_string(),
                "title".to_string(),
                "content".to_string(),
                "addr1qtest".to_string(),
                &tx(*hash_char),
            )
            .unwrap();
            repo.create_note(note).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn confirmed_transaction_settles_in_one_cycle() {
        let repo = repo_with(&[("note-1", 'a')]).await;
        let client = Arc::new(MockClient::new().script(
            &tx('a'),
            vec![Ok(ConfirmationOutcome::Confirmed(TxDetails {
                block_height: Some(88),
                block_time: Some(1_700_000_000),
            }))],
        ));
        let worker = ReconciliationWorker::new(test_config(), repo.clone(), client);

        let summary = worker.run_cycle().await;
        assert_eq!(summary.confirmed, 1);

        let note = repo.get_note("note-1", "addr1qtest").await.unwrap();
        assert_eq!(note.status, TxStatus::Confirmed);
        let record = note.latest_transaction().unwrap();
        assert_eq!(record.status, TxStatus::Confirmed);
        assert!(record.confirmed_at.is_some());
        assert_eq!(record.block_height, Some(88));

        // nothing left to scan
        let summary = worker.run_cycle().await;
        assert_eq!(summary, CycleSummary::default());
    }

    #[tokio::test]
    async fn not_yet_final_leaves_record_pending_across_cycles() {
        let repo = repo_with(&[("note-1", 'b')]).await;
        let client = Arc::new(MockClient::new().script(
            &tx('b'),
            vec![
                Ok(ConfirmationOutcome::NotYetFinal),
                Ok(ConfirmationOutcome::NotYetFinal),
            ],
        ));
        let worker = ReconciliationWorker::new(test_config(), repo.clone(), client);

        for _ in 0..2 {
            let summary = worker.run_cycle().await;
            assert_eq!(summary.still_pending, 1);
            let note = repo.get_note("note-1", "addr1qtest").await.unwrap();
            assert_eq!(note.status, TxStatus::Pending);
            assert!(note.latest_transaction().unwrap().confirmed_at.is_none());
        }
    }

    #[tokio::test]
    async fn rejected_reference_fails_the_record() {
        let repo = repo_with(&[("note-1", 'c')]).await;
        let client = Arc::new(
            MockClient::new().script(&tx('c'), vec![Ok(ConfirmationOutcome::Rejected)]),
        );
        let worker = ReconciliationWorker::new(test_config(), repo.clone(), client);

        let summary = worker.run_cycle().await;
        assert_eq!(summary.failed, 1);
        let note = repo.get_note("note-1", "addr1qtest").await.unwrap();
        assert_eq!(note.status, TxStatus::Failed);
    }

    #[tokio::test]
    async fn one_failing_item_never_aborts_the_batch() {
        let repo = repo_with(&[("note-1", 'a'), ("note-2", 'b'), ("note-3", 'c')]).await;
        let client = Arc::new(
            MockClient::new()
                .script(
                    &tx('a'),
                    vec![Ok(ConfirmationOutcome::Confirmed(TxDetails::default()))],
                )
                .script(&tx('b'), vec![Err(AppError::External("boom".to_string()))])
                .script(
                    &tx('c'),
                    vec![Ok(ConfirmationOutcome::Confirmed(TxDetails::default()))],
                ),
        );
        let worker = ReconciliationWorker::new(test_config(), repo.clone(), client);

        let summary = worker.run_cycle().await;
        assert_eq!(summary.confirmed, 2);
        assert_eq!(summary.still_pending, 1);

        assert_eq!(
            repo.get_note("note-1", "addr1qtest").await.unwrap().status,
            TxStatus::Confirmed
        );
        assert_eq!(
            repo.get_note("note-2", "addr1qtest").await.unwrap().status,
            TxStatus::Pending
        );
        assert_eq!(
            repo.get_note("note-3", "addr1qtest").await.unwrap().status,
            TxStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn indeterminate_outcome_is_not_a_failure() {
        let repo = repo_with(&[("note-1", 'd')]).await;
        let client = Arc::new(MockClient::new().script(
            &tx('d'),
            vec![Ok(ConfirmationOutcome::Indeterminate(
                "server error".to_string(),
            ))],
        ));
        let worker = ReconciliationWorker::new(test_config(), repo.clone(), client);

        let summary = worker.run_cycle().await;
        assert_eq!(summary.still_pending, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(
            repo.get_note("note-1", "addr1qtest").await.unwrap().status,
            TxStatus::Pending
        );
    }

    #[tokio::test]
    async fn start_and_stop_are_reentrant_safe() {
        let repo = Arc::new(NoteRepository::new());
        let client = Arc::new(MockClient::new());
        let worker = Arc::new(ReconciliationWorker::new(test_config(), repo, client));

        assert!(!worker.is_running());
        worker.start();
        assert!(worker.is_running());
        worker.start(); // no-op
        assert!(worker.is_running());

        worker.stop();
        assert!(!worker.is_running());
        worker.stop(); // no-op

        // restart is clean; the worker keeps no state of its own
        worker.start();
        assert!(worker.is_running());
        worker.stop();
    }
}
