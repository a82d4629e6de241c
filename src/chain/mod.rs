//! Ledger-facing subsystem: confirmation queries, the reconciliation
//! worker, and note recovery from on-chain metadata.

pub mod confirmation;
pub mod handlers;
pub mod recovery;
pub mod worker;

pub use confirmation::{BlockfrostClient, ConfirmationClient, ConfirmationOutcome, TxDetails};
pub use worker::{ReconciliationWorker, WorkerConfig};
