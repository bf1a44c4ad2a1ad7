//! Infrastructure layer: ledger persistence, posting use cases, config, jobs.

pub mod config;
pub mod jobs;
pub mod service;
pub mod store;

mod integration_tests;

pub use config::AppConfig;
pub use jobs::JobContext;
pub use service::{NewJournalEntry, PostingError, PostingService};
pub use store::{InMemoryLedgerStore, LedgerStore, LedgerStoreError, PostReceipt, PostgresLedgerStore};
