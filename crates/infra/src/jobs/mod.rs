//! Batch jobs over the ledger.
//!
//! Each job is a plain async function taking a [`JobContext`]: the context
//! is built once in `main` from configuration and passed down explicitly, so
//! jobs share no global state. A failing job is logged once by
//! [`JobContext::finish`] and its error returned to the caller; nothing is
//! retried.

pub mod context;
pub mod general_ledger;

pub use context::{JobContext, JobId, LedgerBus, SharedLedgerStore};
pub use general_ledger::{SeedReport, SetupReport, seed_sample_entries, setup_general_ledger};
