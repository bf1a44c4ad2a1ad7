//! Ledger persistence boundary.
//!
//! A `LedgerStore` owns the chart of accounts, fiscal years and journal
//! entries. Posting is a store operation because it must flip the entry's
//! posted flag and move every affected balance in one unit: either all of it
//! is visible to readers or none of it is.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use thiserror::Error;

use easyerp_accounting::{
    Account, AccountType, BalanceChange, ChartOfAccounts, FiscalYear, JournalEntry,
    JournalEntryEvent, JournalEntryId, PostJournalEntry,
};
use easyerp_core::DomainError;

pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;

/// Store operation error.
///
/// `Domain` carries business rejections raised while the store held its
/// lock (posting twice, unknown account, closed year). `Storage` is IO.
#[derive(Debug, Error)]
pub enum LedgerStoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage failure: {0}")]
    Storage(String),
}

/// A committed post: the entry after the post, the event that did it and
/// the balance movements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReceipt {
    pub entry: JournalEntry,
    pub event: JournalEntryEvent,
    pub changes: Vec<BalanceChange>,
}

/// General ledger persistence.
///
/// Implementations must:
/// - reject duplicate account numbers, type names and entry numbers
/// - keep at most one fiscal year flagged current
/// - run `post` atomically: a failed post leaves balances and the entry
///   untouched, a second post of the same entry is rejected
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    async fn add_account_type(&self, account_type: AccountType) -> Result<(), LedgerStoreError>;

    async fn add_account(&self, account: Account) -> Result<(), LedgerStoreError>;

    async fn account(&self, account_number: &str) -> Result<Option<Account>, LedgerStoreError>;

    /// Snapshot of every account type and account.
    async fn chart(&self) -> Result<ChartOfAccounts, LedgerStoreError>;

    /// Insert or replace by name. Saving a current year clears the flag on
    /// every other year.
    async fn save_fiscal_year(&self, fiscal_year: FiscalYear) -> Result<(), LedgerStoreError>;

    async fn fiscal_year(&self, name: &str) -> Result<Option<FiscalYear>, LedgerStoreError>;

    async fn current_fiscal_year(&self) -> Result<Option<FiscalYear>, LedgerStoreError>;

    async fn entry_numbers(&self) -> Result<Vec<String>, LedgerStoreError>;

    /// Persist a freshly created (draft) entry with its lines.
    async fn insert_entry(&self, entry: &JournalEntry) -> Result<(), LedgerStoreError>;

    async fn entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, LedgerStoreError>;

    async fn entry_by_number(
        &self,
        entry_number: &str,
    ) -> Result<Option<JournalEntry>, LedgerStoreError>;

    /// Every entry, ordered by entry number.
    async fn entries(&self) -> Result<Vec<JournalEntry>, LedgerStoreError>;

    /// Post an entry and apply its lines to account balances atomically.
    async fn post(&self, cmd: &PostJournalEntry) -> Result<PostReceipt, LedgerStoreError>;
}

#[async_trait::async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn add_account_type(&self, account_type: AccountType) -> Result<(), LedgerStoreError> {
        (**self).add_account_type(account_type).await
    }

    async fn add_account(&self, account: Account) -> Result<(), LedgerStoreError> {
        (**self).add_account(account).await
    }

    async fn account(&self, account_number: &str) -> Result<Option<Account>, LedgerStoreError> {
        (**self).account(account_number).await
    }

    async fn chart(&self) -> Result<ChartOfAccounts, LedgerStoreError> {
        (**self).chart().await
    }

    async fn save_fiscal_year(&self, fiscal_year: FiscalYear) -> Result<(), LedgerStoreError> {
        (**self).save_fiscal_year(fiscal_year).await
    }

    async fn fiscal_year(&self, name: &str) -> Result<Option<FiscalYear>, LedgerStoreError> {
        (**self).fiscal_year(name).await
    }

    async fn current_fiscal_year(&self) -> Result<Option<FiscalYear>, LedgerStoreError> {
        (**self).current_fiscal_year().await
    }

    async fn entry_numbers(&self) -> Result<Vec<String>, LedgerStoreError> {
        (**self).entry_numbers().await
    }

    async fn insert_entry(&self, entry: &JournalEntry) -> Result<(), LedgerStoreError> {
        (**self).insert_entry(entry).await
    }

    async fn entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, LedgerStoreError> {
        (**self).entry(id).await
    }

    async fn entry_by_number(
        &self,
        entry_number: &str,
    ) -> Result<Option<JournalEntry>, LedgerStoreError> {
        (**self).entry_by_number(entry_number).await
    }

    async fn entries(&self) -> Result<Vec<JournalEntry>, LedgerStoreError> {
        (**self).entries().await
    }

    async fn post(&self, cmd: &PostJournalEntry) -> Result<PostReceipt, LedgerStoreError> {
        (**self).post(cmd).await
    }
}

/// Maps a chart rejection from an add: a duplicate is `Duplicate`, a missing
/// type or parent is `NotFound`.
pub(crate) fn add_error(err: DomainError) -> LedgerStoreError {
    match err {
        DomainError::Conflict(what) => LedgerStoreError::Duplicate(what),
        DomainError::NotFound(what) => LedgerStoreError::NotFound(what),
        other => LedgerStoreError::Domain(other),
    }
}
