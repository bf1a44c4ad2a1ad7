use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::instrument;

use easyerp_accounting::{
    Account, AccountType, ChartOfAccounts, FiscalYear, JournalEntry, JournalEntryId,
    PostJournalEntry, post_entry,
};
use easyerp_core::{Aggregate, AggregateRoot};

use super::{LedgerStore, LedgerStoreError, PostReceipt, add_error};

#[derive(Debug, Default)]
struct Ledger {
    chart: ChartOfAccounts,
    fiscal_years: BTreeMap<String, FiscalYear>,
    entries: HashMap<JournalEntryId, JournalEntry>,
    numbers: BTreeMap<String, JournalEntryId>,
}

/// In-memory ledger store.
///
/// One `RwLock` guards everything, so a post is observed by readers either
/// completely or not at all. Intended for tests, the CLI and dev.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    ledger: RwLock<Ledger>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Ledger>, LedgerStoreError> {
        self.ledger
            .read()
            .map_err(|_| LedgerStoreError::Storage("ledger lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Ledger>, LedgerStoreError> {
        self.ledger
            .write()
            .map_err(|_| LedgerStoreError::Storage("ledger lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn add_account_type(&self, account_type: AccountType) -> Result<(), LedgerStoreError> {
        self.write()?
            .chart
            .add_account_type(account_type)
            .map_err(add_error)
    }

    async fn add_account(&self, account: Account) -> Result<(), LedgerStoreError> {
        self.write()?.chart.add_account(account).map_err(add_error)
    }

    async fn account(&self, account_number: &str) -> Result<Option<Account>, LedgerStoreError> {
        Ok(self.read()?.chart.get(account_number).cloned())
    }

    async fn chart(&self) -> Result<ChartOfAccounts, LedgerStoreError> {
        Ok(self.read()?.chart.clone())
    }

    async fn save_fiscal_year(&self, fiscal_year: FiscalYear) -> Result<(), LedgerStoreError> {
        let mut ledger = self.write()?;
        if fiscal_year.is_current {
            for other in ledger.fiscal_years.values_mut() {
                other.is_current = false;
            }
        }
        ledger
            .fiscal_years
            .insert(fiscal_year.name.clone(), fiscal_year);
        Ok(())
    }

    async fn fiscal_year(&self, name: &str) -> Result<Option<FiscalYear>, LedgerStoreError> {
        Ok(self.read()?.fiscal_years.get(name).cloned())
    }

    async fn current_fiscal_year(&self) -> Result<Option<FiscalYear>, LedgerStoreError> {
        Ok(self
            .read()?
            .fiscal_years
            .values()
            .find(|fy| fy.is_current)
            .cloned())
    }

    async fn entry_numbers(&self) -> Result<Vec<String>, LedgerStoreError> {
        Ok(self.read()?.numbers.keys().cloned().collect())
    }

    #[instrument(skip(self, entry), fields(entry_number = %entry.entry_number()), err)]
    async fn insert_entry(&self, entry: &JournalEntry) -> Result<(), LedgerStoreError> {
        let mut ledger = self.write()?;
        let id = *entry.id();

        if ledger.entries.contains_key(&id) {
            return Err(LedgerStoreError::Duplicate(format!("journal entry {id}")));
        }
        if ledger.numbers.contains_key(entry.entry_number()) {
            return Err(LedgerStoreError::Duplicate(format!(
                "entry number {}",
                entry.entry_number()
            )));
        }

        ledger.numbers.insert(entry.entry_number().to_string(), id);
        ledger.entries.insert(id, entry.clone());
        Ok(())
    }

    async fn entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, LedgerStoreError> {
        Ok(self.read()?.entries.get(&id).cloned())
    }

    async fn entry_by_number(
        &self,
        entry_number: &str,
    ) -> Result<Option<JournalEntry>, LedgerStoreError> {
        let ledger = self.read()?;
        Ok(ledger
            .numbers
            .get(entry_number)
            .and_then(|id| ledger.entries.get(id))
            .cloned())
    }

    async fn entries(&self) -> Result<Vec<JournalEntry>, LedgerStoreError> {
        let ledger = self.read()?;
        Ok(ledger
            .numbers
            .values()
            .filter_map(|id| ledger.entries.get(id))
            .cloned()
            .collect())
    }

    #[instrument(skip(self, cmd), fields(entry_id = %cmd.entry_id), err)]
    async fn post(&self, cmd: &PostJournalEntry) -> Result<PostReceipt, LedgerStoreError> {
        let mut guard = self.write()?;
        let ledger = &mut *guard;

        let mut entry = ledger
            .entries
            .get(&cmd.entry_id)
            .cloned()
            .ok_or_else(|| LedgerStoreError::NotFound(format!("journal entry {}", cmd.entry_id)))?;
        let fiscal_year = ledger
            .fiscal_years
            .get(entry.fiscal_year())
            .ok_or_else(|| {
                LedgerStoreError::NotFound(format!("fiscal year {}", entry.fiscal_year()))
            })?;

        // Balances are only written once every check has passed.
        let outcome = post_entry(&entry, fiscal_year, &mut ledger.chart, cmd)?;
        entry.apply(&outcome.event);
        ledger.entries.insert(cmd.entry_id, entry.clone());

        Ok(PostReceipt {
            entry,
            event: outcome.event,
            changes: outcome.changes,
        })
    }
}
