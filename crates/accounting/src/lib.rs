//! General ledger domain: chart of accounts, fiscal years, journal entries
//! and double-entry posting.
//!
//! Pure domain logic only: no IO, no persistence concerns.

pub mod account;
pub mod chart;
pub mod fiscal;
pub mod journal;
pub mod numbering;
pub mod posting;
pub mod reports;
pub mod setup;

pub use account::{
    Account, AccountCategory, AccountType, MAX_AMOUNT, MONEY_SCALE, NormalBalance, check_money,
};
pub use chart::ChartOfAccounts;
pub use fiscal::{FinancialPeriod, FiscalYear, PeriodType};
pub use journal::{
    CreateJournalEntry, EntryTotals, EntryType, JOURNAL_ENTRY_AGGREGATE, JournalCommand,
    JournalEntry, JournalEntryCreated, JournalEntryEvent, JournalEntryId, JournalEntryPosted,
    JournalLine, PostJournalEntry, PostingPolicy,
};
pub use numbering::next_entry_number;
pub use posting::{BalanceChange, PostingOutcome, apply_lines, post_entry, preview_lines};
