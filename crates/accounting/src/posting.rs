//! Applying journal lines to account balances.
//!
//! Every posting path (in-memory store, Postgres store, seed job) funnels
//! through [`post_entry`] so the sign convention and the all-or-nothing rule
//! live in one place.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use easyerp_core::{Aggregate, DomainError, DomainResult, ValueObject};

use crate::account::{MAX_AMOUNT, NormalBalance};
use crate::chart::ChartOfAccounts;
use crate::fiscal::FiscalYear;
use crate::journal::{
    JournalCommand, JournalEntry, JournalEntryEvent, JournalEntryPosted, JournalLine,
    PostJournalEntry,
};

/// Net movement of one account caused by a posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    pub account_number: String,
    pub normal_balance: NormalBalance,
    pub before: Decimal,
    pub after: Decimal,
}

impl BalanceChange {
    pub fn delta(&self) -> Decimal {
        self.after - self.before
    }
}

impl ValueObject for BalanceChange {}

/// Compute the balance changes `lines` would cause, without touching `chart`.
///
/// Lines hitting the same account accumulate into a single change. Fails if
/// any account is unknown or a balance would leave the `NUMERIC(15, 2)` range.
pub fn preview_lines(
    chart: &ChartOfAccounts,
    lines: &[JournalLine],
) -> DomainResult<Vec<BalanceChange>> {
    let mut order: Vec<&str> = Vec::new();
    let mut running: HashMap<&str, BalanceChange> = HashMap::new();

    for line in lines {
        let number = line.account_number.as_str();
        let account = chart
            .get(number)
            .ok_or_else(|| DomainError::not_found(format!("account {number}")))?;

        let change = running.entry(number).or_insert_with(|| {
            order.push(number);
            BalanceChange {
                account_number: account.account_number.clone(),
                normal_balance: account.normal_balance(),
                before: account.balance,
                after: account.balance,
            }
        });

        let delta = change
            .normal_balance
            .checked_delta(line.debit_amount, line.credit_amount)
            .ok_or_else(|| overflow(number))?;
        change.after = change
            .after
            .checked_add(delta)
            .ok_or_else(|| overflow(number))?;
    }

    let changes: Vec<BalanceChange> = order
        .into_iter()
        .filter_map(|n| running.remove(n))
        .collect();
    if let Some(change) = changes.iter().find(|c| c.after.abs() > MAX_AMOUNT) {
        return Err(overflow(&change.account_number));
    }
    Ok(changes)
}

fn overflow(account_number: &str) -> DomainError {
    DomainError::invariant(format!("balance overflow on account {account_number}"))
}

/// Apply `lines` to the chart: for a debit-normal account
/// `balance += debit - credit`, otherwise `balance += credit - debit`.
///
/// Either every line is applied or, on error, none is.
pub fn apply_lines(
    chart: &mut ChartOfAccounts,
    lines: &[JournalLine],
) -> DomainResult<Vec<BalanceChange>> {
    let changes = preview_lines(chart, lines)?;
    commit_changes(chart, &changes);
    Ok(changes)
}

/// Write precomputed balances into the chart.
pub fn commit_changes(chart: &mut ChartOfAccounts, changes: &[BalanceChange]) {
    for change in changes {
        if let Some(account) = chart.get_mut(&change.account_number) {
            account.balance = change.after;
        }
    }
}

/// Result of posting an entry: the event to record and the balance movements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingOutcome {
    pub event: JournalEntryEvent,
    pub changes: Vec<BalanceChange>,
}

impl PostingOutcome {
    pub fn posted(&self) -> Option<&JournalEntryPosted> {
        match &self.event {
            JournalEntryEvent::Posted(p) => Some(p),
            JournalEntryEvent::Created(_) => None,
        }
    }
}

/// Decide and apply a post.
///
/// Checks, in order: the entry accepts the post command (exists, not yet
/// posted, lines pass `cmd.policy`), the fiscal year is open, every line's
/// account exists. Only then are balances written. The caller applies the
/// returned event to the entry and persists both in one unit.
pub fn post_entry(
    entry: &JournalEntry,
    fiscal_year: &FiscalYear,
    chart: &mut ChartOfAccounts,
    cmd: &PostJournalEntry,
) -> DomainResult<PostingOutcome> {
    let mut events = entry.handle(&JournalCommand::Post(cmd.clone()))?;
    let event = events
        .pop()
        .ok_or_else(|| DomainError::invariant("post produced no event"))?;

    if fiscal_year.name != entry.fiscal_year() {
        return Err(DomainError::invariant(format!(
            "entry {} belongs to {}, not {}",
            entry.entry_number(),
            entry.fiscal_year(),
            fiscal_year.name
        )));
    }
    if fiscal_year.is_closed {
        return Err(DomainError::invariant(format!(
            "fiscal year {} is closed",
            fiscal_year.name
        )));
    }

    let changes = apply_lines(chart, entry.lines())?;
    Ok(PostingOutcome { event, changes })
}
