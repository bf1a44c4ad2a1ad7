//! Journal use cases: create an entry, post it, publish what happened.
//!
//! Ordering invariant: an event reaches the bus only after the store has
//! committed the change it describes.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{info, instrument, warn};

use easyerp_accounting::{
    CreateJournalEntry, EntryType, FiscalYear, JOURNAL_ENTRY_AGGREGATE, JournalCommand,
    JournalEntry, JournalEntryId, JournalLine, PostJournalEntry, PostingPolicy,
    next_entry_number,
};
use easyerp_core::{Aggregate, AggregateRoot, DomainError, UserId};
use easyerp_events::{Event, EventBus, EventEnvelope};

use crate::store::{LedgerStore, LedgerStoreError, PostReceipt};

#[derive(Debug, Error)]
pub enum PostingError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] LedgerStoreError),

    /// The change is committed; only the notification failed.
    #[error("event publication failed: {0}")]
    Publish(String),
}

/// Input for a new journal entry. Unset fields fall back to the next entry
/// number, today's date and the current fiscal year.
#[derive(Debug, Clone, Default)]
pub struct NewJournalEntry {
    pub entry_number: Option<String>,
    pub entry_type: EntryType,
    pub entry_date: Option<NaiveDate>,
    pub fiscal_year: Option<String>,
    pub description: String,
    pub reference: String,
    pub lines: Vec<JournalLine>,
    pub created_by: Option<UserId>,
}

impl NewJournalEntry {
    pub fn new(description: impl Into<String>, lines: Vec<JournalLine>) -> Self {
        Self {
            description: description.into(),
            lines,
            ..Self::default()
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    pub fn with_entry_date(mut self, date: NaiveDate) -> Self {
        self.entry_date = Some(date);
        self
    }

    pub fn with_entry_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = entry_type;
        self
    }
}

pub struct PostingService<S, B> {
    store: S,
    bus: B,
    policy: PostingPolicy,
}

impl<S, B> PostingService<S, B>
where
    S: LedgerStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(store: S, bus: B, policy: PostingPolicy) -> Self {
        Self { store, bus, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> PostingPolicy {
        self.policy
    }

    /// The current fiscal year, creating and flagging `FY <year of date>`
    /// when no open year is current. A closed calendar year is never
    /// reopened.
    #[instrument(skip(self), err)]
    pub async fn current_or_default_fiscal_year(
        &self,
        date: NaiveDate,
    ) -> Result<FiscalYear, PostingError> {
        if let Some(current) = self.store.current_fiscal_year().await? {
            if !current.is_closed {
                return Ok(current);
            }
        }

        let calendar = FiscalYear::calendar_for(date)?;
        let fiscal_year = match self.store.fiscal_year(&calendar.name).await? {
            Some(existing) if existing.is_closed => {
                return Err(DomainError::invariant(format!(
                    "fiscal year {} is closed",
                    existing.name
                ))
                .into());
            }
            Some(existing) => existing.as_current(),
            None => calendar.as_current(),
        };
        info!(
            fiscal_year = %fiscal_year.name,
            "no open current fiscal year; using calendar year"
        );
        self.store.save_fiscal_year(fiscal_year.clone()).await?;
        Ok(fiscal_year)
    }

    /// Record a draft entry. Balances do not move until it is posted.
    #[instrument(skip(self, new), fields(line_count = new.lines.len()), err)]
    pub async fn create_entry(&self, new: NewJournalEntry) -> Result<JournalEntry, PostingError> {
        let now = Utc::now();
        let entry_date = new.entry_date.unwrap_or_else(|| now.date_naive());

        let fiscal_year = match &new.fiscal_year {
            Some(name) => self
                .store
                .fiscal_year(name)
                .await?
                .ok_or_else(|| DomainError::not_found(format!("fiscal year {name}")))?,
            None => self.current_or_default_fiscal_year(entry_date).await?,
        };

        for line in &new.lines {
            if self.store.account(&line.account_number).await?.is_none() {
                return Err(DomainError::not_found(format!("account {}", line.account_number)).into());
            }
        }

        let auto_numbered = new.entry_number.is_none();
        let entry_number = match new.entry_number {
            Some(number) => number,
            None => self.next_number().await?,
        };

        let mut cmd = CreateJournalEntry {
            entry_id: JournalEntryId::generate(),
            entry_number,
            entry_type: new.entry_type,
            entry_date,
            fiscal_year: fiscal_year.name,
            description: new.description,
            reference: new.reference,
            lines: new.lines,
            created_by: new.created_by,
            occurred_at: now,
        };

        // The number is read before the insert; a concurrent create can take
        // it in between. Auto numbers are recomputed once in that case.
        let mut renumbered = false;
        let (entry, events) = loop {
            let mut entry = JournalEntry::empty(cmd.entry_id);
            let events = entry.handle(&JournalCommand::Create(cmd.clone()))?;
            for event in &events {
                entry.apply(event);
            }

            match self.store.insert_entry(&entry).await {
                Ok(()) => break (entry, events),
                Err(LedgerStoreError::Duplicate(what)) if auto_numbered && !renumbered => {
                    warn!(%what, "entry number taken; renumbering");
                    renumbered = true;
                    cmd.entry_number = self.next_number().await?;
                }
                Err(err) => return Err(err.into()),
            }
        };
        for event in &events {
            self.publish(&entry, event)?;
        }

        info!(
            entry_number = %entry.entry_number(),
            total_debit = %entry.total_debit(),
            total_credit = %entry.total_credit(),
            "journal entry created"
        );
        Ok(entry)
    }

    async fn next_number(&self) -> Result<String, PostingError> {
        let existing = self.store.entry_numbers().await?;
        Ok(next_entry_number(existing.iter().map(String::as_str)))
    }

    /// Post a draft entry: apply its lines to account balances.
    #[instrument(skip(self), fields(entry_id = %entry_id), err)]
    pub async fn post(
        &self,
        entry_id: JournalEntryId,
        approved_by: Option<UserId>,
    ) -> Result<PostReceipt, PostingError> {
        let cmd = PostJournalEntry {
            entry_id,
            approved_by,
            policy: self.policy,
            occurred_at: Utc::now(),
        };

        let receipt = self.store.post(&cmd).await?;
        self.publish(&receipt.entry, &receipt.event)?;

        info!(
            entry_number = %receipt.entry.entry_number(),
            accounts = receipt.changes.len(),
            "journal entry posted"
        );
        Ok(receipt)
    }

    pub async fn post_by_number(
        &self,
        entry_number: &str,
        approved_by: Option<UserId>,
    ) -> Result<PostReceipt, PostingError> {
        let entry = self
            .store
            .entry_by_number(entry_number)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("journal entry {entry_number}")))?;
        self.post(entry.id_typed(), approved_by).await
    }

    /// Create and immediately post.
    pub async fn create_and_post(
        &self,
        new: NewJournalEntry,
        approved_by: Option<UserId>,
    ) -> Result<PostReceipt, PostingError> {
        let entry = self.create_entry(new).await?;
        self.post(entry.id_typed(), approved_by).await
    }

    fn publish<E>(&self, entry: &JournalEntry, event: &E) -> Result<(), PostingError>
    where
        E: Event + Serialize,
    {
        let envelope = EventEnvelope::from_typed(
            entry.id_typed().0,
            JOURNAL_ENTRY_AGGREGATE,
            entry.version(),
            event,
        )
        .map_err(|e| PostingError::Publish(format!("payload serialization failed: {e}")))?;

        self.bus
            .publish(envelope)
            .map_err(|e| PostingError::Publish(format!("{e:?}")))
    }
}
