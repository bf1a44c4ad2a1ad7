use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use easyerp_core::{Aggregate, AggregateId, AggregateRoot, DomainError, UserId, ValueObject};
use easyerp_events::Event;

use crate::account::check_money;

/// Aggregate type tag used on event envelopes.
pub const JOURNAL_ENTRY_AGGREGATE: &str = "accounting.journal_entry";

/// Journal entry identifier (aggregate id).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JournalEntryId(pub AggregateId);

impl JournalEntryId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for JournalEntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    #[default]
    Manual,
    Auto,
    Closing,
    Adjustment,
}

impl EntryType {
    pub const ALL: [EntryType; 4] = [
        EntryType::Manual,
        EntryType::Auto,
        EntryType::Closing,
        EntryType::Adjustment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Manual => "MANUAL",
            EntryType::Auto => "AUTO",
            EntryType::Closing => "CLOSING",
            EntryType::Adjustment => "ADJUSTMENT",
        }
    }
}

impl FromStr for EntryType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("unknown entry type '{s}'")))
    }
}

/// One journal detail line.
///
/// By convention exactly one of `debit_amount` / `credit_amount` is non-zero;
/// only [`PostingPolicy::Strict`] enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_number: String,
    pub description: String,
    pub debit_amount: Decimal,
    pub credit_amount: Decimal,
}

impl JournalLine {
    pub fn new(account_number: impl Into<String>, debit: Decimal, credit: Decimal) -> Self {
        Self {
            account_number: account_number.into(),
            description: String::new(),
            debit_amount: debit,
            credit_amount: credit,
        }
    }

    pub fn debit(account_number: impl Into<String>, amount: Decimal) -> Self {
        Self::new(account_number, amount, Decimal::ZERO)
    }

    pub fn credit(account_number: impl Into<String>, amount: Decimal) -> Self {
        Self::new(account_number, Decimal::ZERO, amount)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn is_one_sided(&self) -> bool {
        self.debit_amount.is_zero() != self.credit_amount.is_zero()
    }
}

/// Header totals of a journal entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    pub total_debit: Decimal,
    pub total_credit: Decimal,
}

impl EntryTotals {
    /// Sum the lines. Fails rather than wrapping when a total overflows.
    pub fn from_lines(lines: &[JournalLine]) -> Result<Self, DomainError> {
        lines.iter().try_fold(Self::default(), |acc, line| {
            Ok(Self {
                total_debit: acc
                    .total_debit
                    .checked_add(line.debit_amount)
                    .ok_or_else(|| DomainError::invariant("total debit overflow"))?,
                total_credit: acc
                    .total_credit
                    .checked_add(line.credit_amount)
                    .ok_or_else(|| DomainError::invariant("total credit overflow"))?,
            })
        })
    }

    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }

    /// Debits minus credits; zero when balanced.
    pub fn difference(&self) -> Decimal {
        self.total_debit - self.total_credit
    }
}

impl ValueObject for EntryTotals {}

/// Validation applied to an entry's lines before it may be posted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingPolicy {
    /// Non-empty lines with non-negative amounts. Unbalanced entries post.
    #[default]
    Permissive,
    /// Permissive checks, plus one-sided lines and debits equal to credits.
    Strict,
}

impl PostingPolicy {
    pub fn from_require_balanced(require_balanced: bool) -> Self {
        if require_balanced {
            PostingPolicy::Strict
        } else {
            PostingPolicy::Permissive
        }
    }

    pub fn validate(self, lines: &[JournalLine]) -> Result<EntryTotals, DomainError> {
        if lines.is_empty() {
            return Err(DomainError::validation("journal entry must have lines"));
        }
        validate_amounts(lines)?;

        if self == PostingPolicy::Strict {
            if let Some(idx) = lines.iter().position(|l| !l.is_one_sided()) {
                return Err(DomainError::validation(format!(
                    "line {} must carry either a debit or a credit amount",
                    idx + 1
                )));
            }
        }

        let totals = EntryTotals::from_lines(lines)?;
        if self == PostingPolicy::Strict && !totals.is_balanced() {
            return Err(DomainError::invariant(format!(
                "debits must equal credits (debit {}, credit {})",
                totals.total_debit, totals.total_credit
            )));
        }
        Ok(totals)
    }
}

fn validate_amounts(lines: &[JournalLine]) -> Result<(), DomainError> {
    for (idx, line) in lines.iter().enumerate() {
        if line.account_number.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "line {} has no account",
                idx + 1
            )));
        }
        if line.debit_amount.is_sign_negative() || line.credit_amount.is_sign_negative() {
            return Err(DomainError::validation(format!(
                "line {} has a negative amount",
                idx + 1
            )));
        }
        check_money(line.debit_amount, &format!("line {} debit", idx + 1))?;
        check_money(line.credit_amount, &format!("line {} credit", idx + 1))?;
    }
    Ok(())
}

/// Aggregate root: one journal entry (header + lines).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    id: JournalEntryId,
    entry_number: String,
    entry_type: EntryType,
    entry_date: NaiveDate,
    fiscal_year: String,
    description: String,
    reference: String,
    lines: Vec<JournalLine>,
    totals: EntryTotals,
    is_posted: bool,
    posted_date: Option<DateTime<Utc>>,
    created_by: Option<UserId>,
    approved_by: Option<UserId>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl JournalEntry {
    /// Empty aggregate for rehydration.
    pub fn empty(id: JournalEntryId) -> Self {
        Self {
            id,
            entry_number: String::new(),
            entry_type: EntryType::default(),
            entry_date: NaiveDate::default(),
            fiscal_year: String::new(),
            description: String::new(),
            reference: String::new(),
            lines: Vec::new(),
            totals: EntryTotals::default(),
            is_posted: false,
            posted_date: None,
            created_by: None,
            approved_by: None,
            created_at: None,
            updated_at: None,
            version: 0,
            created: false,
        }
    }

    /// Rebuild from a stream of committed events.
    pub fn from_events<'a>(
        id: JournalEntryId,
        events: impl IntoIterator<Item = &'a JournalEntryEvent>,
    ) -> Self {
        let mut entry = Self::empty(id);
        for event in events {
            entry.apply(event);
        }
        entry
    }

    pub fn id_typed(&self) -> JournalEntryId {
        self.id
    }

    pub fn exists(&self) -> bool {
        self.created
    }

    pub fn entry_number(&self) -> &str {
        &self.entry_number
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn entry_date(&self) -> NaiveDate {
        self.entry_date
    }

    pub fn fiscal_year(&self) -> &str {
        &self.fiscal_year
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn lines(&self) -> &[JournalLine] {
        &self.lines
    }

    pub fn totals(&self) -> EntryTotals {
        self.totals
    }

    pub fn total_debit(&self) -> Decimal {
        self.totals.total_debit
    }

    pub fn total_credit(&self) -> Decimal {
        self.totals.total_credit
    }

    pub fn is_balanced(&self) -> bool {
        self.totals.is_balanced()
    }

    pub fn is_posted(&self) -> bool {
        self.is_posted
    }

    pub fn posted_date(&self) -> Option<DateTime<Utc>> {
        self.posted_date
    }

    pub fn created_by(&self) -> Option<UserId> {
        self.created_by
    }

    pub fn approved_by(&self) -> Option<UserId> {
        self.approved_by
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl AggregateRoot for JournalEntry {
    type Id = JournalEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: create a draft entry with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateJournalEntry {
    pub entry_id: JournalEntryId,
    pub entry_number: String,
    pub entry_type: EntryType,
    pub entry_date: NaiveDate,
    pub fiscal_year: String,
    pub description: String,
    pub reference: String,
    pub lines: Vec<JournalLine>,
    pub created_by: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: post a draft entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostJournalEntry {
    pub entry_id: JournalEntryId,
    pub approved_by: Option<UserId>,
    pub policy: PostingPolicy,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalCommand {
    Create(CreateJournalEntry),
    Post(PostJournalEntry),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryCreated {
    pub entry_id: JournalEntryId,
    pub entry_number: String,
    pub entry_type: EntryType,
    pub entry_date: NaiveDate,
    pub fiscal_year: String,
    pub description: String,
    pub reference: String,
    pub lines: Vec<JournalLine>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub created_by: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// The entry's lines were applied to account balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryPosted {
    pub entry_id: JournalEntryId,
    pub entry_number: String,
    pub lines: Vec<JournalLine>,
    pub approved_by: Option<UserId>,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalEntryEvent {
    Created(JournalEntryCreated),
    Posted(JournalEntryPosted),
}

impl Event for JournalEntryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            JournalEntryEvent::Created(_) => "accounting.journal_entry.created",
            JournalEntryEvent::Posted(_) => "accounting.journal_entry.posted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            JournalEntryEvent::Created(e) => e.occurred_at,
            JournalEntryEvent::Posted(e) => e.posted_at,
        }
    }
}

impl Aggregate for JournalEntry {
    type Command = JournalCommand;
    type Event = JournalEntryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            JournalEntryEvent::Created(e) => {
                self.id = e.entry_id;
                self.entry_number = e.entry_number.clone();
                self.entry_type = e.entry_type;
                self.entry_date = e.entry_date;
                self.fiscal_year = e.fiscal_year.clone();
                self.description = e.description.clone();
                self.reference = e.reference.clone();
                self.lines = e.lines.clone();
                self.totals = EntryTotals {
                    total_debit: e.total_debit,
                    total_credit: e.total_credit,
                };
                self.created_by = e.created_by;
                self.created_at = Some(e.occurred_at);
                self.updated_at = Some(e.occurred_at);
                self.created = true;
            }
            JournalEntryEvent::Posted(e) => {
                self.is_posted = true;
                // posted_date is write-once.
                if self.posted_date.is_none() {
                    self.posted_date = Some(e.posted_at);
                }
                self.approved_by = e.approved_by;
                self.updated_at = Some(e.posted_at);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            JournalCommand::Create(cmd) => self.handle_create(cmd),
            JournalCommand::Post(cmd) => self.handle_post(cmd),
        }
    }
}

impl JournalEntry {
    fn handle_create(&self, cmd: &CreateJournalEntry) -> Result<Vec<JournalEntryEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict(format!(
                "journal entry {} already exists",
                self.entry_number
            )));
        }
        if cmd.entry_number.trim().is_empty() {
            return Err(DomainError::validation("entry number must not be empty"));
        }
        if cmd.fiscal_year.trim().is_empty() {
            return Err(DomainError::validation("journal entry needs a fiscal year"));
        }
        validate_amounts(&cmd.lines)?;

        let totals = EntryTotals::from_lines(&cmd.lines)?;

        Ok(vec![JournalEntryEvent::Created(JournalEntryCreated {
            entry_id: cmd.entry_id,
            entry_number: cmd.entry_number.clone(),
            entry_type: cmd.entry_type,
            entry_date: cmd.entry_date,
            fiscal_year: cmd.fiscal_year.clone(),
            description: cmd.description.clone(),
            reference: cmd.reference.clone(),
            lines: cmd.lines.clone(),
            total_debit: totals.total_debit,
            total_credit: totals.total_credit,
            created_by: cmd.created_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_post(&self, cmd: &PostJournalEntry) -> Result<Vec<JournalEntryEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("journal entry {}", cmd.entry_id)));
        }
        if self.is_posted {
            return Err(DomainError::conflict(format!(
                "journal entry {} is already posted",
                self.entry_number
            )));
        }

        cmd.policy.validate(&self.lines)?;

        Ok(vec![JournalEntryEvent::Posted(JournalEntryPosted {
            entry_id: self.id,
            entry_number: self.entry_number.clone(),
            lines: self.lines.clone(),
            approved_by: cmd.approved_by,
            posted_at: cmd.occurred_at,
        })])
    }
}
