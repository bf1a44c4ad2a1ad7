//! Postgres-backed ledger store.
//!
//! ## Error Mapping
//!
//! | SQLx error | Postgres code | `LedgerStoreError` |
//! |------------|---------------|--------------------|
//! | unique violation | `23505` | `Duplicate` |
//! | foreign key violation | `23503` | `NotFound` (unknown account, type or fiscal year) |
//! | check violation | `23514` | `Storage` |
//! | anything else | - | `Storage` |
//!
//! ## Posting
//!
//! `post` runs in one transaction: the header row and every account the
//! entry touches are locked with `SELECT ... FOR UPDATE`, so a concurrent
//! second post of the same entry waits, then sees `is_posted = true` and is
//! rejected. Any rejection drops the transaction, which rolls it back.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::{Span, instrument};
use uuid::Uuid;

use easyerp_accounting::{
    Account, AccountType, ChartOfAccounts, FiscalYear, JournalEntry, JournalEntryCreated,
    JournalEntryEvent, JournalEntryId, JournalEntryPosted, JournalLine, PostJournalEntry,
    post_entry,
};
use easyerp_core::{Aggregate, AggregateId, DomainError, UserId};

use super::{LedgerStore, LedgerStoreError, PostReceipt};

const SCHEMA: &str = include_str!("../../migrations/0001_general_ledger.sql");

/// Postgres ledger store. Cheap to clone; shares one connection pool.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, LedgerStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the ledger tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn apply_schema(&self) -> Result<(), LedgerStoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("apply_schema", e))?;
        Ok(())
    }

    async fn account_types(&self) -> Result<Vec<AccountType>, LedgerStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT name, category, normal_balance, description
            FROM gl_account_types
            ORDER BY name
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_account_types", e))?;

        rows.iter().map(account_type_from_row).collect()
    }

    async fn load_entry(
        &self,
        header: Option<PgRow>,
    ) -> Result<Option<JournalEntry>, LedgerStoreError> {
        let Some(row) = header else {
            return Ok(None);
        };
        let header = EntryRow::from_row(&row).map_err(|e| row_error("entry", e))?;

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))?;
        let lines = load_lines(&mut *conn, header.entry_id).await?;
        Ok(Some(header.into_entry(lines)?))
    }
}

#[async_trait::async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self, account_type), fields(name = %account_type.name), err)]
    async fn add_account_type(&self, account_type: AccountType) -> Result<(), LedgerStoreError> {
        sqlx::query(
            r#"
            INSERT INTO gl_account_types (name, category, normal_balance, description)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&account_type.name)
        .bind(account_type.category.as_str())
        .bind(account_type.normal_balance.as_str())
        .bind(&account_type.description)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_account_type", e))?;
        Ok(())
    }

    #[instrument(skip(self, account), fields(account_number = %account.account_number), err)]
    async fn add_account(&self, account: Account) -> Result<(), LedgerStoreError> {
        if account.account_number.trim().is_empty() {
            return Err(DomainError::validation("account number must not be empty").into());
        }

        sqlx::query(
            r#"
            INSERT INTO gl_accounts (
                account_number,
                account_name,
                account_type,
                parent_account,
                balance,
                is_active,
                is_header,
                description,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&account.account_number)
        .bind(&account.account_name)
        .bind(&account.account_type.name)
        .bind(&account.parent_account)
        .bind(account.balance)
        .bind(account.is_active)
        .bind(account.is_header)
        .bind(&account.description)
        .bind(account.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_account", e))?;
        Ok(())
    }

    async fn account(&self, account_number: &str) -> Result<Option<Account>, LedgerStoreError> {
        let row = sqlx::query(&format!("{ACCOUNT_SELECT} WHERE a.account_number = $1"))
            .bind(account_number)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_account", e))?;

        row.as_ref().map(account_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn chart(&self) -> Result<ChartOfAccounts, LedgerStoreError> {
        let types = self.account_types().await?;
        let rows = sqlx::query(&format!("{ACCOUNT_SELECT} ORDER BY a.account_number"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_accounts", e))?;
        let accounts = rows
            .iter()
            .map(account_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Span::current().record("accounts", accounts.len());
        Ok(ChartOfAccounts::from_parts(types, accounts)?)
    }

    #[instrument(skip(self, fiscal_year), fields(name = %fiscal_year.name), err)]
    async fn save_fiscal_year(&self, fiscal_year: FiscalYear) -> Result<(), LedgerStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        if fiscal_year.is_current {
            sqlx::query("UPDATE gl_fiscal_years SET is_current = FALSE WHERE name <> $1")
                .bind(&fiscal_year.name)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("clear_current_fiscal_year", e))?;
        }

        sqlx::query(
            r#"
            INSERT INTO gl_fiscal_years (name, start_date, end_date, is_current, is_closed)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO UPDATE SET
                start_date = EXCLUDED.start_date,
                end_date = EXCLUDED.end_date,
                is_current = EXCLUDED.is_current,
                is_closed = EXCLUDED.is_closed
            "#,
        )
        .bind(&fiscal_year.name)
        .bind(fiscal_year.start_date)
        .bind(fiscal_year.end_date)
        .bind(fiscal_year.is_current)
        .bind(fiscal_year.is_closed)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_fiscal_year", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn fiscal_year(&self, name: &str) -> Result<Option<FiscalYear>, LedgerStoreError> {
        let row = sqlx::query(&format!("{FISCAL_YEAR_SELECT} WHERE name = $1"))
            .bind(name)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_fiscal_year", e))?;
        row.as_ref().map(fiscal_year_from_row).transpose()
    }

    async fn current_fiscal_year(&self) -> Result<Option<FiscalYear>, LedgerStoreError> {
        let row = sqlx::query(&format!("{FISCAL_YEAR_SELECT} WHERE is_current"))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_current_fiscal_year", e))?;
        row.as_ref().map(fiscal_year_from_row).transpose()
    }

    async fn entry_numbers(&self) -> Result<Vec<String>, LedgerStoreError> {
        let rows = sqlx::query("SELECT entry_number FROM gl_journal_entries ORDER BY entry_number")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_entry_numbers", e))?;

        rows.iter()
            .map(|r| r.try_get("entry_number").map_err(|e| row_error("entry_number", e)))
            .collect()
    }

    #[instrument(
        skip(self, entry),
        fields(entry_number = %entry.entry_number(), line_count = entry.lines().len()),
        err
    )]
    async fn insert_entry(&self, entry: &JournalEntry) -> Result<(), LedgerStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let entry_id = *entry.id_typed().0.as_uuid();
        let created_at = entry.created_at().unwrap_or_else(Utc::now);

        sqlx::query(
            r#"
            INSERT INTO gl_journal_entries (
                entry_id,
                entry_number,
                entry_type,
                entry_date,
                fiscal_year,
                description,
                reference,
                total_debit,
                total_credit,
                is_posted,
                posted_date,
                created_by,
                approved_by,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(entry_id)
        .bind(entry.entry_number())
        .bind(entry.entry_type().as_str())
        .bind(entry.entry_date())
        .bind(entry.fiscal_year())
        .bind(entry.description())
        .bind(entry.reference())
        .bind(entry.total_debit())
        .bind(entry.total_credit())
        .bind(entry.is_posted())
        .bind(entry.posted_date())
        .bind(entry.created_by().map(|u| *u.as_uuid()))
        .bind(entry.approved_by().map(|u| *u.as_uuid()))
        .bind(created_at)
        .bind(entry.updated_at().unwrap_or(created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_entry", e))?;

        for (idx, line) in entry.lines().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO gl_journal_lines (
                    entry_id,
                    line_number,
                    account_number,
                    description,
                    debit_amount,
                    credit_amount
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(entry_id)
            .bind(idx as i32 + 1)
            .bind(&line.account_number)
            .bind(&line.description)
            .bind(line.debit_amount)
            .bind(line.credit_amount)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_line", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, LedgerStoreError> {
        let row = sqlx::query(&format!("{ENTRY_SELECT} WHERE entry_id = $1"))
            .bind(id.0.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_entry", e))?;
        self.load_entry(row).await
    }

    async fn entry_by_number(
        &self,
        entry_number: &str,
    ) -> Result<Option<JournalEntry>, LedgerStoreError> {
        let row = sqlx::query(&format!("{ENTRY_SELECT} WHERE entry_number = $1"))
            .bind(entry_number)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_entry_by_number", e))?;
        self.load_entry(row).await
    }

    #[instrument(skip(self), err)]
    async fn entries(&self) -> Result<Vec<JournalEntry>, LedgerStoreError> {
        let headers = sqlx::query(&format!("{ENTRY_SELECT} ORDER BY entry_number"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_entries", e))?;
        let lines = sqlx::query(
            r#"
            SELECT entry_id, account_number, description, debit_amount, credit_amount
            FROM gl_journal_lines
            ORDER BY entry_id, line_number
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_lines", e))?;

        let mut by_entry: std::collections::HashMap<Uuid, Vec<JournalLine>> =
            std::collections::HashMap::new();
        for row in &lines {
            let entry_id: Uuid = row.try_get("entry_id").map_err(|e| row_error("line", e))?;
            by_entry.entry(entry_id).or_default().push(line_from_row(row)?);
        }

        headers
            .iter()
            .map(|row| {
                let header = EntryRow::from_row(row).map_err(|e| row_error("entry", e))?;
                let lines = by_entry.remove(&header.entry_id).unwrap_or_default();
                header.into_entry(lines)
            })
            .collect()
    }

    #[instrument(skip(self, cmd), fields(entry_id = %cmd.entry_id), err)]
    async fn post(&self, cmd: &PostJournalEntry) -> Result<PostReceipt, LedgerStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let header = sqlx::query(&format!("{ENTRY_SELECT} WHERE entry_id = $1 FOR UPDATE"))
            .bind(cmd.entry_id.0.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_entry", e))?
            .ok_or_else(|| LedgerStoreError::NotFound(format!("journal entry {}", cmd.entry_id)))?;
        let header = EntryRow::from_row(&header).map_err(|e| row_error("entry", e))?;
        let lines = load_lines(&mut *tx, header.entry_id).await?;
        let mut entry = header.into_entry(lines)?;

        let fiscal_year = sqlx::query(&format!("{FISCAL_YEAR_SELECT} WHERE name = $1"))
            .bind(entry.fiscal_year())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("load_fiscal_year", e))?
            .as_ref()
            .map(fiscal_year_from_row)
            .transpose()?
            .ok_or_else(|| {
                LedgerStoreError::NotFound(format!("fiscal year {}", entry.fiscal_year()))
            })?;

        let mut chart = lock_posting_accounts(&mut tx, &entry).await?;
        let outcome = post_entry(&entry, &fiscal_year, &mut chart, cmd)?;
        entry.apply(&outcome.event);

        for change in &outcome.changes {
            sqlx::query("UPDATE gl_accounts SET balance = $2 WHERE account_number = $1")
                .bind(&change.account_number)
                .bind(change.after)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("update_balance", e))?;
        }

        sqlx::query(
            r#"
            UPDATE gl_journal_entries
            SET is_posted = TRUE,
                posted_date = COALESCE(posted_date, $2),
                approved_by = $3,
                updated_at = $2
            WHERE entry_id = $1
            "#,
        )
        .bind(cmd.entry_id.0.as_uuid())
        .bind(cmd.occurred_at)
        .bind(cmd.approved_by.map(|u| *u.as_uuid()))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("mark_posted", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Span::current().record("changes", outcome.changes.len());
        Ok(PostReceipt {
            entry,
            event: outcome.event,
            changes: outcome.changes,
        })
    }
}

const ACCOUNT_SELECT: &str = r#"
    SELECT
        a.account_number,
        a.account_name,
        a.parent_account,
        a.balance,
        a.is_active,
        a.is_header,
        a.description,
        a.created_at,
        t.name AS type_name,
        t.category,
        t.normal_balance,
        t.description AS type_description
    FROM gl_accounts a
    JOIN gl_account_types t ON t.name = a.account_type
"#;

const FISCAL_YEAR_SELECT: &str = r#"
    SELECT name, start_date, end_date, is_current, is_closed
    FROM gl_fiscal_years
"#;

const ENTRY_SELECT: &str = r#"
    SELECT
        entry_id,
        entry_number,
        entry_type,
        entry_date,
        fiscal_year,
        description,
        reference,
        total_debit,
        total_credit,
        is_posted,
        posted_date,
        created_by,
        approved_by,
        created_at
    FROM gl_journal_entries
"#;

/// Lock the accounts an entry touches and build a chart holding just them.
///
/// Parent links are dropped: the partial chart only serves balance
/// arithmetic and its parents may not be loaded.
async fn lock_posting_accounts(
    tx: &mut Transaction<'_, Postgres>,
    entry: &JournalEntry,
) -> Result<ChartOfAccounts, LedgerStoreError> {
    let mut numbers: Vec<String> = entry
        .lines()
        .iter()
        .map(|l| l.account_number.clone())
        .collect();
    numbers.sort_unstable();
    numbers.dedup();

    // Sorted lock order keeps two concurrent posts from deadlocking.
    let rows = sqlx::query(&format!(
        "{ACCOUNT_SELECT} WHERE a.account_number = ANY($1) ORDER BY a.account_number FOR UPDATE OF a"
    ))
    .bind(&numbers)
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_accounts", e))?;

    let mut types: Vec<AccountType> = Vec::new();
    let mut accounts = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut account = account_from_row(row)?;
        account.parent_account = None;
        if !types.contains(&account.account_type) {
            types.push(account.account_type.clone());
        }
        accounts.push(account);
    }

    Ok(ChartOfAccounts::from_parts(types, accounts)?)
}

async fn load_lines(
    conn: &mut sqlx::PgConnection,
    entry_id: Uuid,
) -> Result<Vec<JournalLine>, LedgerStoreError> {
    let rows = sqlx::query(
        r#"
        SELECT account_number, description, debit_amount, credit_amount
        FROM gl_journal_lines
        WHERE entry_id = $1
        ORDER BY line_number
        "#,
    )
    .bind(entry_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("load_lines", e))?;

    rows.iter().map(line_from_row).collect()
}

fn line_from_row(row: &PgRow) -> Result<JournalLine, LedgerStoreError> {
    let account_number: String = row.try_get("account_number").map_err(|e| row_error("line", e))?;
    let description: String = row.try_get("description").map_err(|e| row_error("line", e))?;
    let debit: Decimal = row.try_get("debit_amount").map_err(|e| row_error("line", e))?;
    let credit: Decimal = row.try_get("credit_amount").map_err(|e| row_error("line", e))?;
    Ok(JournalLine::new(account_number, debit, credit).with_description(description))
}

fn account_type_from_row(row: &PgRow) -> Result<AccountType, LedgerStoreError> {
    let name: String = row.try_get("name").map_err(|e| row_error("account type", e))?;
    let category: String = row.try_get("category").map_err(|e| row_error("account type", e))?;
    let side: String = row
        .try_get("normal_balance")
        .map_err(|e| row_error("account type", e))?;
    let description: String = row
        .try_get("description")
        .map_err(|e| row_error("account type", e))?;

    Ok(AccountType::new(name, category.parse()?, side.parse()?).with_description(description))
}

fn account_from_row(row: &PgRow) -> Result<Account, LedgerStoreError> {
    let get = |e| row_error("account", e);

    let type_name: String = row.try_get("type_name").map_err(get)?;
    let category: String = row.try_get("category").map_err(get)?;
    let side: String = row.try_get("normal_balance").map_err(get)?;
    let type_description: String = row.try_get("type_description").map_err(get)?;
    let account_type = AccountType::new(type_name, category.parse()?, side.parse()?)
        .with_description(type_description);

    Ok(Account {
        account_number: row.try_get("account_number").map_err(get)?,
        account_name: row.try_get("account_name").map_err(get)?,
        account_type,
        parent_account: row.try_get("parent_account").map_err(get)?,
        balance: row.try_get("balance").map_err(get)?,
        is_active: row.try_get("is_active").map_err(get)?,
        is_header: row.try_get("is_header").map_err(get)?,
        description: row.try_get("description").map_err(get)?,
        created_at: row.try_get("created_at").map_err(get)?,
    })
}

fn fiscal_year_from_row(row: &PgRow) -> Result<FiscalYear, LedgerStoreError> {
    let get = |e| row_error("fiscal year", e);
    Ok(FiscalYear {
        name: row.try_get("name").map_err(get)?,
        start_date: row.try_get("start_date").map_err(get)?,
        end_date: row.try_get("end_date").map_err(get)?,
        is_current: row.try_get("is_current").map_err(get)?,
        is_closed: row.try_get("is_closed").map_err(get)?,
    })
}

// SQLx row types

#[derive(Debug)]
struct EntryRow {
    entry_id: Uuid,
    entry_number: String,
    entry_type: String,
    entry_date: NaiveDate,
    fiscal_year: String,
    description: String,
    reference: String,
    total_debit: Decimal,
    total_credit: Decimal,
    is_posted: bool,
    posted_date: Option<DateTime<Utc>>,
    created_by: Option<Uuid>,
    approved_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for EntryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(EntryRow {
            entry_id: row.try_get("entry_id")?,
            entry_number: row.try_get("entry_number")?,
            entry_type: row.try_get("entry_type")?,
            entry_date: row.try_get("entry_date")?,
            fiscal_year: row.try_get("fiscal_year")?,
            description: row.try_get("description")?,
            reference: row.try_get("reference")?,
            total_debit: row.try_get("total_debit")?,
            total_credit: row.try_get("total_credit")?,
            is_posted: row.try_get("is_posted")?,
            posted_date: row.try_get("posted_date")?,
            created_by: row.try_get("created_by")?,
            approved_by: row.try_get("approved_by")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl EntryRow {
    /// Rehydrate the aggregate by replaying the events the row implies.
    fn into_entry(self, lines: Vec<JournalLine>) -> Result<JournalEntry, LedgerStoreError> {
        let entry_id = JournalEntryId::new(AggregateId::from_uuid(self.entry_id));

        let mut events = vec![JournalEntryEvent::Created(JournalEntryCreated {
            entry_id,
            entry_number: self.entry_number.clone(),
            entry_type: self.entry_type.parse()?,
            entry_date: self.entry_date,
            fiscal_year: self.fiscal_year,
            description: self.description,
            reference: self.reference,
            lines: lines.clone(),
            total_debit: self.total_debit,
            total_credit: self.total_credit,
            created_by: self.created_by.map(UserId::from_uuid),
            occurred_at: self.created_at,
        })];

        if self.is_posted {
            let posted_at = self.posted_date.ok_or_else(|| {
                LedgerStoreError::Storage(format!(
                    "entry {} is posted without a posted_date",
                    self.entry_number
                ))
            })?;
            events.push(JournalEntryEvent::Posted(JournalEntryPosted {
                entry_id,
                entry_number: self.entry_number,
                lines,
                approved_by: self.approved_by.map(UserId::from_uuid),
                posted_at,
            }));
        }

        Ok(JournalEntry::from_events(entry_id, &events))
    }
}

fn row_error(what: &str, err: sqlx::Error) -> LedgerStoreError {
    LedgerStoreError::Storage(format!("failed to decode {what} row: {err}"))
}

/// Map SQLx errors to LedgerStoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> LedgerStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => LedgerStoreError::Duplicate(msg),
                Some("23503") => LedgerStoreError::NotFound(msg),
                _ => LedgerStoreError::Storage(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            LedgerStoreError::Storage(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::RowNotFound => {
            LedgerStoreError::Storage(format!("unexpected row not found in {operation}"))
        }
        other => LedgerStoreError::Storage(format!("sqlx error in {operation}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn header(is_posted: bool) -> EntryRow {
        let created_at = Utc::now();
        EntryRow {
            entry_id: Uuid::now_v7(),
            entry_number: "JE-0007".to_string(),
            entry_type: "ADJUSTMENT".to_string(),
            entry_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            fiscal_year: "FY 2025".to_string(),
            description: "Reclass".to_string(),
            reference: "ADJ-1".to_string(),
            total_debit: dec!(40.00),
            total_credit: dec!(40.00),
            is_posted,
            posted_date: is_posted.then_some(created_at),
            created_by: None,
            approved_by: None,
            created_at,
        }
    }

    fn lines() -> Vec<JournalLine> {
        vec![
            JournalLine::debit("6300", dec!(40.00)),
            JournalLine::credit("1000", dec!(40.00)),
        ]
    }

    #[test]
    fn draft_row_rehydrates_at_version_one() {
        let entry = header(false).into_entry(lines()).unwrap();
        assert_eq!(easyerp_core::AggregateRoot::version(&entry), 1);
        assert_eq!(entry.entry_type(), easyerp_accounting::EntryType::Adjustment);
        assert!(!entry.is_posted());
        assert_eq!(entry.lines().len(), 2);
    }

    #[test]
    fn posted_row_rehydrates_with_posted_date() {
        let row = header(true);
        let posted_at = row.posted_date;
        let entry = row.into_entry(lines()).unwrap();
        assert_eq!(easyerp_core::AggregateRoot::version(&entry), 2);
        assert!(entry.is_posted());
        assert_eq!(entry.posted_date(), posted_at);
    }

    #[test]
    fn posted_row_without_date_is_a_storage_error() {
        let mut row = header(true);
        row.posted_date = None;
        assert!(matches!(
            row.into_entry(lines()),
            Err(LedgerStoreError::Storage(_))
        ));
    }

    #[test]
    fn unknown_entry_type_is_rejected() {
        let mut row = header(false);
        row.entry_type = "RECURRING".to_string();
        assert!(matches!(
            row.into_entry(lines()),
            Err(LedgerStoreError::Domain(DomainError::Validation(_)))
        ));
    }
}
