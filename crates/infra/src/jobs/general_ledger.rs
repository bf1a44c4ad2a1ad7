//! General-ledger setup and sample-data jobs.

use std::collections::HashSet;

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use easyerp_accounting::setup::{sample_entries, standard_account_types, standard_chart};

use super::context::JobContext;
use crate::service::NewJournalEntry;
use crate::store::LedgerStoreError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetupReport {
    pub account_types_created: usize,
    pub accounts_created: usize,
    /// Types and accounts that already existed.
    pub skipped: usize,
    pub fiscal_year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub setup: SetupReport,
    pub entries_created: usize,
    pub entries_posted: usize,
    /// Sample entries whose reference was already in the journal.
    pub entries_skipped: usize,
}

/// Load the standard account types and chart of accounts, and make sure an
/// open fiscal year is current (the calendar year when none is). Safe to
/// re-run: existing records are kept. A closed calendar year is an error.
pub async fn setup_general_ledger(ctx: &JobContext) -> anyhow::Result<SetupReport> {
    let store = ctx.store();
    let mut report = SetupReport::default();

    for account_type in standard_account_types() {
        let name = account_type.name.clone();
        match store.add_account_type(account_type).await {
            Ok(()) => report.account_types_created += 1,
            Err(LedgerStoreError::Duplicate(_)) => {
                debug!(account_type = %name, "account type exists");
                report.skipped += 1;
            }
            Err(err) => return Err(err).with_context(|| format!("adding account type {name}")),
        }
    }

    let chart = standard_chart().context("building the standard chart")?;
    for account in chart.accounts().cloned() {
        let number = account.account_number.clone();
        match store.add_account(account).await {
            Ok(()) => report.accounts_created += 1,
            Err(LedgerStoreError::Duplicate(_)) => {
                debug!(account = %number, "account exists");
                report.skipped += 1;
            }
            Err(err) => return Err(err).with_context(|| format!("adding account {number}")),
        }
    }

    let today = Utc::now().date_naive();
    let fiscal_year = ctx
        .service
        .current_or_default_fiscal_year(today)
        .await
        .context("opening the current fiscal year")?;
    report.fiscal_year = fiscal_year.name;

    info!(
        account_types = report.account_types_created,
        accounts = report.accounts_created,
        skipped = report.skipped,
        fiscal_year = %report.fiscal_year,
        "general ledger set up"
    );
    Ok(report)
}

/// Set up the ledger, then record the sample journal entries dated today.
///
/// Entries are posted when `seed.post_sample_entries` is set and left as
/// drafts otherwise. An entry whose reference is already journaled is
/// skipped, so re-running does not duplicate postings.
pub async fn seed_sample_entries(ctx: &JobContext) -> anyhow::Result<SeedReport> {
    let setup = setup_general_ledger(ctx).await?;
    let post = ctx.config.seed.post_sample_entries;

    let existing: HashSet<String> = ctx
        .store()
        .entries()
        .await?
        .iter()
        .map(|e| e.reference().to_string())
        .collect();

    let mut report = SeedReport {
        setup,
        ..SeedReport::default()
    };
    let today = Utc::now().date_naive();

    for sample in sample_entries() {
        if existing.contains(sample.reference) {
            report.entries_skipped += 1;
            continue;
        }

        let new = NewJournalEntry::new(sample.description, sample.lines)
            .with_reference(sample.reference)
            .with_entry_date(today);
        let entry = ctx
            .service
            .create_entry(new)
            .await
            .with_context(|| format!("creating sample entry {}", sample.reference))?;
        report.entries_created += 1;

        if post {
            ctx.service
                .post(entry.id_typed(), None)
                .await
                .with_context(|| format!("posting {}", entry.entry_number()))?;
            report.entries_posted += 1;
        }
    }

    info!(
        created = report.entries_created,
        posted = report.entries_posted,
        skipped = report.entries_skipped,
        "sample journal entries recorded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use easyerp_accounting::FiscalYear;
    use easyerp_accounting::reports::trial_balance;

    use crate::config::AppConfig;

    #[tokio::test]
    async fn setup_is_idempotent() {
        let ctx = JobContext::in_memory("setup", AppConfig::default());

        let first = setup_general_ledger(&ctx).await.unwrap();
        assert_eq!(first.account_types_created, 8);
        assert_eq!(first.accounts_created, 32);
        assert_eq!(first.skipped, 0);

        let second = setup_general_ledger(&ctx).await.unwrap();
        assert_eq!(second.accounts_created, 0);
        assert_eq!(second.skipped, 40);
        assert!(ctx.store().current_fiscal_year().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn setup_does_not_reopen_a_closed_year() {
        let ctx = JobContext::in_memory("setup", AppConfig::default());
        let mut closed = FiscalYear::calendar_for(Utc::now().date_naive()).unwrap();
        closed.close().unwrap();
        ctx.store().save_fiscal_year(closed.clone()).await.unwrap();

        let err = setup_general_ledger(&ctx).await.unwrap_err();
        assert!(format!("{err:#}").contains("is closed"));

        let stored = ctx.store().fiscal_year(&closed.name).await.unwrap().unwrap();
        assert!(stored.is_closed && !stored.is_current);
        assert!(ctx.store().current_fiscal_year().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn setup_keeps_an_open_current_year() {
        let ctx = JobContext::in_memory("setup", AppConfig::default());
        let custom = FiscalYear::calendar(2031).unwrap().as_current();
        ctx.store().save_fiscal_year(custom.clone()).await.unwrap();

        let report = setup_general_ledger(&ctx).await.unwrap();
        assert_eq!(report.fiscal_year, custom.name);
    }

    #[tokio::test]
    async fn seeding_posts_sample_entries_once() {
        let ctx = JobContext::in_memory("seed", AppConfig::default());

        let report = seed_sample_entries(&ctx).await.unwrap();
        assert_eq!(report.entries_created, 6);
        assert_eq!(report.entries_posted, 6);

        // 35000 opening + 1500 invoiced - 1500 collected
        let ar = ctx.store().account("1100").await.unwrap().unwrap();
        assert_eq!(ar.balance, dec!(35000.00));
        // 25000 + 1500 - 8500 - 2500
        let cash = ctx.store().account("1000").await.unwrap().unwrap();
        assert_eq!(cash.balance, dec!(15500.00));
        // 18500 + 2500 - 2500
        let ap = ctx.store().account("2000").await.unwrap().unwrap();
        assert_eq!(ap.balance, dec!(18500.00));

        let again = seed_sample_entries(&ctx).await.unwrap();
        assert_eq!(again.entries_created, 0);
        assert_eq!(again.entries_skipped, 6);
        assert_eq!(ctx.store().entries().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn drafts_leave_opening_balances_alone() {
        let config = AppConfig::from_toml("[seed]\npost_sample_entries = false").unwrap();
        let ctx = JobContext::in_memory("seed", config);

        let before = trial_balance(&standard_chart().unwrap(), false);
        let report = seed_sample_entries(&ctx).await.unwrap();
        assert_eq!(report.entries_posted, 0);

        let after = trial_balance(&ctx.store().chart().await.unwrap(), false);
        assert_eq!(after.total_debit, before.total_debit);
        assert_eq!(after.total_credit, before.total_credit);
        assert!(ctx.store().entries().await.unwrap().iter().all(|e| !e.is_posted()));
    }
}
