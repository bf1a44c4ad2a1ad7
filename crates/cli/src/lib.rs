//! `easyerp` command line: ledger setup, sample data, posting and reports.
//!
//! Every command prints its result as JSON on stdout. Logs go to stderr.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::warn;

use easyerp_accounting::reports::{
    EntryStatus, EntrySummary, JournalFilter, balance_sheet, dashboard, income_statement, trial_balance,
};
use easyerp_core::UserId;
use easyerp_infra::AppConfig;
use easyerp_infra::jobs::{JobContext, seed_sample_entries, setup_general_ledger};

#[derive(Debug, Parser)]
#[command(name = "easyerp", about = "EasyERP general ledger", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the standard account types, chart of accounts and fiscal year.
    SetupGl,
    /// Set up the ledger and record the sample journal entries.
    Seed,
    /// Post a draft journal entry.
    Post {
        entry_number: String,
        #[arg(long)]
        approved_by: Option<UserId>,
    },
    TrialBalance {
        /// Include accounts with a zero balance.
        #[arg(long)]
        show_zero: bool,
    },
    IncomeStatement,
    BalanceSheet,
    Dashboard,
    /// List journal entries.
    Journal {
        #[arg(long)]
        search: Option<String>,
        /// DRAFT or POSTED.
        #[arg(long)]
        status: Option<EntryStatus>,
        /// Earliest entry date, `YYYY-MM-DD`.
        #[arg(long)]
        date_from: Option<NaiveDate>,
    },
}

impl Command {
    fn job_name(&self) -> &'static str {
        match self {
            Command::SetupGl => "setup_general_ledger",
            Command::Seed => "seed_sample_entries",
            Command::Post { .. } => "post_journal_entry",
            Command::TrialBalance { .. } => "trial_balance",
            Command::IncomeStatement => "income_statement",
            Command::BalanceSheet => "balance_sheet",
            Command::Dashboard => "dashboard",
            Command::Journal { .. } => "journal",
        }
    }

    fn needs_seeded_ledger(&self) -> bool {
        !matches!(self, Command::SetupGl | Command::Seed)
    }
}

/// Run one command against the ledger the config points at.
pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<Value> {
    let ctx = JobContext::connect(cli.command.job_name(), config).await?;
    ctx.started();
    let result = execute(&ctx, cli.command).await;
    ctx.finish(result)
}

async fn execute(ctx: &JobContext, command: Command) -> anyhow::Result<Value> {
    // An in-memory ledger starts empty on every run.
    if command.needs_seeded_ledger() && ctx.config.database.url.is_none() {
        warn!("no database configured; using a freshly seeded in-memory ledger");
        seed_sample_entries(ctx).await?;
    }

    let store = ctx.store();
    let value = match command {
        Command::SetupGl => serde_json::to_value(setup_general_ledger(ctx).await?)?,
        Command::Seed => serde_json::to_value(seed_sample_entries(ctx).await?)?,
        Command::Post {
            entry_number,
            approved_by,
        } => {
            let receipt = ctx
                .service
                .post_by_number(&entry_number, approved_by)
                .await
                .with_context(|| format!("posting {entry_number}"))?;
            json!({
                "entry_number": receipt.entry.entry_number(),
                "totals": receipt.entry.totals(),
                "changes": receipt.changes,
            })
        }
        Command::TrialBalance { show_zero } => {
            serde_json::to_value(trial_balance(&store.chart().await?, show_zero))?
        }
        Command::IncomeStatement => serde_json::to_value(income_statement(&store.chart().await?))?,
        Command::BalanceSheet => serde_json::to_value(balance_sheet(&store.chart().await?))?,
        Command::Dashboard => {
            let chart = store.chart().await?;
            let entries = store.entries().await?;
            serde_json::to_value(dashboard(&chart, &entries))?
        }
        Command::Journal {
            search,
            status,
            date_from,
        } => {
            let filter = JournalFilter {
                search,
                status,
                date_from,
            };
            let entries = store.entries().await?;
            let rows: Vec<_> = filter
                .apply(&entries)
                .into_iter()
                .map(EntrySummary::from)
                .collect();
            serde_json::to_value(rows)?
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("easyerp").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parses_journal_filters() {
        let cli = parse(&["journal", "--search", "pay", "--status", "posted", "--date-from", "2025-01-31"]);
        match cli.command {
            Command::Journal {
                search,
                status,
                date_from,
            } => {
                assert_eq!(search.as_deref(), Some("pay"));
                assert_eq!(status, Some(EntryStatus::Posted));
                assert_eq!(date_from, NaiveDate::from_ymd_opt(2025, 1, 31));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_status() {
        let args = ["easyerp", "journal", "--status", "void"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[tokio::test]
    async fn trial_balance_runs_on_a_seeded_in_memory_ledger() {
        let out = run(parse(&["trial-balance"]), AppConfig::default()).await.unwrap();
        assert!(!out["rows"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn posting_a_posted_entry_fails() {
        // the in-memory ledger is seeded with every sample posted
        let err = run(parse(&["post", "JE-0001"]), AppConfig::default())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("JE-0001"));
    }

    #[tokio::test]
    async fn drafts_can_be_posted() {
        let config = AppConfig::from_toml("[seed]\npost_sample_entries = false").unwrap();
        let out = run(parse(&["post", "JE-0003"]), config).await.unwrap();
        assert_eq!(out["entry_number"], "JE-0003");
        assert_eq!(out["changes"].as_array().unwrap().len(), 2);
    }
}
