//! Read-only ledger reports computed from the chart and the journal.

use core::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use easyerp_core::DomainError;

use crate::account::{AccountCategory, NormalBalance};
use crate::chart::ChartOfAccounts;
use crate::journal::JournalEntry;

const RECENT_ENTRIES: usize = 5;

/// Headline numbers for the general-ledger dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_assets: Decimal,
    /// Magnitude of the liability total, whatever sign it was stored with.
    pub total_liabilities: Decimal,
    pub net_worth: Decimal,
    pub unposted_entries: usize,
    pub recent_entries: Vec<EntrySummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub description: String,
    /// Debit total, or the credit total when there are no debits.
    pub amount: Decimal,
    pub is_posted: bool,
}

impl From<&JournalEntry> for EntrySummary {
    fn from(entry: &JournalEntry) -> Self {
        let amount = if entry.total_debit().is_zero() {
            entry.total_credit()
        } else {
            entry.total_debit()
        };
        Self {
            entry_number: entry.entry_number().to_string(),
            entry_date: entry.entry_date(),
            description: entry.description().to_string(),
            amount,
            is_posted: entry.is_posted(),
        }
    }
}

pub fn dashboard(chart: &ChartOfAccounts, entries: &[JournalEntry]) -> DashboardSummary {
    let total_assets = chart.category_total(AccountCategory::Asset);
    let total_liabilities = chart.category_total(AccountCategory::Liability).abs();

    let mut recent: Vec<&JournalEntry> = entries.iter().collect();
    recent.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.entry_number().cmp(a.entry_number()))
    });

    DashboardSummary {
        total_assets,
        total_liabilities,
        net_worth: total_assets - total_liabilities,
        unposted_entries: entries.iter().filter(|e| !e.is_posted()).count(),
        recent_entries: recent
            .into_iter()
            .take(RECENT_ENTRIES)
            .map(EntrySummary::from)
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryStatus {
    Draft,
    Posted,
}

impl FromStr for EntryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(EntryStatus::Draft),
            "POSTED" => Ok(EntryStatus::Posted),
            _ => Err(DomainError::validation(format!("unknown entry status '{s}'"))),
        }
    }
}

/// Journal listing filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalFilter {
    /// Case-insensitive substring of entry number, description or reference.
    pub search: Option<String>,
    pub status: Option<EntryStatus>,
    pub date_from: Option<NaiveDate>,
}

impl JournalFilter {
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let hit = [entry.entry_number(), entry.description(), entry.reference()]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        match self.status {
            Some(EntryStatus::Posted) if !entry.is_posted() => return false,
            Some(EntryStatus::Draft) if entry.is_posted() => return false,
            _ => {}
        }

        if let Some(from) = self.date_from {
            if entry.entry_date() < from {
                return false;
            }
        }

        true
    }

    pub fn apply<'a>(&self, entries: &'a [JournalEntry]) -> Vec<&'a JournalEntry> {
        entries.iter().filter(|e| self.matches(e)).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub draft: usize,
    pub posted: usize,
}

pub fn status_counts(entries: &[JournalEntry]) -> StatusCounts {
    entries.iter().fold(StatusCounts::default(), |mut acc, e| {
        if e.is_posted() {
            acc.posted += 1;
        } else {
            acc.draft += 1;
        }
        acc
    })
}

/// Header debit/credit sums of every entry dated in one calendar month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    pub debits: Decimal,
    pub credits: Decimal,
}

/// Entry totals are bounded by the line amount limit, so the sums cannot
/// overflow.
pub fn monthly_totals(entries: &[JournalEntry], year: i32, month: u32) -> MonthlyTotals {
    entries
        .iter()
        .filter(|e| e.entry_date().year() == year && e.entry_date().month() == month)
        .fold(MonthlyTotals::default(), |acc, e| MonthlyTotals {
            debits: acc.debits + e.total_debit(),
            credits: acc.credits + e.total_credit(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub account_number: String,
    pub account_name: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
}

impl TrialBalance {
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }
}

/// Trial balance over posting (non-header) accounts.
///
/// A positive balance lands in the account's normal column, a negative one in
/// the opposite column.
pub fn trial_balance(chart: &ChartOfAccounts, show_zero: bool) -> TrialBalance {
    let mut rows = Vec::new();
    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;

    for account in chart.accounts().filter(|a| !a.is_header) {
        if account.balance.is_zero() && !show_zero {
            continue;
        }

        let magnitude = account.balance.abs();
        let on_debit_side = match account.normal_balance() {
            NormalBalance::Debit => account.balance.is_sign_positive(),
            NormalBalance::Credit => account.balance.is_sign_negative(),
        };
        let (debit, credit) = if account.balance.is_zero() {
            (Decimal::ZERO, Decimal::ZERO)
        } else if on_debit_side {
            (magnitude, Decimal::ZERO)
        } else {
            (Decimal::ZERO, magnitude)
        };

        total_debit += debit;
        total_credit += credit;
        rows.push(TrialBalanceRow {
            account_number: account.account_number.clone(),
            account_name: account.account_name.clone(),
            debit,
            credit,
        });
    }

    TrialBalance {
        rows,
        total_debit,
        total_credit,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub net_income: Decimal,
}

pub fn income_statement(chart: &ChartOfAccounts) -> IncomeStatement {
    let total_revenue = chart.category_total(AccountCategory::Revenue);
    let total_expenses = chart.category_total(AccountCategory::Expense);
    IncomeStatement {
        total_revenue,
        total_expenses,
        net_income: total_revenue - total_expenses,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub total_equity: Decimal,
    /// Revenue minus expenses not yet closed into equity.
    pub current_earnings: Decimal,
}

impl BalanceSheet {
    /// Assets = liabilities + equity + unclosed earnings.
    pub fn is_balanced(&self) -> bool {
        self.total_assets == self.total_liabilities + self.total_equity + self.current_earnings
    }
}

pub fn balance_sheet(chart: &ChartOfAccounts) -> BalanceSheet {
    BalanceSheet {
        total_assets: chart.category_total(AccountCategory::Asset),
        total_liabilities: chart.category_total(AccountCategory::Liability),
        total_equity: chart.category_total(AccountCategory::Equity),
        current_earnings: income_statement(chart).net_income,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use easyerp_core::Aggregate;
    use rust_decimal_macros::dec;

    use crate::account::{Account, AccountType};
    use crate::journal::{
        CreateJournalEntry, EntryType, JournalCommand, JournalEntryId, JournalLine,
        PostJournalEntry, PostingPolicy,
    };
    use crate::posting::apply_lines;

    fn chart() -> ChartOfAccounts {
        let asset = AccountType::conventional("Current Assets", AccountCategory::Asset);
        let liability = AccountType::conventional("Current Liabilities", AccountCategory::Liability);
        let equity = AccountType::conventional("Owner's Equity", AccountCategory::Equity);
        let revenue = AccountType::conventional("Sales Revenue", AccountCategory::Revenue);
        let expense = AccountType::conventional("Operating Expenses", AccountCategory::Expense);

        let mut chart = ChartOfAccounts::new();
        for t in [&asset, &liability, &equity, &revenue, &expense] {
            chart.add_account_type(t.clone()).unwrap();
        }
        chart.add_account(Account::new("1000", "Cash", asset.clone())).unwrap();
        chart.add_account(Account::new("1100", "Accounts Receivable", asset)).unwrap();
        chart.add_account(Account::new("2000", "Accounts Payable", liability)).unwrap();
        chart.add_account(Account::new("3000", "Owner's Capital", equity)).unwrap();
        chart.add_account(Account::new("4000", "Product Sales", revenue)).unwrap();
        chart.add_account(Account::new("6000", "Salaries", expense)).unwrap();
        chart
    }

    fn entry(number: &str, date: NaiveDate, lines: Vec<JournalLine>, posted: bool) -> JournalEntry {
        let id = JournalEntryId::generate();
        let mut entry = JournalEntry::empty(id);
        let created = entry
            .handle(&JournalCommand::Create(CreateJournalEntry {
                entry_id: id,
                entry_number: number.to_string(),
                entry_type: EntryType::Manual,
                entry_date: date,
                fiscal_year: "FY 2025".to_string(),
                description: format!("Entry {number}"),
                reference: format!("REF-{number}"),
                lines,
                created_by: None,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        entry.apply(&created[0]);
        if posted {
            let events = entry
                .handle(&JournalCommand::Post(PostJournalEntry {
                    entry_id: id,
                    approved_by: None,
                    policy: PostingPolicy::Permissive,
                    occurred_at: Utc::now(),
                }))
                .unwrap();
            entry.apply(&events[0]);
        }
        entry
    }

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    fn ledger() -> (ChartOfAccounts, Vec<JournalEntry>) {
        let mut chart = chart();
        let capital = vec![
            JournalLine::debit("1000", dec!(10000)),
            JournalLine::credit("3000", dec!(10000)),
        ];
        let sale = vec![
            JournalLine::debit("1100", dec!(1500)),
            JournalLine::credit("4000", dec!(1500)),
        ];
        let salary = vec![
            JournalLine::debit("6000", dec!(8500)),
            JournalLine::credit("1000", dec!(8500)),
        ];
        let supplies = vec![
            JournalLine::debit("6000", dec!(700)),
            JournalLine::credit("2000", dec!(700)),
        ];

        apply_lines(&mut chart, &capital).unwrap();
        apply_lines(&mut chart, &sale).unwrap();
        apply_lines(&mut chart, &salary).unwrap();

        let entries = vec![
            entry("JE-0001", d(1, 5), capital, true),
            entry("JE-0002", d(2, 10), sale, true),
            entry("JE-0003", d(2, 20), salary, true),
            entry("JE-0004", d(3, 1), supplies, false),
        ];
        (chart, entries)
    }

    #[test]
    fn dashboard_reports_net_worth_and_unposted() {
        let (chart, entries) = ledger();
        let summary = dashboard(&chart, &entries);
        assert_eq!(summary.total_assets, dec!(3000));
        assert_eq!(summary.total_liabilities, dec!(0));
        assert_eq!(summary.net_worth, dec!(3000));
        assert_eq!(summary.unposted_entries, 1);
        assert_eq!(summary.recent_entries.len(), 4);
    }

    #[test]
    fn dashboard_liabilities_are_reported_as_magnitude() {
        let (mut chart, entries) = ledger();
        apply_lines(&mut chart, &[JournalLine::debit("2000", dec!(250))]).unwrap();
        let summary = dashboard(&chart, &entries);
        assert_eq!(summary.total_liabilities, dec!(250));
    }

    #[test]
    fn filter_by_search_status_and_date() {
        let (_, entries) = ledger();

        let by_ref = JournalFilter {
            search: Some("ref-je-0002".to_string()),
            ..Default::default()
        };
        assert_eq!(by_ref.apply(&entries).len(), 1);

        let drafts = JournalFilter {
            status: Some("draft".parse().unwrap()),
            ..Default::default()
        };
        assert_eq!(drafts.apply(&entries)[0].entry_number(), "JE-0004");

        let since_feb = JournalFilter {
            date_from: Some(d(2, 15)),
            status: Some(EntryStatus::Posted),
            ..Default::default()
        };
        let hits = since_feb.apply(&entries);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entry_number(), "JE-0003");
    }

    #[test]
    fn counts_and_monthly_totals() {
        let (_, entries) = ledger();
        assert_eq!(status_counts(&entries), StatusCounts { draft: 1, posted: 3 });

        let feb = monthly_totals(&entries, 2025, 2);
        assert_eq!(feb.debits, dec!(10000));
        assert_eq!(feb.credits, dec!(10000));
        assert_eq!(monthly_totals(&entries, 2025, 7), MonthlyTotals::default());
    }

    #[test]
    fn trial_balance_balances_after_balanced_postings() {
        let (chart, _) = ledger();
        let tb = trial_balance(&chart, false);
        assert!(tb.is_balanced());
        assert_eq!(tb.total_debit, dec!(11500));
        // Accounts Payable has a zero balance and is hidden.
        assert!(tb.rows.iter().all(|r| r.account_number != "2000"));
        assert_eq!(trial_balance(&chart, true).rows.len(), 6);
    }

    #[test]
    fn negative_balance_moves_to_opposite_column() {
        let (mut chart, _) = ledger();
        apply_lines(&mut chart, &[JournalLine::credit("1000", dec!(2000))]).unwrap();
        let tb = trial_balance(&chart, false);
        let cash = tb.rows.iter().find(|r| r.account_number == "1000").unwrap();
        assert_eq!(cash.debit, dec!(0));
        assert_eq!(cash.credit, dec!(500));
    }

    #[test]
    fn income_statement_and_balance_sheet() {
        let (chart, _) = ledger();
        let is = income_statement(&chart);
        assert_eq!(is.total_revenue, dec!(1500));
        assert_eq!(is.total_expenses, dec!(8500));
        assert_eq!(is.net_income, dec!(-7000));

        let bs = balance_sheet(&chart);
        assert_eq!(bs.total_assets, dec!(3000));
        assert_eq!(bs.total_equity, dec!(10000));
        assert!(bs.is_balanced());
    }
}
