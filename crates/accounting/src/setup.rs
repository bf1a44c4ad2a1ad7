//! Standard reference data: account types, chart of accounts, sample entries.
//!
//! Opening balances are stated on each account's normal side, so payables and
//! capital open positive. Accumulated depreciation is a contra-asset and
//! opens negative.

use rust_decimal::Decimal;

use easyerp_core::{DomainError, DomainResult};

use crate::account::{Account, AccountCategory, AccountType, NormalBalance};
use crate::chart::ChartOfAccounts;
use crate::journal::JournalLine;

const ACCOUNT_TYPES: &[(&str, AccountCategory, NormalBalance, &str)] = &[
    ("Current Assets", AccountCategory::Asset, NormalBalance::Debit, "Current assets - cash, receivables, inventory"),
    ("Fixed Assets", AccountCategory::Asset, NormalBalance::Debit, "Fixed assets - equipment, buildings"),
    ("Current Liabilities", AccountCategory::Liability, NormalBalance::Credit, "Current liabilities - accounts payable"),
    ("Long-term Liabilities", AccountCategory::Liability, NormalBalance::Credit, "Long-term debt and obligations"),
    ("Owner's Equity", AccountCategory::Equity, NormalBalance::Credit, "Owner's equity and retained earnings"),
    ("Sales Revenue", AccountCategory::Revenue, NormalBalance::Credit, "Revenue from sales and services"),
    ("Cost of Sales", AccountCategory::Expense, NormalBalance::Debit, "Cost of goods sold"),
    ("Operating Expenses", AccountCategory::Expense, NormalBalance::Debit, "Operating and administrative expenses"),
];

/// (number, name, type, opening balance in cents)
const ACCOUNTS: &[(&str, &str, &str, i64)] = &[
    ("1000", "Cash - Operating", "Current Assets", 2_500_000),
    ("1010", "Cash - Savings", "Current Assets", 5_000_000),
    ("1020", "Petty Cash", "Current Assets", 50_000),
    ("1100", "Accounts Receivable", "Current Assets", 3_500_000),
    ("1200", "Inventory - Raw Materials", "Current Assets", 4_500_000),
    ("1210", "Inventory - Finished Goods", "Current Assets", 6_500_000),
    ("1300", "Prepaid Expenses", "Current Assets", 320_000),
    ("1500", "Equipment", "Fixed Assets", 12_000_000),
    ("1510", "Accumulated Depreciation - Equipment", "Fixed Assets", -2_500_000),
    ("1600", "Vehicles", "Fixed Assets", 4_500_000),
    ("1610", "Accumulated Depreciation - Vehicles", "Fixed Assets", -1_500_000),
    ("2000", "Accounts Payable", "Current Liabilities", 1_850_000),
    ("2100", "Accrued Liabilities", "Current Liabilities", 520_000),
    ("2200", "Sales Tax Payable", "Current Liabilities", 280_000),
    ("2300", "Notes Payable - Short Term", "Current Liabilities", 1_500_000),
    ("2500", "Notes Payable - Long Term", "Long-term Liabilities", 7_500_000),
    ("3000", "Owner's Capital", "Owner's Equity", 15_000_000),
    ("3100", "Retained Earnings", "Owner's Equity", 4_500_000),
    ("3200", "Current Year Earnings", "Owner's Equity", 0),
    ("4000", "Product Sales", "Sales Revenue", 0),
    ("4100", "Service Revenue", "Sales Revenue", 0),
    ("4200", "Other Income", "Sales Revenue", 0),
    ("5000", "Cost of Goods Sold", "Cost of Sales", 0),
    ("5100", "Materials Cost", "Cost of Sales", 0),
    ("6000", "Salaries and Wages", "Operating Expenses", 0),
    ("6100", "Rent Expense", "Operating Expenses", 0),
    ("6200", "Utilities", "Operating Expenses", 0),
    ("6300", "Office Supplies", "Operating Expenses", 0),
    ("6400", "Depreciation Expense", "Operating Expenses", 0),
    ("6500", "Insurance", "Operating Expenses", 0),
    ("6600", "Marketing and Advertising", "Operating Expenses", 0),
    ("6700", "Professional Services", "Operating Expenses", 0),
];

pub fn standard_account_types() -> Vec<AccountType> {
    ACCOUNT_TYPES
        .iter()
        .map(|(name, category, side, description)| {
            AccountType::new(*name, *category, *side).with_description(*description)
        })
        .collect()
}

/// Chart of accounts with the standard types and opening balances.
pub fn standard_chart() -> DomainResult<ChartOfAccounts> {
    let mut chart = ChartOfAccounts::new();
    for account_type in standard_account_types() {
        chart.add_account_type(account_type)?;
    }

    for (number, name, type_name, cents) in ACCOUNTS {
        let account_type = chart
            .account_type(type_name)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("account type '{type_name}'")))?;
        chart.add_account(
            Account::new(*number, *name, account_type)
                .with_opening_balance(Decimal::new(*cents, 2))
                .with_description(format!("{name} account")),
        )?;
    }

    Ok(chart)
}

/// A journal entry template used by the sample-data job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleEntry {
    pub description: &'static str,
    pub reference: &'static str,
    pub lines: Vec<JournalLine>,
}

fn line(account: &str, debit: i64, credit: i64, description: &str) -> JournalLine {
    JournalLine::new(account, Decimal::new(debit, 2), Decimal::new(credit, 2))
        .with_description(description)
}

/// Six everyday transactions: a sale, its cost, the customer paying, an
/// inventory purchase, payroll and paying the supplier.
pub fn sample_entries() -> Vec<SampleEntry> {
    vec![
        SampleEntry {
            description: "Sales transaction - ABC Corporation",
            reference: "INV-2025-001",
            lines: vec![
                line("1100", 150_000, 0, "Invoice to ABC Corporation"),
                line("4000", 0, 150_000, "Product sales revenue"),
            ],
        },
        SampleEntry {
            description: "Cost of goods sold for sales",
            reference: "COGS-2025-001",
            lines: vec![
                line("5000", 90_000, 0, "Cost of products sold"),
                line("1210", 0, 90_000, "Inventory reduction"),
            ],
        },
        SampleEntry {
            description: "Payment received from customer",
            reference: "PAY-2025-001",
            lines: vec![
                line("1000", 150_000, 0, "Customer payment received"),
                line("1100", 0, 150_000, "Accounts receivable payment"),
            ],
        },
        SampleEntry {
            description: "Inventory purchase from supplier",
            reference: "PO-2025-001",
            lines: vec![
                line("1210", 250_000, 0, "Inventory purchase"),
                line("2000", 0, 250_000, "Amount owed to supplier"),
            ],
        },
        SampleEntry {
            description: "Monthly salary payment",
            reference: "PAY-2025-002",
            lines: vec![
                line("6000", 850_000, 0, "Employee salaries"),
                line("1000", 0, 850_000, "Salary payment"),
            ],
        },
        SampleEntry {
            description: "Payment to supplier for inventory",
            reference: "PAY-2025-003",
            lines: vec![
                line("2000", 250_000, 0, "Supplier payment"),
                line("1000", 0, 250_000, "Cash payment to supplier"),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::EntryTotals;
    use rust_decimal_macros::dec;

    #[test]
    fn standard_chart_loads_every_account() {
        let chart = standard_chart().unwrap();
        assert_eq!(chart.len(), ACCOUNTS.len());
        assert_eq!(chart.account_types().count(), 8);

        let ap = chart.get("2000").unwrap();
        assert_eq!(ap.normal_balance(), NormalBalance::Credit);
        assert_eq!(ap.balance, dec!(18500.00));
        assert_eq!(chart.get("1510").unwrap().balance, dec!(-25000.00));
    }

    #[test]
    fn sample_entries_are_balanced_and_reference_known_accounts() {
        let chart = standard_chart().unwrap();
        for entry in sample_entries() {
            let totals = EntryTotals::from_lines(&entry.lines).unwrap();
            assert!(totals.is_balanced(), "{}", entry.reference);
            for l in &entry.lines {
                assert!(chart.contains(&l.account_number), "{}", l.account_number);
            }
        }
    }
}
