use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use easyerp_core::{DomainError, Entity};

/// Top-level classification of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountCategory {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountCategory {
    pub const ALL: [AccountCategory; 5] = [
        AccountCategory::Asset,
        AccountCategory::Liability,
        AccountCategory::Equity,
        AccountCategory::Revenue,
        AccountCategory::Expense,
    ];

    /// Conventional normal side: assets and expenses grow with debits,
    /// everything else with credits.
    pub fn default_normal_balance(self) -> NormalBalance {
        match self {
            AccountCategory::Asset | AccountCategory::Expense => NormalBalance::Debit,
            AccountCategory::Liability | AccountCategory::Equity | AccountCategory::Revenue => {
                NormalBalance::Credit
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccountCategory::Asset => "ASSET",
            AccountCategory::Liability => "LIABILITY",
            AccountCategory::Equity => "EQUITY",
            AccountCategory::Revenue => "REVENUE",
            AccountCategory::Expense => "EXPENSE",
        }
    }
}

impl core::fmt::Display for AccountCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("unknown account category '{s}'")))
    }
}

/// Decimal places kept for money (`NUMERIC(15, 2)` in the schema).
pub const MONEY_SCALE: u32 = 2;

/// Largest magnitude an amount or balance may take: 13 integer digits.
pub const MAX_AMOUNT: Decimal =
    Decimal::from_parts(2_764_472_319, 232_830, 0, false, MONEY_SCALE);

/// Reject values the ledger cannot store exactly.
pub fn check_money(value: Decimal, what: &str) -> Result<(), DomainError> {
    if value.normalize().scale() > MONEY_SCALE {
        return Err(DomainError::validation(format!(
            "{what} {value} has more than {MONEY_SCALE} decimal places"
        )));
    }
    if value.abs() > MAX_AMOUNT {
        return Err(DomainError::validation(format!(
            "{what} {value} exceeds {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

/// The side on which an account's balance increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NormalBalance {
    Debit,
    Credit,
}

impl NormalBalance {
    /// Balance movement caused by one journal line.
    ///
    /// Debit-normal: `debit - credit`. Credit-normal: `credit - debit`.
    pub fn signed_delta(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            NormalBalance::Debit => debit - credit,
            NormalBalance::Credit => credit - debit,
        }
    }

    /// Overflow-checked variant of [`NormalBalance::signed_delta`].
    pub fn checked_delta(self, debit: Decimal, credit: Decimal) -> Option<Decimal> {
        match self {
            NormalBalance::Debit => debit.checked_sub(credit),
            NormalBalance::Credit => credit.checked_sub(debit),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NormalBalance::Debit => "DEBIT",
            NormalBalance::Credit => "CREDIT",
        }
    }
}

impl core::fmt::Display for NormalBalance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormalBalance {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBIT" => Ok(NormalBalance::Debit),
            "CREDIT" => Ok(NormalBalance::Credit),
            _ => Err(DomainError::validation(format!("unknown normal balance '{s}'"))),
        }
    }
}

/// Account type master data (e.g. "Current Assets", ASSET, DEBIT).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountType {
    pub name: String,
    pub category: AccountCategory,
    pub normal_balance: NormalBalance,
    pub description: String,
}

impl AccountType {
    pub fn new(
        name: impl Into<String>,
        category: AccountCategory,
        normal_balance: NormalBalance,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            normal_balance,
            description: String::new(),
        }
    }

    /// Type whose normal side follows its category's convention.
    pub fn conventional(name: impl Into<String>, category: AccountCategory) -> Self {
        Self::new(name, category, category.default_normal_balance())
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Entity for AccountType {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.name
    }
}

/// Chart-of-accounts entry with its running balance.
///
/// `balance` is expressed on the account's normal side: a positive balance on
/// a credit-normal account is a credit balance. Only posting moves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_number: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub parent_account: Option<String>,
    pub balance: Decimal,
    pub is_active: bool,
    /// Grouping account; carries no postings of its own in practice.
    pub is_header: bool,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        account_number: impl Into<String>,
        account_name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        Self {
            account_number: account_number.into(),
            account_name: account_name.into(),
            account_type,
            parent_account: None,
            balance: Decimal::ZERO,
            is_active: true,
            is_header: false,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_parent(mut self, parent_account: impl Into<String>) -> Self {
        self.parent_account = Some(parent_account.into());
        self
    }

    pub fn with_opening_balance(mut self, balance: Decimal) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn as_header(mut self) -> Self {
        self.is_header = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn category(&self) -> AccountCategory {
        self.account_type.category
    }

    pub fn normal_balance(&self) -> NormalBalance {
        self.account_type.normal_balance
    }

    /// Balance after applying one line, without mutating the account.
    ///
    /// Returns `None` on decimal overflow.
    pub fn balance_after(&self, debit: Decimal, credit: Decimal) -> Option<Decimal> {
        let delta = self.normal_balance().checked_delta(debit, credit)?;
        self.balance.checked_add(delta)
    }
}

impl Entity for Account {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.account_number
    }
}

impl core::fmt::Display for Account {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} - {}", self.account_number, self.account_name)
    }
}
