//! Chart of accounts: account types plus the account tree, keyed by number.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use easyerp_core::{DomainError, DomainResult};

use crate::account::{Account, AccountCategory, AccountType, check_money};

/// Account types and accounts, ordered by account number.
///
/// Invariants:
/// - account numbers and type names are unique
/// - every account's type is registered
/// - a parent account exists before its children and the tree has no cycles
/// - balances fit `NUMERIC(15, 2)`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartOfAccounts {
    account_types: BTreeMap<String, AccountType>,
    accounts: BTreeMap<String, Account>,
}

impl ChartOfAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a chart from stored rows, inserting parents before children
    /// whatever order `accounts` arrives in.
    pub fn from_parts(
        account_types: impl IntoIterator<Item = AccountType>,
        accounts: impl IntoIterator<Item = Account>,
    ) -> DomainResult<Self> {
        let mut chart = Self::new();
        for account_type in account_types {
            chart.add_account_type(account_type)?;
        }

        let mut pending: Vec<Account> = accounts.into_iter().collect();
        while !pending.is_empty() {
            let before = pending.len();
            let (ready, waiting): (Vec<_>, Vec<_>) = pending.into_iter().partition(|a| {
                a.parent_account
                    .as_deref()
                    .is_none_or(|p| chart.accounts.contains_key(p))
            });
            for account in ready {
                chart.add_account(account)?;
            }
            pending = waiting;

            if pending.len() == before {
                // Nothing placed this round: the first one reports the missing parent.
                return chart.add_account(pending.remove(0)).map(|_| chart);
            }
        }
        Ok(chart)
    }

    pub fn add_account_type(&mut self, account_type: AccountType) -> DomainResult<()> {
        if account_type.name.trim().is_empty() {
            return Err(DomainError::validation("account type name must not be empty"));
        }
        if self.account_types.contains_key(&account_type.name) {
            return Err(DomainError::conflict(format!(
                "account type '{}' already exists",
                account_type.name
            )));
        }
        self.account_types
            .insert(account_type.name.clone(), account_type);
        Ok(())
    }

    pub fn account_type(&self, name: &str) -> Option<&AccountType> {
        self.account_types.get(name)
    }

    pub fn account_types(&self) -> impl Iterator<Item = &AccountType> {
        self.account_types.values()
    }

    pub fn add_account(&mut self, account: Account) -> DomainResult<()> {
        if account.account_number.trim().is_empty() {
            return Err(DomainError::validation("account number must not be empty"));
        }
        if self.accounts.contains_key(&account.account_number) {
            return Err(DomainError::conflict(format!(
                "account {} already exists",
                account.account_number
            )));
        }
        check_money(
            account.balance,
            &format!("balance of account {}", account.account_number),
        )?;
        match self.account_types.get(&account.account_type.name) {
            Some(registered) if *registered == account.account_type => {}
            Some(_) => {
                return Err(DomainError::invariant(format!(
                    "account {} carries a stale copy of type '{}'",
                    account.account_number, account.account_type.name
                )));
            }
            None => {
                return Err(DomainError::not_found(format!(
                    "account type '{}'",
                    account.account_type.name
                )));
            }
        }
        if let Some(parent) = &account.parent_account {
            if !self.accounts.contains_key(parent) {
                return Err(DomainError::not_found(format!("parent account {parent}")));
            }
        }

        self.accounts.insert(account.account_number.clone(), account);
        Ok(())
    }

    /// Move an account under a new parent (or to the root with `None`).
    pub fn reparent(&mut self, account_number: &str, parent: Option<&str>) -> DomainResult<()> {
        if !self.accounts.contains_key(account_number) {
            return Err(DomainError::not_found(format!("account {account_number}")));
        }

        if let Some(parent) = parent {
            if !self.accounts.contains_key(parent) {
                return Err(DomainError::not_found(format!("parent account {parent}")));
            }
            if parent == account_number || self.is_ancestor(account_number, parent) {
                return Err(DomainError::invariant(format!(
                    "moving {account_number} under {parent} would create a cycle"
                )));
            }
        }

        if let Some(account) = self.accounts.get_mut(account_number) {
            account.parent_account = parent.map(str::to_string);
        }
        Ok(())
    }

    /// True when `ancestor` appears on the parent chain of `account_number`.
    pub fn is_ancestor(&self, ancestor: &str, account_number: &str) -> bool {
        let mut current = self
            .accounts
            .get(account_number)
            .and_then(|a| a.parent_account.as_deref());

        // Bounded walk: the tree never has more levels than accounts.
        for _ in 0..self.accounts.len() {
            match current {
                Some(p) if p == ancestor => return true,
                Some(p) => {
                    current = self.accounts.get(p).and_then(|a| a.parent_account.as_deref());
                }
                None => return false,
            }
        }
        false
    }

    pub fn get(&self, account_number: &str) -> Option<&Account> {
        self.accounts.get(account_number)
    }

    pub(crate) fn get_mut(&mut self, account_number: &str) -> Option<&mut Account> {
        self.accounts.get_mut(account_number)
    }

    pub fn contains(&self, account_number: &str) -> bool {
        self.accounts.contains_key(account_number)
    }

    /// All accounts in account-number order.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn by_category(&self, category: AccountCategory) -> impl Iterator<Item = &Account> {
        self.accounts
            .values()
            .filter(move |a| a.category() == category)
    }

    pub fn children(&self, account_number: &str) -> Vec<&Account> {
        self.accounts
            .values()
            .filter(|a| a.parent_account.as_deref() == Some(account_number))
            .collect()
    }

    pub fn descendants(&self, account_number: &str) -> Vec<&Account> {
        let mut out = Vec::new();
        let mut stack = vec![account_number];
        while let Some(current) = stack.pop() {
            for child in self.children(current) {
                stack.push(&child.account_number);
                out.push(child);
            }
        }
        out.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        out
    }

    /// Own balance plus every descendant's balance.
    pub fn rollup_balance(&self, account_number: &str) -> Option<Decimal> {
        let own = self.accounts.get(account_number)?.balance;
        self.descendants(account_number)
            .into_iter()
            .try_fold(own, |acc, a| acc.checked_add(a.balance))
    }

    /// Sum of balances for one category (header accounts excluded).
    ///
    /// Every balance is within [`crate::account::MAX_AMOUNT`], so the sum stays far inside
    /// `Decimal`'s range.
    pub fn category_total(&self, category: AccountCategory) -> Decimal {
        self.by_category(category)
            .filter(|a| !a.is_header)
            .map(|a| a.balance)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
