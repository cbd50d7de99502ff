use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::{CurrencyCode, Money};

/// Number used when a statement carries no usable account identifier.
pub const PLACEHOLDER_ACCOUNT_NUMBER: &str = "00000000";
pub const DEFAULT_ACCOUNT_NAME: &str = "Default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Bank sort code (`BANKID`); always `None` for credit-card accounts.
    pub sort_code: Option<String>,
    /// Alphanumeric account number; masked digits are kept as `*`.
    pub number: String,
    pub name: String,
    pub currency: CurrencyCode,
    /// Raw `ACCTTYPE` value, e.g. `CHECKING` or `SAVINGS`.
    pub account_type: Option<String>,
}

impl Account {
    pub fn new(sort_code: Option<&str>, number: &str, name: &str, currency: CurrencyCode) -> Self {
        let number = if number.is_empty() {
            PLACEHOLDER_ACCOUNT_NUMBER
        } else {
            number
        };
        Account {
            sort_code: sort_code.map(str::to_string),
            number: number.to_string(),
            name: name.to_string(),
            currency,
            account_type: None,
        }
    }

    /// Stand-in for statements that have no account block at all.
    pub fn placeholder(currency: CurrencyCode) -> Self {
        Account::new(None, PLACEHOLDER_ACCOUNT_NUMBER, DEFAULT_ACCOUNT_NAME, currency)
    }

    pub fn with_account_type(mut self, account_type: Option<String>) -> Self {
        self.account_type = account_type;
        self
    }

    pub fn is_credit_card(&self) -> bool {
        self.sort_code.is_none()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sort_code {
            Some(sort_code) => write!(f, "{} {} ({})", sort_code, self.number, self.name),
            None => write!(f, "{} ({})", self.number, self.name),
        }
    }
}

/// Ledger balance reported by the bank as of a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub balance: Money,
    pub date: NaiveDate,
    pub currency: CurrencyCode,
}
