use serde::{Deserialize, Serialize};

use super::account::{Account, Ledger};
use super::money::{CurrencyCode, Money};
use super::period::DateWindow;
use super::transaction::Transaction;

/// Everything extracted from one `STMTRS`/`CCSTMTRS` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementResult {
    pub account: Account,
    pub ledger: Option<Ledger>,
    pub transactions: Vec<Transaction>,
    /// Every substitution or inconsistency recorded in lenient mode, in order.
    pub warnings: Vec<String>,
    pub currency: CurrencyCode,
    pub window: DateWindow,
    /// Running balance after the last transaction, if any transaction was kept.
    pub closing_balance: Option<Money>,
}

impl StatementResult {
    /// Sum of all transaction amounts.
    pub fn net_change(&self) -> Money {
        self.transactions
            .iter()
            .map(|t| t.amount)
            .fold(Money::zero(), |a, b| a + b)
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
