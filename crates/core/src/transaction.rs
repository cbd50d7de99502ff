use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;

/// OFX `TRNTYPE` codes understood by the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Credit,
    Debit,
    Int,
    Div,
    Fee,
    SrvChg,
    Dep,
    Atm,
    Pos,
    Xfer,
    Check,
    Payment,
    Cash,
    DirectDep,
    DirectDebit,
    RepeatPmt,
    Hold,
    Other,
    #[default]
    Unknown,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Credit => "CREDIT",
            TransactionType::Debit => "DEBIT",
            TransactionType::Int => "INT",
            TransactionType::Div => "DIV",
            TransactionType::Fee => "FEE",
            TransactionType::SrvChg => "SRVCHG",
            TransactionType::Dep => "DEP",
            TransactionType::Atm => "ATM",
            TransactionType::Pos => "POS",
            TransactionType::Xfer => "XFER",
            TransactionType::Check => "CHECK",
            TransactionType::Payment => "PAYMENT",
            TransactionType::Cash => "CASH",
            TransactionType::DirectDep => "DIRECTDEP",
            TransactionType::DirectDebit => "DIRECTDEBIT",
            TransactionType::RepeatPmt => "REPEATPMT",
            TransactionType::Hold => "HOLD",
            TransactionType::Other => "OTHER",
            TransactionType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised child elements of a transaction, kept in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extensions(Vec<(String, String)>);

impl Extensions {
    pub fn new() -> Self {
        Extensions(Vec::new())
    }

    /// Inserts or replaces `name`; a replaced entry keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Posting date in UTC; time of day is discarded.
    pub date: NaiveDate,
    pub amount: Money,
    pub description: String,
    pub memo: String,
    pub transaction_type: TransactionType,
    pub reference: String,
    pub check: String,
    /// `FITID`, the institution's identifier for this transaction.
    pub bank_transaction_id: String,
    /// Markup of the `STMTTRN` element as it was read.
    pub raw: String,
    pub extensions: Extensions,
    pub line: Option<usize>,
    pub byte_offset: Option<usize>,
}
