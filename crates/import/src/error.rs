use chrono::NaiveDate;
use ledgerline_core::DateWindow;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OfxError {
    #[error("Missing <OFX> root element")]
    MissingOfxRoot,
    #[error("No STMTRS or CCSTMTRS statement found")]
    MissingStatement,
    #[error("Failed to read OFX markup: {0}")]
    Markup(String),
    #[error("Strict mode: {0}")]
    Anomaly(#[from] Anomaly),
    #[error("Invalid parser configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// A recoverable defect in a statement. Lenient parsing records the message
/// as a warning and carries on; strict parsing stops at the first one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Anomaly {
    #[error("{field} missing or unparsable ({}) {}; transaction dropped: {context}", shown(.value), at(.line))]
    UnusableTransaction {
        field: &'static str,
        value: Option<String>,
        line: Option<usize>,
        context: String,
    },
    #[error("DTPOSTED {date} outside statement window {window} {}", at(.line))]
    OutsideWindow {
        date: NaiveDate,
        window: DateWindow,
        line: Option<usize>,
    },
    #[error("TRNTYPE missing {}; using UNKNOWN", at(.line))]
    MissingTransactionType { line: Option<usize> },
    #[error("MEMO missing {}; using N/A", at(.line))]
    MissingMemo { line: Option<usize> },
    #[error("No account block in statement; using placeholder account 00000000")]
    MissingAccount,
    #[error("ACCTID missing in {element}; using 00000000")]
    MissingAccountNumber { element: String },
    #[error("RUNNINGBAL mismatch {}: expected {expected}, file reports {reported}", at(.line))]
    BalanceMismatch {
        expected: Decimal,
        reported: Decimal,
        line: Option<usize>,
    },
    #[error("{field} has unparsable date '{value}'")]
    InvalidDate { field: &'static str, value: String },
    #[error("{field} year out of range in '{value}'; clamped to {clamped}")]
    DateOutOfRange {
        field: &'static str,
        value: String,
        clamped: NaiveDate,
    },
}

pub(crate) fn markup<E: std::fmt::Display>(e: E) -> OfxError {
    OfxError::Markup(e.to_string())
}

fn at(line: &Option<usize>) -> String {
    match line {
        Some(n) => format!("at line {n}"),
        None => "at unknown line".to_string(),
    }
}

fn shown(value: &Option<String>) -> String {
    match value {
        Some(v) => format!("'{v}'"),
        None => "absent".to_string(),
    }
}
