//! Builds domain values from the outer markup of a single element.

use chrono::NaiveDate;
use ledgerline_core::{
    Account, CurrencyCode, DateWindow, Extensions, Ledger, Money, Transaction, TransactionType,
    DEFAULT_ACCOUNT_NAME,
};
use tracing::debug;

use crate::config::ParseOptions;
use crate::cursor::SourcePosition;
use crate::diagnostics::Diagnostics;
use crate::error::{Anomaly, OfxError};
use crate::normalize::{normalize_amount, normalize_date, transaction_type};
use crate::tree::Element;
use crate::util::truncate_context;

/// Transaction children with a dedicated field; everything else is an extension.
const RESERVED: &[&str] = &[
    "DTPOSTED", "TRNAMT", "NAME", "MEMO", "TRNTYPE", "REFNUM", "CHECKNUM", "FITID", "RUNNINGBAL",
];

pub const MEMO_PLACEHOLDER: &str = "N/A";

// ── Account ──────────────────────────────────────────────────────────────────

pub fn extract_account(
    xml: &str,
    currency: &CurrencyCode,
    diag: &mut Diagnostics,
) -> Result<Account, OfxError> {
    let el = Element::parse(xml)?;

    let number: String = el
        .child_text("ACCTID")
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '*')
        .collect();
    if number.is_empty() {
        diag.report(Anomaly::MissingAccountNumber {
            element: el.name.clone(),
        })?;
    }

    // Card accounts are identified by number alone.
    let sort_code = match el.name.as_str() {
        "CCACCTFROM" => None,
        _ => el.child_text("BANKID"),
    };
    let name = el.child_text("ACCTNAME").unwrap_or(DEFAULT_ACCOUNT_NAME);

    // An empty number becomes the placeholder.
    Ok(Account::new(sort_code, &number, name, currency.clone())
        .with_account_type(el.child_text("ACCTTYPE").map(str::to_string)))
}

// ── Ledger ───────────────────────────────────────────────────────────────────

/// `LEDGERBAL` is optional: anything short of a usable amount and date is `None`.
pub fn extract_ledger(xml: &str, currency: &CurrencyCode) -> Option<Ledger> {
    let el = match Element::parse(xml) {
        Ok(el) => el,
        Err(e) => {
            debug!("ignoring unreadable LEDGERBAL: {e}");
            return None;
        }
    };
    let balance = el.child_text("BALAMT").and_then(|raw| normalize_amount(raw).ok());
    let date = el.child_text("DTASOF").and_then(|raw| normalize_date(raw).ok());
    match (balance, date) {
        (Some(balance), Some(date)) => Some(Ledger {
            balance,
            date: date.date,
            currency: currency.clone(),
        }),
        _ => {
            debug!("ignoring incomplete LEDGERBAL");
            None
        }
    }
}

// ── Dates ────────────────────────────────────────────────────────────────────

/// Date value of a leaf such as `DTSTART`. An empty leaf is simply absent.
pub fn extract_date(
    xml: &str,
    field: &'static str,
    diag: &mut Diagnostics,
) -> Result<Option<NaiveDate>, OfxError> {
    let el = Element::parse(xml)?;
    if el.text.is_empty() {
        return Ok(None);
    }
    match normalize_date(&el.text) {
        Ok(parsed) => {
            if parsed.clamped {
                diag.report(Anomaly::DateOutOfRange {
                    field,
                    value: el.text.clone(),
                    clamped: parsed.date,
                })?;
            }
            Ok(Some(parsed.date))
        }
        Err(_) => {
            diag.report(Anomaly::InvalidDate {
                field,
                value: el.text.clone(),
            })?;
            Ok(None)
        }
    }
}

// ── Transactions ─────────────────────────────────────────────────────────────

/// Extracts one `STMTTRN`. `running` carries the balance from the previous
/// transaction of the same statement and is updated in place.
///
/// Returns `Ok(None)` when a lenient parse drops an unusable record.
pub fn extract_transaction(
    xml: &str,
    window: DateWindow,
    running: &mut Option<Money>,
    position: Option<SourcePosition>,
    options: &ParseOptions,
    diag: &mut Diagnostics,
) -> Result<Option<Transaction>, OfxError> {
    let el = Element::parse(xml)?;
    let line = position.map(|p| p.line);
    let unusable = |field: &'static str, value: Option<&str>| Anomaly::UnusableTransaction {
        field,
        value: value.map(str::to_string),
        line,
        context: truncate_context(xml, options.context_chars),
    };

    let posted_raw = el.child_text("DTPOSTED");
    let posted = match posted_raw.map(normalize_date) {
        Some(Ok(posted)) => posted,
        _ => {
            diag.report(unusable("DTPOSTED", posted_raw))?;
            return Ok(None);
        }
    };
    let amount_raw = el.child_text("TRNAMT");
    let amount = match amount_raw.map(normalize_amount) {
        Some(Ok(amount)) => amount,
        _ => {
            diag.report(unusable("TRNAMT", amount_raw))?;
            return Ok(None);
        }
    };
    if posted.clamped {
        diag.report(Anomaly::DateOutOfRange {
            field: "DTPOSTED",
            value: posted_raw.unwrap_or_default().to_string(),
            clamped: posted.date,
        })?;
    }

    if !window.contains(posted.date) {
        diag.report(Anomaly::OutsideWindow {
            date: posted.date,
            window,
            line,
        })?;
    }

    let transaction_type = match el.child_text("TRNTYPE") {
        Some(code) => transaction_type(code),
        None => {
            diag.report(Anomaly::MissingTransactionType { line })?;
            TransactionType::Unknown
        }
    };

    let memo = match el.child_text("MEMO") {
        Some(memo) => memo.to_string(),
        None => {
            diag.report(Anomaly::MissingMemo { line })?;
            MEMO_PLACEHOLDER.to_string()
        }
    };

    // The file's own balance is trusted going forward, even after a mismatch.
    let reported = el
        .path_text(&["RUNNINGBAL", "BALAMT"])
        .and_then(|raw| normalize_amount(raw).ok());
    *running = match (reported, *running) {
        (Some(reported), Some(prior)) => {
            let expected = prior + amount;
            if !expected.approx_eq(reported, options.balance_tolerance) {
                diag.report(Anomaly::BalanceMismatch {
                    expected: expected.as_decimal(),
                    reported: reported.as_decimal(),
                    line,
                })?;
            }
            Some(reported)
        }
        (Some(reported), None) => Some(reported),
        (None, prior) => Some(prior.map_or(amount, |prior| prior + amount)),
    };

    let mut extensions = Extensions::new();
    for child in el
        .children
        .iter()
        .filter(|c| !RESERVED.contains(&c.name.as_str()))
    {
        extensions.insert(child.name.clone(), child.deep_text());
    }

    let text = |name: &str| el.child_text(name).unwrap_or_default().to_string();
    let description = el
        .child_text("NAME")
        .or_else(|| el.path_text(&["PAYEE", "NAME"]))
        .unwrap_or_default()
        .to_string();

    Ok(Some(Transaction {
        date: posted.date,
        amount,
        description,
        memo,
        transaction_type,
        reference: text("REFNUM"),
        check: text("CHECKNUM"),
        bank_transaction_id: text("FITID"),
        raw: xml.to_string(),
        extensions,
        line,
        byte_offset: position.map(|p| p.byte_offset),
    }))
}
