//! Pure conversions from raw OFX field text to canonical values.
//!
//! Nothing here records diagnostics: callers decide whether a failure or a
//! clamped value is worth a warning.

use chrono::{Datelike, NaiveDate, NaiveTime, TimeDelta};
use ledgerline_core::{CurrencyCode, Money, TransactionType, MAX_MAGNITUDE};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::util::re;

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Invalid amount: '{0}'")]
    InvalidAmount(String),
    #[error("Invalid date: '{0}'")]
    InvalidDate(String),
}

re!(re_numeric, r"^-?(?:\d+\.?\d*|\.\d+)$");
re!(re_ofx_date,
    r"^(\d{4})(\d{2})(\d{2})((?:\d{2}){1,3})?(?:\.\d{1,6})?\s*(?:\[\s*([+-]?\d{1,2})(?:[.:]?(\d{2}))?(?::[^\]]*)?\]|([+-])(\d{2}):?(\d{2})?)?");

// ── Amounts ──────────────────────────────────────────────────────────────────

/// Parses an amount, accepting `(1.00)` and `1.00-` as negatives, and clamps
/// its magnitude to [`MAX_MAGNITUDE`].
pub fn normalize_amount(raw: &str) -> Result<Money, NormalizeError> {
    let invalid = || NormalizeError::InvalidAmount(raw.trim().to_string());

    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    let (negative, body) = if compact.len() >= 2 && compact.starts_with('(') && compact.ends_with(')')
    {
        (true, &compact[1..compact.len() - 1])
    } else if compact.len() >= 2 && compact.ends_with('-') {
        (true, &compact[..compact.len() - 1])
    } else {
        (false, compact.as_str())
    };

    let numeric: String = body
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if !re_numeric().is_match(&numeric) {
        return Err(invalid());
    }
    let numeric = numeric.trim_end_matches('.');

    // A well-formed number too long for Decimal is past the clamp anyway.
    let value = Decimal::from_str(numeric).unwrap_or_else(|_| {
        let limit = Decimal::from(MAX_MAGNITUDE);
        if numeric.starts_with('-') {
            -limit
        } else {
            limit
        }
    });
    let value = if negative { -value.abs() } else { value };

    Ok(Money::clamped(value))
}

// ── Currency ─────────────────────────────────────────────────────────────────

const CURRENCY_ALIASES: &[(&str, &str)] = &[("UKL", "GBP"), ("GBR", "GBP")];

pub fn normalize_currency(raw: &str) -> CurrencyCode {
    normalize_currency_or(raw, &CurrencyCode::gbp())
}

/// Like [`normalize_currency`], with a caller-chosen fallback for unusable input.
pub fn normalize_currency_or(raw: &str, fallback: &CurrencyCode) -> CurrencyCode {
    let letters: String = raw
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let canonical = CURRENCY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == letters)
        .map_or(letters.as_str(), |&(_, code)| code);

    CurrencyCode::new(canonical).unwrap_or_else(|_| fallback.clone())
}

// ── Dates ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedDate {
    pub date: NaiveDate,
    /// The source year fell outside [`MIN_YEAR`, `MAX_YEAR`] and was clamped.
    pub clamped: bool,
}

/// Parses an OFX `YYYYMMDD[HHMMSS[.XXX]][offset]` value into a UTC date.
///
/// Offsets may be bracketed (`[-5:EST]`, `[+5.30:IST]`) or bare (`-0500`).
pub fn normalize_date(raw: &str) -> Result<NormalizedDate, NormalizeError> {
    let raw = raw.trim();
    let invalid = || NormalizeError::InvalidDate(raw.to_string());
    let caps = re_ofx_date().captures(raw).ok_or_else(invalid)?;

    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<i64>().ok());

    let year = num(1).ok_or_else(invalid)? as i32;
    let month = num(2).ok_or_else(invalid)? as u32;
    let day = num(3).ok_or_else(invalid)? as u32;
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;

    let time_digits = caps.get(4).map_or("", |m| m.as_str());
    let field = |i: usize| {
        time_digits
            .get(i..i + 2)
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0)
    };
    let time = NaiveTime::from_hms_opt(field(0), field(2), field(4)).ok_or_else(invalid)?;

    let offset_minutes = if let Some(hours) = caps.get(5) {
        let sign = if hours.as_str().starts_with('-') { -1 } else { 1 };
        let h = num(5).ok_or_else(invalid)?.abs();
        sign * (h * 60 + num(6).unwrap_or(0))
    } else if let Some(sign) = caps.get(7) {
        let sign = if sign.as_str() == "-" { -1 } else { 1 };
        sign * (num(8).unwrap_or(0) * 60 + num(9).unwrap_or(0))
    } else {
        0
    };

    let utc = TimeDelta::try_minutes(offset_minutes)
        .and_then(|delta| date.and_time(time).checked_sub_signed(delta))
        .ok_or_else(invalid)?;

    Ok(clamp_year(utc.date()))
}

fn clamp_year(date: NaiveDate) -> NormalizedDate {
    let bound = if date.year() < MIN_YEAR {
        NaiveDate::from_ymd_opt(MIN_YEAR, 1, 1)
    } else if date.year() > MAX_YEAR {
        NaiveDate::from_ymd_opt(MAX_YEAR, 12, 31)
    } else {
        None
    };
    match bound {
        Some(clamped) => NormalizedDate {
            date: clamped,
            clamped: true,
        },
        None => NormalizedDate {
            date,
            clamped: false,
        },
    }
}

// ── Transaction types ────────────────────────────────────────────────────────

const TRANSACTION_TYPES: &[(&str, TransactionType)] = &[
    ("CREDIT", TransactionType::Credit),
    ("DEBIT", TransactionType::Debit),
    ("INT", TransactionType::Int),
    ("DIV", TransactionType::Div),
    ("FEE", TransactionType::Fee),
    ("SRVCHG", TransactionType::SrvChg),
    ("DEP", TransactionType::Dep),
    ("ATM", TransactionType::Atm),
    ("POS", TransactionType::Pos),
    ("XFER", TransactionType::Xfer),
    ("CHECK", TransactionType::Check),
    ("PAYMENT", TransactionType::Payment),
    ("CASH", TransactionType::Cash),
    ("DIRECTDEP", TransactionType::DirectDep),
    ("DIRECTDEBIT", TransactionType::DirectDebit),
    ("REPEATPMT", TransactionType::RepeatPmt),
    ("HOLD", TransactionType::Hold),
    ("OTHER", TransactionType::Other),
];

/// Maps a `TRNTYPE` code; anything not in the table is `Unknown`.
pub fn transaction_type(code: &str) -> TransactionType {
    let code = code.trim().to_ascii_uppercase();
    TRANSACTION_TYPES
        .iter()
        .find(|(name, _)| *name == code)
        .map_or(TransactionType::Unknown, |(_, t)| *t)
}
