use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use thiserror::Error;

/// Largest magnitude a statement amount may carry; anything beyond is clamped.
pub const MAX_MAGNITUDE: i64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    /// Wraps `value`, clamping its magnitude to [`MAX_MAGNITUDE`] and keeping its sign.
    pub fn clamped(value: Decimal) -> Self {
        let limit = Decimal::from(MAX_MAGNITUDE);
        if value > limit {
            Money(limit)
        } else if value < -limit {
            Money(-limit)
        } else {
            Money(value)
        }
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    /// True when the two values differ by no more than `tolerance`.
    pub fn approx_eq(self, other: Money, tolerance: Decimal) -> bool {
        (self.0 - other.0).abs() <= tolerance
    }
}

impl From<Money> for Decimal {
    fn from(m: Money) -> Self {
        m.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid currency code: '{0}'")]
pub struct CurrencyError(pub String);

/// Three-letter ISO-4217-style currency code, always uppercase ASCII.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub const DEFAULT: &'static str = "GBP";

    pub fn new(code: &str) -> Result<Self, CurrencyError> {
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(CurrencyCode(code.to_string()))
        } else {
            Err(CurrencyError(code.to_string()))
        }
    }

    pub fn gbp() -> Self {
        CurrencyCode(Self::DEFAULT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::gbp()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = CurrencyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        CurrencyCode::new(&s)
    }
}

impl From<CurrencyCode> for String {
    fn from(c: CurrencyCode) -> Self {
        c.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ── Money ─────────────────────────────────────────────────────────────────

    #[test]
    fn clamped_keeps_values_inside_limit() {
        assert_eq!(Money::clamped(dec("-49.99")).as_decimal(), dec("-49.99"));
        assert_eq!(Money::clamped(dec("1000000000")).as_decimal(), dec("1000000000"));
    }

    #[test]
    fn clamped_preserves_sign_beyond_limit() {
        assert_eq!(Money::clamped(dec("1000000000.01")).as_decimal(), dec("1000000000"));
        assert_eq!(Money::clamped(dec("-5000000000")).as_decimal(), dec("-1000000000"));
    }

    #[test]
    fn approx_eq_uses_inclusive_tolerance() {
        let a = Money::clamped(dec("100.00"));
        assert!(a.approx_eq(Money::clamped(dec("100.01")), dec("0.01")));
        assert!(!a.approx_eq(Money::clamped(dec("100.02")), dec("0.01")));
    }

    #[test]
    fn arithmetic_and_display() {
        let total = Money::clamped(dec("10.5")) + Money::clamped(dec("-2.25"));
        assert_eq!(total.to_string(), "8.25");
        assert!((Money::zero() - total).is_negative());
        assert!(!Money::zero().is_negative());
    }

    // ── CurrencyCode ──────────────────────────────────────────────────────────

    #[test]
    fn currency_code_accepts_three_uppercase_letters() {
        assert_eq!(CurrencyCode::new("USD").unwrap().as_str(), "USD");
        assert!(CurrencyCode::new("usd").is_err());
        assert!(CurrencyCode::new("US").is_err());
        assert!(CurrencyCode::new("EUR1").is_err());
    }

    #[test]
    fn currency_code_defaults_to_gbp() {
        assert_eq!(CurrencyCode::default().to_string(), "GBP");
    }

    #[test]
    fn currency_code_serializes_as_plain_string() {
        let json = serde_json::to_string(&CurrencyCode::gbp()).unwrap();
        assert_eq!(json, "\"GBP\"");
        assert!(serde_json::from_str::<CurrencyCode>("\"gb\"").is_err());
    }
}
