use ledgerline_core::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::OfxError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Abort on the first anomaly instead of recording a warning.
    pub strict: bool,
    /// Currency assumed when a statement has no usable `CURDEF`.
    pub default_currency: CurrencyCode,
    /// Allowed drift between a reported `RUNNINGBAL` and the computed balance.
    pub balance_tolerance: Decimal,
    /// How much of a transaction's markup is quoted in a warning.
    pub context_chars: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict: false,
            default_currency: CurrencyCode::gbp(),
            balance_tolerance: Decimal::new(1, 2),
            context_chars: 120,
        }
    }
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn lenient() -> Self {
        Self::default()
    }

    pub fn from_toml(toml_content: &str) -> Result<Self, OfxError> {
        Ok(toml::from_str(toml_content)?)
    }
}
