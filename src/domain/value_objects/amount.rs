use crate::domain::errors::ValidationError;
use std::fmt;

/// Smallest amount the savings product accepts for a subscription
pub const MIN_SUBSCRIBE_AMOUNT: f64 = 0.1;

/// Deltas smaller than this are rounding noise from decimal strings
pub const UNCHANGED_TOLERANCE: f64 = 1e-6;

/// Decimal places sent to the exchange
const API_DECIMALS: usize = 8;

/// Strictly positive, finite coin amount that survives [`Amount::to_api_string`]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(f64);

impl Amount {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::MustBeFinite);
        }
        if value <= 0.0 {
            return Err(ValidationError::MustBePositive);
        }
        if api_decimal(value) == "0" {
            return Err(ValidationError::BelowPrecision);
        }
        Ok(Amount(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Total for `count` identical transfers
    pub fn times(&self, count: usize) -> f64 {
        self.0 * count as f64
    }

    /// Decimal string in the form the exchange expects: truncated to 8
    /// places, never above the value, no trailing zeros
    pub fn to_api_string(&self) -> String {
        api_decimal(self.0)
    }
}

fn api_decimal(value: f64) -> String {
    // Extra places absorb binary noise before truncating
    let text = format!("{:.12}", value);
    let cut = match text.find('.') {
        Some(dot) => &text[..dot + 1 + API_DECIMALS],
        None => &text,
    };
    cut.trim_end_matches('0').trim_end_matches('.').to_string()
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}
