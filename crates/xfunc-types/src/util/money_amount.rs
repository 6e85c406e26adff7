//! Human-readable currency amount parsing and atomic-unit conversion.
//!
//! A price is configured (or computed) as a human-readable decimal string
//! such as `"0.01"` or `"$1,000.50"`. On the wire the x402 protocol speaks
//! in *atomic* token units: `floor(amount × 10^decimals)` rendered as a
//! plain decimal integer string. [`MoneyAmount`] covers both halves.
//!
//! # Example
//!
//! ```rust
//! use xfunc_types::util::MoneyAmount;
//!
//! let amount = MoneyAmount::parse("0.03").unwrap();
//! assert_eq!(amount.atomic(6).unwrap(), "30000");
//! ```

use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

static NON_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d\.\-]+").expect("valid regex"));

mod constants {
    use super::*;

    pub const MIN_STR: &str = "0.000000001";
    pub const MAX_STR: &str = "999999999";

    pub static MIN: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MIN_STR).expect("valid decimal"));
    pub static MAX: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MAX_STR).expect("valid decimal"));
}

/// A non-negative decimal amount parsed from a human-readable string.
///
/// Precision from the input is preserved, so converting to atomic units
/// truncates rather than rounds: `"0.0000001".atomic(6)` is `"0"`.
#[derive(Debug, Clone, PartialEq)]
pub struct MoneyAmount(Decimal);

/// Errors that can occur when parsing or converting a monetary amount.
#[derive(Debug, thiserror::Error)]
pub enum MoneyAmountParseError {
    /// The input string could not be parsed as a number.
    #[error("invalid amount format")]
    InvalidFormat,
    /// The value is outside the allowed range.
    #[error(
        "amount must be between {} and {}",
        constants::MIN_STR,
        constants::MAX_STR
    )]
    OutOfRange,
    /// Negative values are not allowed.
    #[error("negative amount is not allowed")]
    Negative,
    /// The configured token decimals exceed what the conversion supports.
    #[error("unsupported token decimals: {0}")]
    UnsupportedDecimals(u32),
}

impl MoneyAmount {
    /// Parses a human-readable currency string.
    ///
    /// Currency symbols, thousand separators, and whitespace are stripped
    /// before parsing. The result must be a non-negative number within the
    /// allowed range.
    ///
    /// # Errors
    ///
    /// Returns an error if the string cannot be parsed as a number, is
    /// negative, or falls outside the allowed range.
    pub fn parse(input: &str) -> Result<Self, MoneyAmountParseError> {
        let cleaned = NON_NUMERIC.replace_all(input, "");

        let parsed =
            Decimal::from_str(&cleaned).map_err(|_| MoneyAmountParseError::InvalidFormat)?;

        if parsed.is_sign_negative() {
            return Err(MoneyAmountParseError::Negative);
        }

        if parsed < *constants::MIN || parsed > *constants::MAX {
            return Err(MoneyAmountParseError::OutOfRange);
        }

        Ok(MoneyAmount(parsed))
    }

    /// Converts to atomic token units: `floor(amount × 10^decimals)`.
    ///
    /// The result is a plain decimal integer string, no exponent and no
    /// leading zeros (`"0"` when the amount truncates to nothing).
    ///
    /// # Errors
    ///
    /// Returns [`MoneyAmountParseError::UnsupportedDecimals`] for `decimals`
    /// above 18 and [`MoneyAmountParseError::OutOfRange`] on overflow.
    pub fn atomic(&self, decimals: u32) -> Result<String, MoneyAmountParseError> {
        if decimals > 18 {
            return Err(MoneyAmountParseError::UnsupportedDecimals(decimals));
        }
        let factor = 10u64.pow(decimals);
        let scaled = self
            .0
            .checked_mul(Decimal::from(factor))
            .ok_or(MoneyAmountParseError::OutOfRange)?;
        Ok(scaled.trunc().normalize().to_string())
    }
}

impl FromStr for MoneyAmount {
    type Err = MoneyAmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoneyAmount::parse(s)
    }
}

impl Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
