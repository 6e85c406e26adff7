//! Resource quantity value objects.
//!
//! Deployment configs express CPU and memory the Kubernetes way: `"500m"`,
//! `"0.5"`, `"1Gi"`, `"256M"`. [`CpuQuantity`] and [`MemoryQuantity`] parse
//! and validate those strings once, at the edge, and carry both the raw
//! accepted form and the normalized magnitude.
//!
//! Equality is by the raw accepted string, not by magnitude:
//! `CpuQuantity::parse("500m")` and `CpuQuantity::parse("0.5")` both mean
//! 500 milli-cores but compare unequal. Vendors receive exactly the string
//! the operator wrote, so two spellings of the same magnitude are distinct
//! values.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

static CPU_CORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]{1,3})?$").expect("valid regex"));
static CPU_MILLIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+m$").expect("valid regex"));
static MEMORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)([A-Za-z]*)$").expect("valid regex"));

/// Errors raised while parsing a resource quantity string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidQuantity {
    /// The input was empty or whitespace only.
    #[error("quantity must not be blank")]
    Blank,
    /// The input does not match the accepted grammar.
    #[error("unrecognized quantity: {0:?}")]
    Grammar(String),
    /// The input parsed to zero.
    #[error("quantity must be positive: {0:?}")]
    NonPositive(String),
    /// The magnitude does not fit the value range.
    #[error("quantity out of range: {0:?}")]
    Overflow(String),
}

/// An amount of CPU, normalized to milli-cores.
///
/// Accepted forms are decimal cores with at most milli precision (`"1"`,
/// `"0.5"`, `"0.125"`) and the explicit milli form (`"500m"`). Zero and
/// sub-milli fractions are rejected.
#[derive(Debug, Clone)]
pub struct CpuQuantity {
    raw: String,
    millis: u64,
}

impl CpuQuantity {
    /// Parses a CPU quantity string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidQuantity`] for blank input, grammar mismatch, zero,
    /// or a magnitude that does not fit in milli-cores.
    pub fn parse(input: &str) -> Result<Self, InvalidQuantity> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(InvalidQuantity::Blank);
        }
        let millis = if let Some(digits) = raw.strip_suffix('m') {
            if !CPU_MILLIS.is_match(raw) {
                return Err(InvalidQuantity::Grammar(raw.to_string()));
            }
            digits
                .parse::<u64>()
                .map_err(|_| InvalidQuantity::Overflow(raw.to_string()))?
        } else {
            if !CPU_CORES.is_match(raw) {
                return Err(InvalidQuantity::Grammar(raw.to_string()));
            }
            let (whole, frac) = raw.split_once('.').unwrap_or((raw, ""));
            let whole = whole
                .parse::<u64>()
                .map_err(|_| InvalidQuantity::Overflow(raw.to_string()))?;
            // Fraction has 1..=3 digits; right-pad to milli precision.
            let frac_millis = if frac.is_empty() {
                0
            } else {
                format!("{frac:0<3}")
                    .parse::<u64>()
                    .map_err(|_| InvalidQuantity::Overflow(raw.to_string()))?
            };
            whole
                .checked_mul(1000)
                .and_then(|w| w.checked_add(frac_millis))
                .ok_or_else(|| InvalidQuantity::Overflow(raw.to_string()))?
        };
        if millis == 0 {
            return Err(InvalidQuantity::NonPositive(raw.to_string()));
        }
        Ok(Self {
            raw: raw.to_string(),
            millis,
        })
    }

    /// The normalized magnitude in milli-cores.
    pub fn millis(&self) -> u64 {
        self.millis
    }

    /// The raw accepted string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns `self` when `other` is absent, blank, or spells the same raw
    /// string; otherwise parses `other` into a new quantity.
    pub fn patch(&self, other: Option<&str>) -> Result<Self, InvalidQuantity> {
        match other.map(str::trim) {
            None => Ok(self.clone()),
            Some(s) if s.is_empty() || s == self.raw => Ok(self.clone()),
            Some(s) => Self::parse(s),
        }
    }
}

impl PartialEq for CpuQuantity {
    /// Raw-string equality: `"500m"` and `"0.5"` are distinct values.
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for CpuQuantity {}

impl Display for CpuQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for CpuQuantity {
    type Err = InvalidQuantity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CpuQuantity::parse(s)
    }
}

impl Serialize for CpuQuantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for CpuQuantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CpuQuantity::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// An amount of memory, normalized to bytes.
///
/// Accepted form is an integer mantissa with an optional case-sensitive
/// unit suffix: decimal `K`/`M`/`G`/`T`/`P`/`E` and binary
/// `Ki`/`Mi`/`Gi`/`Ti`/`Pi`/`Ei`. No fractional mantissa. The byte count
/// must be positive and fit a signed 64-bit integer.
#[derive(Debug, Clone)]
pub struct MemoryQuantity {
    raw: String,
    bytes: u64,
}

fn unit_factor(unit: &str) -> Option<u128> {
    let factor = match unit {
        "" => 1,
        "K" => 1_000,
        "M" => 1_000_000,
        "G" => 1_000_000_000,
        "T" => 1_000_000_000_000,
        "P" => 1_000_000_000_000_000,
        "E" => 1_000_000_000_000_000_000,
        "Ki" => 1 << 10,
        "Mi" => 1 << 20,
        "Gi" => 1 << 30,
        "Ti" => 1u128 << 40,
        "Pi" => 1u128 << 50,
        "Ei" => 1u128 << 60,
        _ => return None,
    };
    Some(factor)
}

impl MemoryQuantity {
    /// Parses a memory quantity string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidQuantity`] for blank input, grammar or unit
    /// mismatch, zero, or a byte count above `i64::MAX`.
    pub fn parse(input: &str) -> Result<Self, InvalidQuantity> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(InvalidQuantity::Blank);
        }
        let captures = MEMORY
            .captures(raw)
            .ok_or_else(|| InvalidQuantity::Grammar(raw.to_string()))?;
        let mantissa = captures[1]
            .parse::<u128>()
            .map_err(|_| InvalidQuantity::Overflow(raw.to_string()))?;
        let factor =
            unit_factor(&captures[2]).ok_or_else(|| InvalidQuantity::Grammar(raw.to_string()))?;
        let bytes = mantissa
            .checked_mul(factor)
            .filter(|bytes| *bytes <= i64::MAX as u128)
            .ok_or_else(|| InvalidQuantity::Overflow(raw.to_string()))?;
        if bytes == 0 {
            return Err(InvalidQuantity::NonPositive(raw.to_string()));
        }
        Ok(Self {
            raw: raw.to_string(),
            bytes: bytes as u64,
        })
    }

    /// The normalized magnitude in bytes.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// The raw accepted string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns `self` when `other` is absent, blank, or spells the same raw
    /// string; otherwise parses `other` into a new quantity.
    pub fn patch(&self, other: Option<&str>) -> Result<Self, InvalidQuantity> {
        match other.map(str::trim) {
            None => Ok(self.clone()),
            Some(s) if s.is_empty() || s == self.raw => Ok(self.clone()),
            Some(s) => Self::parse(s),
        }
    }
}

impl PartialEq for MemoryQuantity {
    /// Raw-string equality: `"1Gi"` and `"1073741824"` are distinct values.
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for MemoryQuantity {}

impl Display for MemoryQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for MemoryQuantity {
    type Err = InvalidQuantity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MemoryQuantity::parse(s)
    }
}

impl Serialize for MemoryQuantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for MemoryQuantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        MemoryQuantity::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_accepts_core_and_milli_forms() {
        assert_eq!(CpuQuantity::parse("1").unwrap().millis(), 1000);
        assert_eq!(CpuQuantity::parse("0.5").unwrap().millis(), 500);
        assert_eq!(CpuQuantity::parse("0.125").unwrap().millis(), 125);
        assert_eq!(CpuQuantity::parse("500m").unwrap().millis(), 500);
        assert_eq!(CpuQuantity::parse("0.001").unwrap().millis(), 1);
    }

    #[test]
    fn cpu_rejects_invalid_forms() {
        assert_eq!(
            CpuQuantity::parse("0.0001").unwrap_err(),
            InvalidQuantity::Grammar("0.0001".to_string())
        );
        assert_eq!(
            CpuQuantity::parse("0").unwrap_err(),
            InvalidQuantity::NonPositive("0".to_string())
        );
        assert_eq!(
            CpuQuantity::parse("0m").unwrap_err(),
            InvalidQuantity::NonPositive("0m".to_string())
        );
        assert!(matches!(
            CpuQuantity::parse("-1").unwrap_err(),
            InvalidQuantity::Grammar(_)
        ));
        assert!(matches!(
            CpuQuantity::parse("1.5.5").unwrap_err(),
            InvalidQuantity::Grammar(_)
        ));
        assert!(matches!(
            CpuQuantity::parse("1m500").unwrap_err(),
            InvalidQuantity::Grammar(_)
        ));
        assert_eq!(CpuQuantity::parse("").unwrap_err(), InvalidQuantity::Blank);
        assert_eq!(
            CpuQuantity::parse("   ").unwrap_err(),
            InvalidQuantity::Blank
        );
    }

    #[test]
    fn cpu_equality_is_by_raw_string() {
        // Both spell 500 milli-cores, but they are distinct values: vendors
        // receive the exact string the operator wrote.
        let milli = CpuQuantity::parse("500m").unwrap();
        let decimal = CpuQuantity::parse("0.5").unwrap();
        assert_eq!(milli.millis(), decimal.millis());
        assert_ne!(milli, decimal);
        assert_eq!(milli, CpuQuantity::parse("500m").unwrap());
    }

    #[test]
    fn cpu_patch_keeps_or_replaces() {
        let base = CpuQuantity::parse("0.5").unwrap();
        assert_eq!(base.patch(None).unwrap(), base);
        assert_eq!(base.patch(Some("")).unwrap(), base);
        assert_eq!(base.patch(Some("0.5")).unwrap(), base);
        let patched = base.patch(Some("500m")).unwrap();
        assert_eq!(patched, CpuQuantity::parse("500m").unwrap());
        assert!(base.patch(Some("1m500")).is_err());
    }

    #[test]
    fn memory_accepts_units() {
        assert_eq!(MemoryQuantity::parse("128").unwrap().bytes(), 128);
        assert_eq!(MemoryQuantity::parse("1K").unwrap().bytes(), 1_000);
        assert_eq!(MemoryQuantity::parse("1M").unwrap().bytes(), 1_000_000);
        assert_eq!(MemoryQuantity::parse("1Gi").unwrap().bytes(), 1 << 30);
        assert_eq!(MemoryQuantity::parse("2Ti").unwrap().bytes(), 2u64 << 40);
        assert_eq!(MemoryQuantity::parse("1E").unwrap().bytes(), 10u64.pow(18));
    }

    #[test]
    fn memory_rejects_invalid_forms() {
        assert_eq!(
            MemoryQuantity::parse("").unwrap_err(),
            InvalidQuantity::Blank
        );
        assert!(matches!(
            MemoryQuantity::parse("1gb").unwrap_err(),
            InvalidQuantity::Grammar(_)
        ));
        assert!(matches!(
            MemoryQuantity::parse("1.5Gi").unwrap_err(),
            InvalidQuantity::Grammar(_)
        ));
        assert!(matches!(
            MemoryQuantity::parse("Gi").unwrap_err(),
            InvalidQuantity::Grammar(_)
        ));
        assert_eq!(
            MemoryQuantity::parse("0Gi").unwrap_err(),
            InvalidQuantity::NonPositive("0Gi".to_string())
        );
    }

    #[test]
    fn memory_rejects_beyond_signed_64_bit() {
        // 8Ei == 2^63, one past i64::MAX.
        assert!(matches!(
            MemoryQuantity::parse("8Ei").unwrap_err(),
            InvalidQuantity::Overflow(_)
        ));
        assert_eq!(
            MemoryQuantity::parse("9223372036854775807").unwrap().bytes(),
            i64::MAX as u64
        );
        assert!(matches!(
            MemoryQuantity::parse("9223372036854775808").unwrap_err(),
            InvalidQuantity::Overflow(_)
        ));
    }

    #[test]
    fn memory_patch_keeps_or_replaces() {
        let base = MemoryQuantity::parse("512Mi").unwrap();
        assert_eq!(base.patch(None).unwrap(), base);
        assert_eq!(base.patch(Some("  ")).unwrap(), base);
        let patched = base.patch(Some("1Gi")).unwrap();
        assert_eq!(patched.bytes(), 1 << 30);
    }
}
