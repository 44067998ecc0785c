//! Kubernetes resource quantities (`512Mi`, `1.5`, `250m`, `1e3`).
//!
//! A [`Quantity`] stores its value as a signed count of nano-units together
//! with the suffix family it was written in. Arithmetic happens on the
//! nano-unit integer, and formatting picks the largest suffix of that family
//! that represents the value exactly, so `100Mi + 80Mi` prints as `180Mi` and
//! `500m + 1` prints as `1500m`.
//!
//! Values finer than one nano-unit are rounded up, like the Kubernetes API
//! server does.

use crate::core::{FlattenError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

const NANOS_PER_UNIT: i128 = 1_000_000_000;

const BINARY_SUFFIXES: [(&str, u32); 6] = [("Ki", 1), ("Mi", 2), ("Gi", 3), ("Ti", 4), ("Pi", 5), ("Ei", 6)];

const DECIMAL_SUFFIXES: [(&str, i32); 10] = [
    ("n", -9),
    ("u", -6),
    ("m", -3),
    ("", 0),
    ("k", 3),
    ("M", 6),
    ("G", 9),
    ("T", 12),
    ("P", 15),
    ("E", 18),
];

/// Suffix family a quantity is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuantityFormat {
    /// Powers of 1024: `Ki`, `Mi`, `Gi`, ...
    BinarySI,
    /// Powers of 1000: `m`, `k`, `M`, `G`, ...
    #[default]
    DecimalSI,
    /// Scientific notation: `1e3`, `5E-3`
    DecimalExponent,
}

/// A parsed resource quantity.
///
/// Equality and ordering compare numeric values only, so `1Ki == 1024`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quantity {
    nanos: i128,
    format: QuantityFormat,
}

impl Quantity {
    /// Parse a quantity string.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| FlattenError::InvalidQuantity {
            value: input.to_string(),
            reason: reason.to_string(),
        };

        let s = input.trim();
        let (negative, s) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            Some(_) => (false, s),
            None => return Err(invalid("empty quantity")),
        };

        let number_len = s.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(s.len());
        let (number, suffix) = s.split_at(number_len);

        let (int_part, frac_part) = match number.split_once('.') {
            Some((i, f)) => (i, f),
            None => (number, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("missing numeric value"));
        }
        if frac_part.contains('.') {
            return Err(invalid("more than one decimal point"));
        }

        let digits = format!("{int_part}{frac_part}");
        let mantissa: i128 = digits.parse().map_err(|_| invalid("numeric value out of range"))?;
        let frac_digits =
            i32::try_from(frac_part.len()).map_err(|_| invalid("too many fractional digits"))?;

        let (format, multiplier, exponent) = parse_suffix(suffix).ok_or_else(|| invalid("unknown suffix"))?;

        // value = mantissa * multiplier * 10^(exponent - frac_digits), in nano-units
        let scaled = mantissa.checked_mul(multiplier).ok_or_else(|| invalid("value out of range"))?;
        let nano_exponent = exponent
            .checked_sub(frac_digits)
            .and_then(|e| e.checked_add(9))
            .ok_or_else(|| invalid("exponent out of range"))?;
        let nanos = scale_pow10(scaled, nano_exponent).ok_or_else(|| invalid("value out of range"))?;

        Ok(Self {
            nanos: if negative { -nanos } else { nanos },
            format,
        })
    }

    /// Zero in decimal format.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.nanos == 0
    }

    #[must_use]
    pub fn format(&self) -> QuantityFormat {
        self.format
    }

    /// Add `other` to `self`.
    ///
    /// The result keeps `self`'s format unless `self` is zero, in which case
    /// it takes `other`'s.
    pub fn add(&mut self, other: &Quantity) {
        if self.is_zero() {
            self.format = other.format;
        }
        self.nanos = self.nanos.saturating_add(other.nanos);
    }
}

/// Suffix to (format, integer multiplier, power of ten).
fn parse_suffix(suffix: &str) -> Option<(QuantityFormat, i128, i32)> {
    if let Some((_, power)) = BINARY_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
        return Some((QuantityFormat::BinarySI, 1024_i128.pow(*power), 0));
    }
    if let Some((_, exp)) = DECIMAL_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
        return Some((QuantityFormat::DecimalSI, 1, *exp));
    }
    let exp = suffix.strip_prefix('e').or_else(|| suffix.strip_prefix('E'))?;
    let exp: i32 = exp.parse().ok()?;
    Some((QuantityFormat::DecimalExponent, 1, exp))
}

/// `value * 10^exp`, rounding away from zero when `exp` is negative.
fn scale_pow10(value: i128, exp: i32) -> Option<i128> {
    if exp >= 0 {
        value.checked_mul(10_i128.checked_pow(exp.unsigned_abs())?)
    } else {
        let divisor = 10_i128.checked_pow(exp.unsigned_abs()).unwrap_or(i128::MAX);
        let quotient = value / divisor;
        Some(if value % divisor == 0 { quotient } else { quotient + 1 })
    }
}

impl FromStr for Quantity {
    type Err = FlattenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.nanos == other.nanos
    }
}

impl Eq for Quantity {}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.nanos.cmp(&other.nanos)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nanos == 0 {
            return write!(f, "0");
        }

        let sign = if self.nanos < 0 { "-" } else { "" };
        let magnitude = self.nanos.unsigned_abs();
        let nanos_per_unit = NANOS_PER_UNIT.unsigned_abs();

        // Binary suffixes only apply to whole values of at least 1024
        if self.format == QuantityFormat::BinarySI
            && magnitude % nanos_per_unit == 0
            && magnitude / nanos_per_unit >= 1024
        {
            let units = magnitude / nanos_per_unit;
            for (suffix, power) in BINARY_SUFFIXES.iter().rev() {
                let divisor = 1024_u128.pow(*power);
                if units % divisor == 0 {
                    return write!(f, "{sign}{}{suffix}", units / divisor);
                }
            }
            return write!(f, "{sign}{units}");
        }

        // Largest multiple-of-three exponent that leaves an integer mantissa
        let (suffix, exp) = DECIMAL_SUFFIXES
            .iter()
            .rev()
            .find(|(_, exp)| magnitude % 10_u128.pow((exp + 9).unsigned_abs()) == 0)
            .map_or(("n", -9), |(s, e)| (*s, *e));
        let mantissa = magnitude / 10_u128.pow((exp + 9).unsigned_abs());

        if self.format == QuantityFormat::DecimalExponent {
            if exp == 0 {
                write!(f, "{sign}{mantissa}")
            } else {
                write!(f, "{sign}{mantissa}e{exp}")
            }
        } else {
            write!(f, "{sign}{mantissa}{suffix}")
        }
    }
}
