use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, ErrorKind, Result};

/// Textual numbers accepted in range bounds: optional sign, digits, optional
/// fraction and exponent, optional type suffix (L, F, D).
static NUMERIC_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d+(\.\d+)?([eE][+-]?\d+)?[LlFfDd]?$").expect("numeric literal pattern is valid")
});

const INT_TAG: char = 'i';
const LONG_TAG: char = 'l';
const FLOAT_TAG: char = 'f';
const DOUBLE_TAG: char = 'd';

/// A typed number as it is indexed in a range field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NumericValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl NumericValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            NumericValue::Int(v) => v as f64,
            NumericValue::Long(v) => v as f64,
            NumericValue::Float(v) => v as f64,
            NumericValue::Double(v) => v,
        }
    }
}

/// Fixed-width, order-preserving string encoding of numbers.
///
/// Each value is a one-character type tag followed by lowercase hex of a
/// sign-adjusted bit pattern, so plain ordinal comparison of two encodings of
/// the same type matches numeric comparison, negatives and fractions included.
pub struct SortableNumeric;

impl SortableNumeric {
    pub fn encode(value: NumericValue) -> String {
        match value {
            NumericValue::Int(v) => Self::encode_int(v),
            NumericValue::Long(v) => Self::encode_long(v),
            NumericValue::Float(v) => Self::encode_float(v),
            NumericValue::Double(v) => Self::encode_double(v),
        }
    }

    pub fn encode_int(value: i32) -> String {
        format!("{}{:08x}", INT_TAG, (value as u32) ^ 0x8000_0000)
    }

    pub fn encode_long(value: i64) -> String {
        format!("{}{:016x}", LONG_TAG, (value as u64) ^ (1 << 63))
    }

    pub fn encode_float(value: f32) -> String {
        let bits = value.to_bits();
        // Negative floats order in reverse, so flip every bit; positives only flip the sign
        let sortable = if bits & 0x8000_0000 != 0 { !bits } else { bits | 0x8000_0000 };
        format!("{}{:08x}", FLOAT_TAG, sortable)
    }

    pub fn encode_double(value: f64) -> String {
        let bits = value.to_bits();
        let sortable = if bits & (1 << 63) != 0 { !bits } else { bits | (1 << 63) };
        format!("{}{:016x}", DOUBLE_TAG, sortable)
    }

    pub fn decode_int(text: &str) -> Result<i32> {
        let raw = Self::payload(text, INT_TAG, 8)?;
        let bits = u32::from_str_radix(raw, 16).map_err(|e| Self::malformed(text, e))?;
        Ok((bits ^ 0x8000_0000) as i32)
    }

    pub fn decode_long(text: &str) -> Result<i64> {
        let raw = Self::payload(text, LONG_TAG, 16)?;
        let bits = u64::from_str_radix(raw, 16).map_err(|e| Self::malformed(text, e))?;
        Ok((bits ^ (1 << 63)) as i64)
    }

    pub fn decode_float(text: &str) -> Result<f32> {
        let raw = Self::payload(text, FLOAT_TAG, 8)?;
        let sortable = u32::from_str_radix(raw, 16).map_err(|e| Self::malformed(text, e))?;
        let bits = if sortable & 0x8000_0000 != 0 { sortable & 0x7fff_ffff } else { !sortable };
        Ok(f32::from_bits(bits))
    }

    pub fn decode_double(text: &str) -> Result<f64> {
        let raw = Self::payload(text, DOUBLE_TAG, 16)?;
        let sortable = u64::from_str_radix(raw, 16).map_err(|e| Self::malformed(text, e))?;
        let bits = if sortable & (1 << 63) != 0 { sortable & !(1 << 63) } else { !sortable };
        Ok(f64::from_bits(bits))
    }

    /// Decode any tagged encoding back to its typed value
    pub fn decode(text: &str) -> Result<NumericValue> {
        match text.chars().next() {
            Some(INT_TAG) => Self::decode_int(text).map(NumericValue::Int),
            Some(LONG_TAG) => Self::decode_long(text).map(NumericValue::Long),
            Some(FLOAT_TAG) => Self::decode_float(text).map(NumericValue::Float),
            Some(DOUBLE_TAG) => Self::decode_double(text).map(NumericValue::Double),
            _ => Err(Error::new(ErrorKind::Parse, format!("Not a sortable numeric: {:?}", text))),
        }
    }

    fn payload(text: &str, tag: char, width: usize) -> Result<&str> {
        match text.strip_prefix(tag) {
            Some(raw) if raw.len() == width => Ok(raw),
            _ => Err(Error::new(
                ErrorKind::Parse,
                format!("Expected '{}' numeric of width {}, got {:?}", tag, width, text),
            )),
        }
    }

    fn malformed(text: &str, err: std::num::ParseIntError) -> Error {
        Error::new(ErrorKind::Parse, format!("Malformed sortable numeric {:?}: {}", text, err))
    }
}

/// True when `text` looks like a number that should be compared in encoded form
pub fn is_numeric_literal(text: &str) -> bool {
    NUMERIC_LITERAL.is_match(text)
}

/// Parse a numeric literal into the narrowest type that holds it.
///
/// Suffixes force a type (`L` long, `F` float, `D` double). Without one,
/// fractional or exponent forms are doubles and integers are `Int` when they
/// fit in 32 bits, `Long` otherwise.
pub fn parse_numeric_literal(text: &str) -> Option<NumericValue> {
    if !is_numeric_literal(text) {
        return None;
    }

    let (body, suffix) = match text.chars().last() {
        Some(c) if c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E') => {
            (&text[..text.len() - 1], Some(c.to_ascii_uppercase()))
        }
        _ => (text, None),
    };

    match suffix {
        Some('L') => body.parse::<i64>().ok().map(NumericValue::Long),
        Some('F') => body.parse::<f32>().ok().map(NumericValue::Float),
        Some('D') => body.parse::<f64>().ok().map(NumericValue::Double),
        _ => {
            if body.contains(['.', 'e', 'E']) {
                return body.parse::<f64>().ok().map(NumericValue::Double);
            }
            if let Ok(v) = body.parse::<i32>() {
                return Some(NumericValue::Int(v));
            }
            if let Ok(v) = body.parse::<i64>() {
                return Some(NumericValue::Long(v));
            }
            body.parse::<f64>().ok().map(NumericValue::Double)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_order_matches_string_order() {
        let values = [i32::MIN, -1000, -1, 0, 1, 10, 20, i32::MAX];
        let encoded: Vec<String> = values.iter().map(|v| SortableNumeric::encode_int(*v)).collect();
        let mut sorted = encoded.clone();
        sorted.sort();
        assert_eq!(encoded, sorted);
    }

    #[test]
    fn test_double_order_with_negatives_and_fractions() {
        let values = [f64::NEG_INFINITY, -2.5, -0.5, 0.0, 0.25, 1.5, 1e10, f64::INFINITY];
        let encoded: Vec<String> = values.iter().map(|v| SortableNumeric::encode_double(*v)).collect();
        let mut sorted = encoded.clone();
        sorted.sort();
        assert_eq!(encoded, sorted);
    }

    #[test]
    fn test_round_trips() {
        assert_eq!(SortableNumeric::decode_int(&SortableNumeric::encode_int(-42)).unwrap(), -42);
        assert_eq!(SortableNumeric::decode_long(&SortableNumeric::encode_long(i64::MIN)).unwrap(), i64::MIN);
        assert_eq!(SortableNumeric::decode_float(&SortableNumeric::encode_float(-3.75)).unwrap(), -3.75);
        assert_eq!(SortableNumeric::decode_double(&SortableNumeric::encode_double(2.5e-8)).unwrap(), 2.5e-8);
    }

    #[test]
    fn test_decode_rejects_wrong_tag_or_width() {
        let int_text = SortableNumeric::encode_int(5);
        assert!(SortableNumeric::decode_long(&int_text).is_err());
        assert!(SortableNumeric::decode_int("i123").is_err());
        assert!(SortableNumeric::decode_int("izzzzzzzz").is_err());
        assert!(SortableNumeric::decode("hello").is_err());
    }

    #[test]
    fn test_literal_type_selection() {
        assert_eq!(parse_numeric_literal("10"), Some(NumericValue::Int(10)));
        assert_eq!(parse_numeric_literal("-7"), Some(NumericValue::Int(-7)));
        assert_eq!(parse_numeric_literal("3000000000"), Some(NumericValue::Long(3_000_000_000)));
        assert_eq!(parse_numeric_literal("5L"), Some(NumericValue::Long(5)));
        assert_eq!(parse_numeric_literal("1.5"), Some(NumericValue::Double(1.5)));
        assert_eq!(parse_numeric_literal("1.5F"), Some(NumericValue::Float(1.5)));
        assert_eq!(parse_numeric_literal("2D"), Some(NumericValue::Double(2.0)));
        assert_eq!(parse_numeric_literal("1e3"), Some(NumericValue::Double(1000.0)));
        assert_eq!(parse_numeric_literal("abc"), None);
        assert_eq!(parse_numeric_literal("NULL"), None);
        assert_eq!(parse_numeric_literal("*"), None);
    }
}
