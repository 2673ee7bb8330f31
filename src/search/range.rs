use std::cmp::Ordering;
use std::fmt;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, Result};
use crate::encoding::numeric::{NumericValue, SortableNumeric, parse_numeric_literal};
use crate::schema::SortType;

const RANGE_SEPARATOR: &str = " TO ";

/// One side-bounded term range, e.g. `[10 TO 20}`.
///
/// Bracket convention is inverted from the usual notation: `[` and `]` are
/// EXCLUSIVE, `{` and `}` are INCLUSIVE. Numeric bounds are stored in
/// sortable-encoded form so they compare correctly against range-field terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRange {
    pub field: String,
    pub range_text: String,
    pub low: Option<String>,
    pub high: Option<String>,
    pub low_inclusive: bool,
    pub high_inclusive: bool,
}

pub struct RangeParser;

impl RangeParser {
    /// Parse with bounds typed by how they are written
    pub fn parse(field: &str, range_text: &str) -> Result<ParsedRange> {
        Self::parse_typed(field, range_text, SortType::None)
    }

    /// Parse with numeric bounds encoded as `sort_type`, the way the field is indexed.
    ///
    /// Int and Long fields reject fractional or out-of-range bounds. Sort types
    /// without a numeric encoding fall back to the literal's own type.
    pub fn parse_typed(field: &str, range_text: &str, sort_type: SortType) -> Result<ParsedRange> {
        let (low_side, high_side) = range_text
            .split_once(RANGE_SEPARATOR)
            .ok_or_else(|| Self::not_understood(field, range_text))?;

        let low_side = low_side.trim();
        let high_side = high_side.trim();
        if low_side.is_empty() || high_side.is_empty() || high_side.contains(RANGE_SEPARATOR) {
            return Err(Self::not_understood(field, range_text));
        }

        let mut low_chars = low_side.chars();
        let open = low_chars.next().ok_or_else(|| Self::not_understood(field, range_text))?;
        let low_raw = low_chars.as_str();

        let mut high_chars = high_side.chars();
        let close = high_chars.next_back().ok_or_else(|| Self::not_understood(field, range_text))?;
        let high_raw = high_chars.as_str();

        Ok(ParsedRange {
            field: field.to_string(),
            range_text: range_text.to_string(),
            low_inclusive: Self::is_inclusive(field, range_text, open)?,
            high_inclusive: Self::is_inclusive(field, range_text, close)?,
            low: Self::bound(field, range_text, low_raw, sort_type)?,
            high: Self::bound(field, range_text, high_raw, sort_type)?,
        })
    }

    fn is_inclusive(field: &str, range_text: &str, ch: char) -> Result<bool> {
        match ch {
            '[' | ']' => Ok(false),
            '{' | '}' => Ok(true),
            _ => Err(Error::configuration(format!(
                "Could not understand range prefix '{}' in range '{}' of facet {}",
                ch, range_text, field
            ))),
        }
    }

    fn bound(field: &str, range_text: &str, raw: &str, sort_type: SortType) -> Result<Option<String>> {
        if raw == "NULL" || raw == "*" {
            return Ok(None);
        }
        let Some(number) = parse_numeric_literal(raw) else {
            return Ok(Some(raw.to_string()));
        };

        let invalid = || {
            Error::configuration(format!(
                "Range bound '{}' is not a valid {:?} in range '{}' of facet {}",
                raw, sort_type, range_text, field
            ))
        };
        let encoded = match sort_type {
            SortType::Int => {
                let value = Self::integral(number).ok_or_else(invalid)?;
                SortableNumeric::encode_int(i32::try_from(value).map_err(|_| invalid())?)
            }
            SortType::Long => SortableNumeric::encode_long(Self::integral(number).ok_or_else(invalid)?),
            SortType::Float => SortableNumeric::encode_float(number.as_f64() as f32),
            SortType::Double => SortableNumeric::encode_double(number.as_f64()),
            _ => SortableNumeric::encode(number),
        };
        Ok(Some(encoded))
    }

    /// Whole-number value of a literal, `None` when it has a fraction or overflows i64
    fn integral(number: NumericValue) -> Option<i64> {
        match number {
            NumericValue::Int(v) => Some(i64::from(v)),
            NumericValue::Long(v) => Some(v),
            NumericValue::Float(_) | NumericValue::Double(_) => {
                let v = number.as_f64();
                (v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64).then_some(v as i64)
            }
        }
    }

    fn not_understood(field: &str, range_text: &str) -> Error {
        Error::configuration(format!(
            "Could not understand range query '{}' of facet {}",
            range_text, field
        ))
    }
}

impl ParsedRange {
    /// Ordinal comparison of `value` against both bounds
    pub fn is_match(&self, value: &str) -> bool {
        if let Some(low) = &self.low {
            match value.cmp(low.as_str()) {
                Ordering::Less => return false,
                Ordering::Equal if !self.low_inclusive => return false,
                _ => {}
            }
        }
        if let Some(high) = &self.high {
            match value.cmp(high.as_str()) {
                Ordering::Greater => return false,
                Ordering::Equal if !self.high_inclusive => return false,
                _ => {}
            }
        }
        true
    }
}

impl fmt::Display for ParsedRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.range_text)
    }
}
