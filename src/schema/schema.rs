use std::collections::HashMap;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, Result};

/// Suffix of the parallel field that holds sortable-encoded numeric values
pub const RANGE_FIELD_SUFFIX: &str = "_Range";

/// `Price` -> `Price_Range`; names already carrying the suffix are returned unchanged
pub fn range_field_name(field: &str) -> String {
    if field.ends_with(RANGE_FIELD_SUFFIX) {
        field.to_string()
    } else {
        format!("{}{}", field, RANGE_FIELD_SUFFIX)
    }
}

/// `Price_Range` -> `Some("Price")`
pub fn strip_range_suffix(field: &str) -> Option<&str> {
    field.strip_suffix(RANGE_FIELD_SUFFIX)
}

/// How a field's values were declared for sorting, which decides how its
/// range terms decode back to numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortType {
    None,
    String,
    StringVal,
    Int,
    Long,
    Float,
    Double,
    Byte,
    Short,
    Custom,
}

impl SortType {
    /// Whether range terms of this type can be decoded for numeric aggregation
    pub fn is_numeric(&self) -> bool {
        matches!(self, SortType::None | SortType::Int | SortType::Long | SortType::Float | SortType::Double)
    }
}

impl FromStr for SortType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "None" => Ok(SortType::None),
            "String" => Ok(SortType::String),
            "StringVal" => Ok(SortType::StringVal),
            "Int" => Ok(SortType::Int),
            "Long" => Ok(SortType::Long),
            "Float" => Ok(SortType::Float),
            "Double" => Ok(SortType::Double),
            "Byte" => Ok(SortType::Byte),
            "Short" => Ok(SortType::Short),
            "Custom" => Ok(SortType::Custom),
            other => Err(Error::configuration(format!("Could not understand sort type '{}'", other))),
        }
    }
}

/// Per-field sort-type metadata from the definition store
pub trait SortTypeLookup: Send + Sync {
    fn sort_type(&self, field: &str) -> Option<SortType>;
}

/// Field definitions of one index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub sort_types: HashMap<String, SortType>,
}

impl IndexDefinition {
    pub fn new(name: &str) -> Self {
        IndexDefinition {
            name: name.to_string(),
            sort_types: HashMap::new(),
        }
    }

    pub fn with_sort_type(mut self, field: &str, sort_type: SortType) -> Self {
        self.sort_types.insert(field.to_string(), sort_type);
        self
    }
}

impl SortTypeLookup for IndexDefinition {
    fn sort_type(&self, field: &str) -> Option<SortType> {
        self.sort_types.get(field).copied()
    }
}

/// Sort type used to decode an aggregation field.
///
/// Tries the exact field, then the base field when given a range field, and
/// falls back to `SortType::None` (decoded as `Int`).
pub fn resolve_sort_type(lookup: &dyn SortTypeLookup, field: &str) -> SortType {
    if let Some(sort_type) = lookup.sort_type(field) {
        return sort_type;
    }
    strip_range_suffix(field)
        .and_then(|base| lookup.sort_type(base))
        .unwrap_or(SortType::None)
}
