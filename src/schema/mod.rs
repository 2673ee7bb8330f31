pub mod schema;

pub use schema::{
    IndexDefinition, RANGE_FIELD_SUFFIX, SortType, SortTypeLookup, range_field_name,
    resolve_sort_type, strip_range_suffix,
};
