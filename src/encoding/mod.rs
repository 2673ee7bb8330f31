pub mod numeric;

pub use numeric::{NumericValue, SortableNumeric, is_numeric_literal, parse_numeric_literal};
