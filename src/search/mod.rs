pub mod range;
pub mod facets;
pub mod results;
pub mod facet_executor;

pub use facet_executor::FacetExecutor;
pub use facets::{FacetAggregation, FacetDefinition, FacetMode, FacetQuery, TermSortMode};
pub use range::{ParsedRange, RangeParser};
pub use results::{FacetResult, FacetResults, FacetValue};
