pub mod disposal;
pub mod term_cache;
pub mod searcher_state;
pub mod searcher_holder;

pub use disposal::DisposalSignal;
pub use searcher_holder::SearcherHolder;
pub use searcher_state::{SearcherHandle, SearcherState};
pub use term_cache::{DecodedTermCache, FieldTermCache, IndexEntries, StoredValueSet};
