use std::sync::Arc;
use roaring::RoaringBitmap;
use crate::core::error::Result;
use crate::core::types::DocId;
use crate::query::ast::IndexQuery;

/// One immutable generation of the full-text index.
///
/// Implemented by the index engine; this crate only reads through it. A view
/// is closed exactly once, after the last reader of its generation lets go.
pub trait IndexView: Send + Sync {
    /// One past the highest document number in this generation
    fn max_doc(&self) -> u32;

    /// Every indexed field name
    fn fields(&self) -> Vec<String>;

    /// Run a query with no top-N truncation and return every matching document
    fn search(&self, query: &IndexQuery) -> Result<RoaringBitmap>;

    /// Walk the postings of one field, calling `visit(term, doc)` for every pair
    fn for_each_term(&self, field: &str, visit: &mut dyn FnMut(&str, DocId)) -> Result<()>;

    /// Stored values of `field` for one document
    fn stored_values(&self, doc: DocId, field: &str) -> Result<Vec<String>>;

    /// Release the resources backing this generation
    fn close(&self) -> Result<()>;
}

/// Source of a new generation on index commit.
///
/// Opening may fail, in which case the holder keeps serving the previous
/// generation.
pub trait IndexOpener {
    fn open(&self) -> Result<Arc<dyn IndexView>>;
}

impl<F> IndexOpener for F
where
    F: Fn() -> Result<Arc<dyn IndexView>>,
{
    fn open(&self) -> Result<Arc<dyn IndexView>> {
        self()
    }
}
