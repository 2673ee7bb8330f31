use roaring::RoaringBitmap;
use crate::core::error::Result;
use crate::index::inverted::MemoryIndex;
use crate::query::ast::{BoolQuery, PrefixQuery, Query, RangeQuery, TermQuery};

/// Evaluates a query against a `MemoryIndex` into the full set of matching documents
pub struct DocumentMatcher<'a> {
    index: &'a MemoryIndex,
}

impl<'a> DocumentMatcher<'a> {
    pub fn new(index: &'a MemoryIndex) -> Self {
        DocumentMatcher { index }
    }

    pub fn matches(&self, query: &Query) -> Result<RoaringBitmap> {
        match query {
            Query::MatchAll => Ok(self.index.all_docs()),
            Query::Term(term_query) => Ok(self.matches_term(term_query)),
            Query::Range(range_query) => Ok(self.matches_range(range_query)),
            Query::Prefix(prefix_query) => Ok(self.matches_prefix(prefix_query)),
            Query::Bool(bool_query) => self.matches_bool(bool_query),
        }
    }

    fn matches_term(&self, term_query: &TermQuery) -> RoaringBitmap {
        self.index
            .search_term(&term_query.field, &term_query.value)
            .cloned()
            .unwrap_or_default()
    }

    fn matches_range(&self, range_query: &RangeQuery) -> RoaringBitmap {
        let mut docs = RoaringBitmap::new();
        if let Some(terms) = self.index.terms(&range_query.field) {
            for (term, postings) in terms {
                if range_query.range.is_match(term) {
                    docs |= postings;
                }
            }
        }
        docs
    }

    fn matches_prefix(&self, prefix_query: &PrefixQuery) -> RoaringBitmap {
        let mut docs = RoaringBitmap::new();
        if let Some(terms) = self.index.terms(&prefix_query.field) {
            // Terms are ordered, so the matches are one contiguous run
            for (_, postings) in terms
                .range(prefix_query.prefix.clone()..)
                .take_while(|(term, _)| term.starts_with(&prefix_query.prefix))
            {
                docs |= postings;
            }
        }
        docs
    }

    fn matches_bool(&self, bool_query: &BoolQuery) -> Result<RoaringBitmap> {
        let mut docs: Option<RoaringBitmap> = None;

        for clause in &bool_query.must {
            let matched = self.matches(clause)?;
            docs = Some(match docs {
                Some(acc) => acc & matched,
                None => matched,
            });
        }

        if !bool_query.should.is_empty() {
            let mut any = RoaringBitmap::new();
            for clause in &bool_query.should {
                any |= self.matches(clause)?;
            }
            // With must clauses present, should clauses only refine scoring, never the match set
            if docs.is_none() {
                docs = Some(any);
            }
        }

        let mut docs = docs.unwrap_or_else(|| self.index.all_docs());
        for clause in &bool_query.must_not {
            docs -= self.matches(clause)?;
        }
        Ok(docs)
    }
}
