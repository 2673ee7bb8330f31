use std::time::Duration;
use serde::{Serialize, Deserialize};
use crate::core::error::Result;
use crate::search::range::{ParsedRange, RangeParser};

/// Structured query produced by the query-parsing layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    Term(TermQuery),         // Exact term in one field
    Range(RangeQuery),       // Term range in one field
    Prefix(PrefixQuery),
    Bool(BoolQuery),         // Boolean combinations
    MatchAll,                // Match all documents
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermQuery {
    pub field: String,
    pub value: String,
}

/// Range over indexed terms, using the same bracket convention as range facets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeQuery {
    pub field: String,
    pub range: ParsedRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixQuery {
    pub field: String,
    pub prefix: String,
}

/// Boolean query with must/should/must_not clauses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolQuery {
    pub must: Vec<Query>,      // All must match (AND)
    pub should: Vec<Query>,    // At least one must match (OR)
    pub must_not: Vec<Query>,  // None must match (NOT)
}

impl Query {
    pub fn term(field: &str, value: &str) -> Self {
        Query::Term(TermQuery {
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    pub fn prefix(field: &str, prefix: &str) -> Self {
        Query::Prefix(PrefixQuery {
            field: field.to_string(),
            prefix: prefix.to_string(),
        })
    }

    pub fn range(field: &str, range_text: &str) -> Result<Self> {
        Ok(Query::Range(RangeQuery {
            field: field.to_string(),
            range: RangeParser::parse(field, range_text)?,
        }))
    }
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_must(mut self, query: Query) -> Self {
        self.must.push(query);
        self
    }

    pub fn with_should(mut self, query: Query) -> Self {
        self.should.push(query);
        self
    }

    pub fn with_must_not(mut self, query: Query) -> Self {
        self.must_not.push(query);
        self
    }
}

/// A parsed query plus its timeout.
///
/// Paging belongs to the facet request, not the query. The timeout is not
/// enforced here; it is handed to the index view as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQuery {
    pub query: Query,
    pub timeout: Option<Duration>,
}

impl IndexQuery {
    pub fn new(query: Query) -> Self {
        IndexQuery {
            query,
            timeout: None,
        }
    }

    pub fn match_all() -> Self {
        Self::new(Query::MatchAll)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
