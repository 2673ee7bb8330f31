use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// One bucket of a facet: a term or range label with its hits and aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetValue {
    pub range: String,
    pub hits: u64,
    pub value: f64,
}

/// Result of one facet, paged for Default mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetResult {
    pub values: Vec<FacetValue>,
    pub remaining_terms_count: usize,
    pub remaining_hits: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_terms: Option<Vec<String>>,
}

impl FacetResult {
    pub fn value(&self, range: &str) -> Option<&FacetValue> {
        self.values.iter().find(|v| v.range == range)
    }
}

/// Facet name -> result for one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetResults {
    pub results: BTreeMap<String, FacetResult>,
    pub matched_documents: u64,
    pub took_ms: u64,
}

impl FacetResults {
    pub fn get(&self, name: &str) -> Option<&FacetResult> {
        self.results.get(name)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
