use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, Result};
use crate::query::ast::IndexQuery;

/// How a facet groups matched documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacetMode {
    /// One bucket per distinct term of the facet field
    #[default]
    Default,
    /// One bucket per configured range expression
    Ranges,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacetAggregation {
    #[default]
    Count,
    Sum,
    Average,
    Min,
    Max,
}

/// Ordering of term buckets in Default mode.
///
/// Value sorts break ties on hits ascending, hit sorts break ties on term ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermSortMode {
    #[default]
    ValueAsc,
    ValueDesc,
    HitsAsc,
    HitsDesc,
}

impl FromStr for FacetMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Default" => Ok(FacetMode::Default),
            "Ranges" => Ok(FacetMode::Ranges),
            other => Err(Error::configuration(format!("Could not understand facet mode '{}'", other))),
        }
    }
}

impl FromStr for FacetAggregation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Count" => Ok(FacetAggregation::Count),
            "Sum" => Ok(FacetAggregation::Sum),
            "Average" => Ok(FacetAggregation::Average),
            "Min" => Ok(FacetAggregation::Min),
            "Max" => Ok(FacetAggregation::Max),
            other => Err(Error::configuration(format!("Could not understand facet aggregation '{}'", other))),
        }
    }
}

impl FromStr for TermSortMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ValueAsc" => Ok(TermSortMode::ValueAsc),
            "ValueDesc" => Ok(TermSortMode::ValueDesc),
            "HitsAsc" => Ok(TermSortMode::HitsAsc),
            "HitsDesc" => Ok(TermSortMode::HitsDesc),
            other => Err(Error::configuration(format!("Could not understand term sort mode '{}'", other))),
        }
    }
}

impl fmt::Display for FacetAggregation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One requested facet.
///
/// `name` is the indexed field the facet groups by and also the key of its
/// result. Range facets over numbers name the range variant of the field
/// (`Price_Range`), since that is where sortable-encoded values live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetDefinition {
    pub name: String,
    pub mode: FacetMode,
    pub aggregation: FacetAggregation,
    pub aggregation_field: Option<String>,
    pub ranges: Vec<String>,
    pub term_sort_mode: TermSortMode,
    pub max_results: Option<usize>,
    pub include_remaining_terms: bool,
}

impl Default for FacetDefinition {
    fn default() -> Self {
        FacetDefinition {
            name: String::new(),
            mode: FacetMode::Default,
            aggregation: FacetAggregation::Count,
            aggregation_field: None,
            ranges: Vec::new(),
            term_sort_mode: TermSortMode::ValueAsc,
            max_results: None,
            include_remaining_terms: false,
        }
    }
}

impl FacetDefinition {
    /// Default-mode facet counting terms of `field`
    pub fn terms(field: &str) -> Self {
        FacetDefinition {
            name: field.to_string(),
            ..Default::default()
        }
    }

    /// Ranges-mode facet over `field`
    pub fn ranges<S: AsRef<str>>(field: &str, ranges: &[S]) -> Self {
        FacetDefinition {
            name: field.to_string(),
            mode: FacetMode::Ranges,
            ranges: ranges.iter().map(|r| r.as_ref().to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_aggregation(mut self, aggregation: FacetAggregation, field: &str) -> Self {
        self.aggregation = aggregation;
        self.aggregation_field = Some(field.to_string());
        self
    }

    pub fn with_sort(mut self, sort: TermSortMode) -> Self {
        self.term_sort_mode = sort;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn with_remaining_terms(mut self) -> Self {
        self.include_remaining_terms = true;
        self
    }
}

/// A facet request as it arrives from the request layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetQuery {
    pub query: IndexQuery,
    pub facets: Vec<FacetDefinition>,
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub page_size: Option<usize>,
}

impl FacetQuery {
    pub fn new(query: IndexQuery, facets: Vec<FacetDefinition>) -> Self {
        FacetQuery {
            query,
            facets,
            start: 0,
            page_size: None,
        }
    }

    pub fn with_page(mut self, start: usize, page_size: usize) -> Self {
        self.start = start;
        self.page_size = Some(page_size);
        self
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
