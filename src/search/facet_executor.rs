use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use roaring::RoaringBitmap;
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::query::ast::IndexQuery;
use crate::reader::searcher_holder::SearcherHolder;
use crate::reader::searcher_state::SearcherHandle;
use crate::schema::{SortType, SortTypeLookup, range_field_name, resolve_sort_type};
use crate::search::facets::{FacetAggregation, FacetDefinition, FacetMode, FacetQuery, TermSortMode};
use crate::search::range::{ParsedRange, RangeParser};
use crate::search::results::{FacetResult, FacetResults, FacetValue};

/// A validated facet with its aggregation field normalized and ranges parsed
struct PreparedFacet<'a> {
    definition: &'a FacetDefinition,
    aggregation_field: Option<String>,
    sort_type: SortType,
    ranges: Vec<ParsedRange>,
}

impl PreparedFacet<'_> {
    fn needs_documents(&self) -> bool {
        self.definition.aggregation != FacetAggregation::Count
    }
}

/// Hits of one term or range, plus the documents whose values are aggregated later
#[derive(Default)]
struct Bucket {
    hits: u64,
    docs: RoaringBitmap,
}

impl Bucket {
    fn add(&mut self, doc: u32, keep_doc: bool) {
        self.hits += 1;
        if keep_doc {
            self.docs.insert(doc);
        }
    }
}

enum Buckets {
    Terms(HashMap<Arc<str>, Bucket>),
    Ranges(Vec<Bucket>),
}

impl Buckets {
    fn for_facet(facet: &PreparedFacet) -> Self {
        match facet.definition.mode {
            FacetMode::Default => Buckets::Terms(HashMap::new()),
            FacetMode::Ranges => Buckets::Ranges(facet.ranges.iter().map(|_| Bucket::default()).collect()),
        }
    }

    fn add(&mut self, facet: &PreparedFacet, term: &Arc<str>, doc: u32) {
        let keep_doc = facet.needs_documents();
        match self {
            Buckets::Terms(terms) => {
                terms.entry(Arc::clone(term)).or_default().add(doc, keep_doc);
            }
            Buckets::Ranges(ranges) => {
                for (range, bucket) in facet.ranges.iter().zip(ranges.iter_mut()) {
                    if range.is_match(term) {
                        bucket.add(doc, keep_doc);
                    }
                }
            }
        }
    }
}

/// Computes every facet of a request in one pass over the matched documents.
///
/// Numeric aggregation is deferred until after paging, so buckets that fall
/// off the page are never folded. Decoded values are cached per generation.
/// Any invalid facet aborts the whole request.
pub struct FacetExecutor {
    max_page_size: usize,
    sort_types: Arc<dyn SortTypeLookup>,
}

impl FacetExecutor {
    pub fn new(config: &Config, sort_types: Arc<dyn SortTypeLookup>) -> Self {
        FacetExecutor {
            max_page_size: config.max_page_size,
            sort_types,
        }
    }

    /// Check out the current generation and run `request` against it
    pub fn run(&self, holder: &SearcherHolder, request: &FacetQuery) -> Result<FacetResults> {
        let searcher = holder.check_out()?;
        self.execute(&searcher, &request.query, &request.facets, request.start, request.page_size)
    }

    pub fn execute(
        &self,
        searcher: &SearcherHandle,
        query: &IndexQuery,
        facets: &[FacetDefinition],
        start: usize,
        page_size: Option<usize>,
    ) -> Result<FacetResults> {
        let started = Instant::now();
        let prepared = self.prepare(facets)?;

        let matches = searcher.view().search(query)?;
        let mut buckets: Vec<Buckets> = prepared.iter().map(Buckets::for_facet).collect();

        // Each field is scanned once no matter how many facets read it
        let mut by_field: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, facet) in prepared.iter().enumerate() {
            by_field.entry(facet.definition.name.as_str()).or_default().push(i);
        }

        for (field, facet_ids) in &by_field {
            searcher.record_facet_usage(field);
            let terms = searcher.get_or_build_term_cache(field)?;
            for doc in matches.iter() {
                for term in terms.terms(DocId(doc)) {
                    for &i in facet_ids {
                        buckets[i].add(&prepared[i], term, doc);
                    }
                }
            }
        }

        let mut results = BTreeMap::new();
        for (facet, facet_buckets) in prepared.iter().zip(buckets) {
            let result = match facet_buckets {
                Buckets::Terms(terms) => self.finish_terms(searcher, facet, terms, start, page_size)?,
                Buckets::Ranges(ranges) => Self::finish_ranges(searcher, facet, ranges)?,
            };
            results.insert(facet.definition.name.clone(), result);
        }

        let took_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(
            target: "gendex::facets",
            generation = searcher.generation(),
            facets = facets.len(),
            fields = by_field.len(),
            matched = matches.len(),
            took_ms,
            "Facet request executed"
        );

        Ok(FacetResults {
            results,
            matched_documents: matches.len(),
            took_ms,
        })
    }

    fn prepare<'a>(&self, facets: &'a [FacetDefinition]) -> Result<Vec<PreparedFacet<'a>>> {
        let mut sort_type_cache: HashMap<String, SortType> = HashMap::new();
        let mut prepared = Vec::with_capacity(facets.len());

        for definition in facets {
            if definition.name.is_empty() {
                return Err(Error::configuration("Facet definition has no field name"));
            }

            let mut aggregation_field = None;
            let mut sort_type = SortType::None;
            if definition.aggregation != FacetAggregation::Count {
                let field = definition
                    .aggregation_field
                    .as_deref()
                    .filter(|f| !f.trim().is_empty())
                    .ok_or_else(|| {
                        Error::configuration(format!(
                            "Facet {} uses {} aggregation but has no aggregation field",
                            definition.name, definition.aggregation
                        ))
                    })?;
                let field = range_field_name(field);

                sort_type = *sort_type_cache
                    .entry(field.clone())
                    .or_insert_with(|| resolve_sort_type(self.sort_types.as_ref(), &field));
                if !sort_type.is_numeric() {
                    return Err(Error::configuration(format!(
                        "Facet {} cannot apply {} aggregation over field {} with sort type {:?}",
                        definition.name, definition.aggregation, field, sort_type
                    )));
                }
                aggregation_field = Some(field);
            }

            let ranges = match definition.mode {
                FacetMode::Default => Vec::new(),
                FacetMode::Ranges => {
                    // Bounds are encoded the way the facet field itself is indexed
                    let field_type = *sort_type_cache
                        .entry(definition.name.clone())
                        .or_insert_with(|| resolve_sort_type(self.sort_types.as_ref(), &definition.name));
                    definition
                        .ranges
                        .iter()
                        .map(|text| RangeParser::parse_typed(&definition.name, text, field_type))
                        .collect::<Result<Vec<_>>>()?
                }
            };

            prepared.push(PreparedFacet {
                definition,
                aggregation_field,
                sort_type,
                ranges,
            });
        }

        Ok(prepared)
    }

    fn finish_terms(
        &self,
        searcher: &SearcherHandle,
        facet: &PreparedFacet,
        terms: HashMap<Arc<str>, Bucket>,
        start: usize,
        page_size: Option<usize>,
    ) -> Result<FacetResult> {
        if terms.is_empty() {
            return Ok(FacetResult::default());
        }

        let mut sorted: Vec<(Arc<str>, Bucket)> = terms.into_iter().collect();
        sort_terms(&mut sorted, facet.definition.term_sort_mode);

        let max_results = page_size
            .or(facet.definition.max_results)
            .unwrap_or(self.max_page_size)
            .min(self.max_page_size);
        let page_start = start.min(sorted.len());
        let page_end = page_start.saturating_add(max_results).min(sorted.len());

        let total_hits: u64 = sorted.iter().map(|(_, b)| b.hits).sum();
        let skipped_hits: u64 = sorted[..page_start].iter().map(|(_, b)| b.hits).sum();

        let mut values = Vec::with_capacity(page_end - page_start);
        let mut page_hits = 0;
        for (term, bucket) in &sorted[page_start..page_end] {
            page_hits += bucket.hits;
            values.push(FacetValue {
                range: term.to_string(),
                hits: bucket.hits,
                value: aggregate(searcher, facet, bucket)?,
            });
        }

        let remaining_terms = facet
            .definition
            .include_remaining_terms
            .then(|| sorted[page_end..].iter().map(|(term, _)| term.to_string()).collect());

        Ok(FacetResult {
            values,
            remaining_terms_count: sorted.len() - page_end,
            remaining_hits: total_hits - skipped_hits - page_hits,
            remaining_terms,
        })
    }

    fn finish_ranges(searcher: &SearcherHandle, facet: &PreparedFacet, ranges: Vec<Bucket>) -> Result<FacetResult> {
        let mut values = Vec::with_capacity(ranges.len());
        for (range, bucket) in facet.ranges.iter().zip(&ranges) {
            values.push(FacetValue {
                range: range.range_text.clone(),
                hits: bucket.hits,
                value: aggregate(searcher, facet, bucket)?,
            });
        }

        Ok(FacetResult {
            values,
            ..Default::default()
        })
    }
}

fn sort_terms(terms: &mut [(Arc<str>, Bucket)], mode: TermSortMode) {
    terms.sort_by(|(a_term, a), (b_term, b)| -> Ordering {
        match mode {
            TermSortMode::ValueAsc => a_term.cmp(b_term).then(a.hits.cmp(&b.hits)),
            TermSortMode::ValueDesc => b_term.cmp(a_term).then(a.hits.cmp(&b.hits)),
            TermSortMode::HitsAsc => a.hits.cmp(&b.hits).then_with(|| a_term.cmp(b_term)),
            TermSortMode::HitsDesc => b.hits.cmp(&a.hits).then_with(|| a_term.cmp(b_term)),
        }
    });
}

/// Fold the bucket's deferred documents over the aggregation field's decoded values
fn aggregate(searcher: &SearcherHandle, facet: &PreparedFacet, bucket: &Bucket) -> Result<f64> {
    let aggregation = facet.definition.aggregation;
    let field = match (&facet.aggregation_field, aggregation) {
        (_, FacetAggregation::Count) | (None, _) => return Ok(bucket.hits as f64),
        (Some(field), _) => field,
    };

    let values = searcher
        .get_or_build_decoded_terms(field, facet.sort_type)
        .map_err(|e| match e.kind {
            ErrorKind::Parse => Error::new(
                ErrorKind::Parse,
                format!("Facet {} could not read {} value: {}", facet.definition.name, field, e.context),
            ),
            _ => e,
        })?;
    let mut sum = 0.0;
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    let mut folded = 0usize;

    for doc in bucket.docs.iter() {
        for &value in values.values(DocId(doc)) {
            sum += value;
            min = min.min(value);
            max = max.max(value);
            folded += 1;
        }
    }

    Ok(match aggregation {
        FacetAggregation::Count => bucket.hits as f64,
        FacetAggregation::Sum => sum,
        FacetAggregation::Average if bucket.hits == 0 => f64::NAN,
        FacetAggregation::Average => sum / bucket.hits as f64,
        FacetAggregation::Min | FacetAggregation::Max if folded == 0 => 0.0,
        FacetAggregation::Min => min,
        FacetAggregation::Max => max,
    })
}
