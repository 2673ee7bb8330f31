use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use crate::core::error::{Error, Result};
use crate::core::types::DocId;
use crate::encoding::numeric::SortableNumeric;
use crate::index::view::IndexView;
use crate::schema::SortType;

/// Terms of one field, grouped per document.
///
/// Built by a single walk over the field's postings so repeat facet queries
/// against the same generation never re-scan them.
#[derive(Debug)]
pub struct FieldTermCache {
    field: String,
    per_doc: Vec<Vec<Arc<str>>>,
    distinct_terms: usize,
}

impl FieldTermCache {
    pub fn build(view: &dyn IndexView, field: &str) -> Result<Self> {
        let mut per_doc: Vec<Vec<Arc<str>>> = vec![Vec::new(); view.max_doc() as usize];
        let mut current: Option<Arc<str>> = None;
        let mut distinct_terms = 0;
        let mut out_of_range = None;

        view.for_each_term(field, &mut |term, doc| {
            // Postings arrive grouped by term, so share one allocation per term
            let shared = match &current {
                Some(t) if &**t == term => t.clone(),
                _ => {
                    let t: Arc<str> = Arc::from(term);
                    current = Some(t.clone());
                    distinct_terms += 1;
                    t
                }
            };
            match per_doc.get_mut(doc.as_index()) {
                Some(terms) => terms.push(shared),
                None => out_of_range = Some(doc),
            }
        })?;

        if let Some(doc) = out_of_range {
            return Err(Error::resource(format!(
                "Field {} has a posting for document {} beyond max_doc {}",
                field,
                doc.0,
                per_doc.len()
            )));
        }

        Ok(FieldTermCache {
            field: field.to_string(),
            per_doc,
            distinct_terms,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn terms(&self, doc: DocId) -> &[Arc<str>] {
        self.per_doc.get(doc.as_index()).map(|t| t.as_slice()).unwrap_or(&[])
    }

    pub fn distinct_terms(&self) -> usize {
        self.distinct_terms
    }

    pub fn max_doc(&self) -> usize {
        self.per_doc.len()
    }
}

/// Numeric values of one field decoded with one sort type, laid out like its
/// `FieldTermCache`. Each distinct term is decoded once.
#[derive(Debug)]
pub struct DecodedTermCache {
    per_doc: Vec<Vec<f64>>,
}

impl DecodedTermCache {
    pub fn build(terms: &FieldTermCache, sort_type: SortType) -> Result<Self> {
        let mut decoded: HashMap<&str, f64> = HashMap::with_capacity(terms.distinct_terms());
        let mut per_doc = Vec::with_capacity(terms.max_doc());

        for doc in 0..terms.max_doc() {
            let doc_terms = terms.terms(DocId(doc as u32));
            let mut values = Vec::with_capacity(doc_terms.len());
            for term in doc_terms {
                let value = match decoded.get(&**term) {
                    Some(&value) => value,
                    None => {
                        let value = decode_sortable(sort_type, term)?;
                        decoded.insert(&**term, value);
                        value
                    }
                };
                values.push(value);
            }
            per_doc.push(values);
        }

        Ok(DecodedTermCache { per_doc })
    }

    pub fn values(&self, doc: DocId) -> &[f64] {
        self.per_doc.get(doc.as_index()).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

fn decode_sortable(sort_type: SortType, term: &str) -> Result<f64> {
    match sort_type {
        SortType::Long => SortableNumeric::decode_long(term).map(|v| v as f64),
        SortType::Float => SortableNumeric::decode_float(term).map(f64::from),
        SortType::Double => SortableNumeric::decode_double(term),
        // Undeclared fields are indexed as ints
        _ => SortableNumeric::decode_int(term).map(f64::from),
    }
}

/// Every document's full field -> values map for one generation
#[derive(Debug, Default)]
pub struct IndexEntries {
    docs: Vec<BTreeMap<String, Vec<String>>>,
}

impl IndexEntries {
    pub fn build(view: &dyn IndexView) -> Result<Self> {
        let mut docs = vec![BTreeMap::new(); view.max_doc() as usize];
        for field in view.fields() {
            view.for_each_term(&field, &mut |term, doc| {
                if let Some(entry) = docs.get_mut(doc.as_index()) {
                    entry
                        .entry(field.clone())
                        .or_insert_with(Vec::new)
                        .push(term.to_string());
                }
            })?;
        }
        Ok(IndexEntries { docs })
    }

    pub fn get(&self, doc: DocId) -> Option<&BTreeMap<String, Vec<String>>> {
        self.docs.get(doc.as_index())
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, &BTreeMap<String, Vec<String>>)> {
        self.docs.iter().enumerate().map(|(i, entry)| (DocId(i as u32), entry))
    }
}

/// Sorted, de-duplicated field names plus their CRC, used as a cache key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    pub fields: Arc<[String]>,
    pub crc: u32,
}

impl FieldSet {
    pub fn new<S: AsRef<str>>(fields: &[S]) -> Self {
        let mut names: Vec<String> = fields.iter().map(|f| f.as_ref().to_string()).collect();
        names.sort();
        names.dedup();
        FieldSet {
            crc: crc_of(&names),
            fields: names.into(),
        }
    }
}

/// Distinct stored values of a document across a field set.
///
/// Hashes by CRC of the contents. Equality checks the CRC first and then the
/// values themselves, so a CRC collision never merges two different sets.
#[derive(Debug, Clone, Eq)]
pub struct StoredValueSet {
    values: Vec<String>,
    crc: u32,
}

impl StoredValueSet {
    pub fn new(mut values: Vec<String>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::configuration(
                "Cannot apply distinct facet on empty fields, did you forget to store them in the index?",
            ));
        }
        values.sort();
        values.dedup();
        Ok(StoredValueSet {
            crc: crc_of(&values),
            values,
        })
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn crc(&self) -> u32 {
        self.crc
    }
}

impl PartialEq for StoredValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.crc == other.crc && self.values == other.values
    }
}

impl Hash for StoredValueSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.crc.hash(state);
    }
}

fn crc_of(values: &[String]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&(values.len() as u32).to_le_bytes());
    for value in values {
        hasher.update(value.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}
