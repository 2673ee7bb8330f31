use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use roaring::RoaringBitmap;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, Document, FieldValue};
use crate::encoding::numeric::{NumericValue, SortableNumeric};
use crate::index::view::IndexView;
use crate::query::ast::IndexQuery;
use crate::query::matcher::DocumentMatcher;
use crate::schema::range_field_name;

/// In-memory inverted index over keyword fields.
///
/// Every value is indexed untokenized under its field name. Numeric values are
/// also indexed in sortable-encoded form under the field's range variant
/// (`Price` -> `Price_Range`), which is what range facets and numeric
/// aggregation read.
pub struct MemoryIndex {
    pub postings: HashMap<String, BTreeMap<String, RoaringBitmap>>, // field -> term -> docs
    pub stored: Vec<HashMap<String, Vec<String>>>,                   // doc -> field -> values
    pub doc_count: usize,
    close_count: AtomicUsize,
}

impl MemoryIndex {
    pub fn new() -> Self {
        MemoryIndex {
            postings: HashMap::new(),
            stored: Vec::new(),
            doc_count: 0,
            close_count: AtomicUsize::new(0),
        }
    }

    pub fn from_documents(docs: impl IntoIterator<Item = Document>) -> Result<Self> {
        let mut index = Self::new();
        for doc in docs {
            index.add_document(&doc)?;
        }
        Ok(index)
    }

    pub fn add_document(&mut self, doc: &Document) -> Result<()> {
        let slot = doc.id.as_index();
        if slot < self.stored.len() && !self.stored[slot].is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidState,
                format!("Document {} already indexed", doc.id.0),
            ));
        }
        if slot >= self.stored.len() {
            self.stored.resize_with(slot + 1, HashMap::new);
        }

        for (field, values) in &doc.fields {
            for value in values {
                let text = value.to_term_text();
                self.insert_term(field, &text, doc.id);
                self.stored[slot].entry(field.clone()).or_default().push(text);

                if let Some(numeric) = Self::numeric(value) {
                    let encoded = SortableNumeric::encode(numeric);
                    self.insert_term(&range_field_name(field), &encoded, doc.id);
                }
            }
        }

        self.doc_count += 1;
        Ok(())
    }

    fn insert_term(&mut self, field: &str, text: &str, doc: DocId) {
        self.postings
            .entry(field.to_string())
            .or_default()
            .entry(text.to_string())
            .or_default()
            .insert(doc.0);
    }

    fn numeric(value: &FieldValue) -> Option<NumericValue> {
        match *value {
            FieldValue::Int(v) => Some(NumericValue::Int(v)),
            FieldValue::Long(v) => Some(NumericValue::Long(v)),
            FieldValue::Float(v) => Some(NumericValue::Float(v)),
            FieldValue::Double(v) => Some(NumericValue::Double(v)),
            FieldValue::Text(_) | FieldValue::Boolean(_) => None,
        }
    }

    pub fn search_term(&self, field: &str, text: &str) -> Option<&RoaringBitmap> {
        self.postings.get(field)?.get(text)
    }

    /// Terms of one field in ordinal order
    pub fn terms(&self, field: &str) -> Option<&BTreeMap<String, RoaringBitmap>> {
        self.postings.get(field)
    }

    pub fn all_docs(&self) -> RoaringBitmap {
        let mut all = RoaringBitmap::new();
        for (slot, fields) in self.stored.iter().enumerate() {
            if !fields.is_empty() {
                all.insert(slot as u32);
            }
        }
        all
    }

    /// How many times `close` has run
    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::Acquire)
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexView for MemoryIndex {
    fn max_doc(&self) -> u32 {
        self.stored.len() as u32
    }

    fn fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self.postings.keys().cloned().collect();
        fields.sort();
        fields
    }

    fn search(&self, query: &IndexQuery) -> Result<RoaringBitmap> {
        DocumentMatcher::new(self).matches(&query.query)
    }

    fn for_each_term(&self, field: &str, visit: &mut dyn FnMut(&str, DocId)) -> Result<()> {
        if let Some(terms) = self.postings.get(field) {
            for (term, docs) in terms {
                for doc in docs {
                    visit(term, DocId(doc));
                }
            }
        }
        Ok(())
    }

    fn stored_values(&self, doc: DocId, field: &str) -> Result<Vec<String>> {
        let fields = self.stored.get(doc.as_index()).ok_or_else(|| {
            Error::resource(format!("Document {} is outside this generation", doc.0))
        })?;
        Ok(fields.get(field).cloned().unwrap_or_default())
    }

    fn close(&self) -> Result<()> {
        self.close_count.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
