use serde::{Serialize, Deserialize};
use std::collections::HashMap;

/// Document number inside one index generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

impl DocId {
    pub fn as_index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
}

impl FieldValue {
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldValue::Int(_) | FieldValue::Long(_) | FieldValue::Float(_) | FieldValue::Double(_))
    }

    /// Text as it is stored and indexed under the plain field name
    pub fn to_term_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Int(v) => v.to_string(),
            FieldValue::Long(v) => v.to_string(),
            FieldValue::Float(v) => v.to_string(),
            FieldValue::Double(v) => v.to_string(),
            FieldValue::Boolean(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub fields: HashMap<String, Vec<FieldValue>>,
}

impl Document {
    pub fn new(id: DocId) -> Self {
        Document {
            id,
            fields: HashMap::new(),
        }
    }

    pub fn add_field(&mut self, name: &str, value: FieldValue) {
        self.fields.entry(name.to_string()).or_default().push(value);
    }

    pub fn with_field(mut self, name: &str, value: FieldValue) -> Self {
        self.add_field(name, value);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&[FieldValue]> {
        self.fields.get(name).map(|v| v.as_slice())
    }
}
