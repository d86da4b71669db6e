//! Document type
//!
//! A [`Document`] is a JSON object: a mapping of field names to values.
//! This layer does not type documents beyond that; callers define their own
//! shapes and convert with serde.
//!
//! The primary key lives in the [`PRIMARY_KEY`] field. Stores assign one on
//! insert when it is absent.
//!
//! # Document Size Limits
//!
//! | Limit | Value | Constant |
//! |-------|-------|----------|
//! | Max document size | 16 MB | [`MAX_DOCUMENT_SIZE`] |
//! | Max nesting depth | 100 levels | [`MAX_NESTING_DEPTH`] |

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::{Deref, DerefMut};
use thiserror::Error;

use crate::error::{Error, Result};

/// Field holding the primary key
pub const PRIMARY_KEY: &str = "id";

// =============================================================================
// Document Size Limits
// =============================================================================

/// Maximum document size in bytes (16 MB)
pub const MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Maximum nesting depth in a document (100 levels)
///
/// Prevents stack overflow during recursive merge and comparison.
pub const MAX_NESTING_DEPTH: usize = 100;

/// Error type for document limit violations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LimitError {
    /// Document exceeds maximum size
    #[error("document size {size} exceeds maximum of {max} bytes")]
    DocumentTooLarge {
        /// Actual document size
        size: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// Document nesting exceeds maximum depth
    #[error("document nesting depth {depth} exceeds maximum of {max}")]
    NestingTooDeep {
        /// Actual nesting depth
        depth: usize,
        /// Maximum allowed depth
        max: usize,
    },
}

impl From<LimitError> for Error {
    fn from(e: LimitError) -> Self {
        Error::validation(e.to_string())
    }
}

// =============================================================================
// Document
// =============================================================================

/// A structured record stored under a primary key
///
/// # Example
///
/// ```
/// use doctable_core::Document;
/// use serde_json::json;
///
/// let doc = Document::try_from(json!({"id": 1, "email": "tb@x"})).unwrap();
/// assert_eq!(doc.id(), Some(&json!(1)));
/// assert_eq!(doc.get("email"), Some(&json!("tb@x")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Document(Map::new())
    }

    /// Build from a JSON value; fails unless the value is an object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Document(map)),
            other => Err(Error::validation(format!(
                "document must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Serialize any serde type into a document
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        Self::from_value(serde_json::to_value(value)?)
    }

    /// Deserialize the document into a caller-defined shape
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.0.clone()))?)
    }

    /// Primary key, if present
    pub fn id(&self) -> Option<&Value> {
        self.0.get(PRIMARY_KEY)
    }

    /// Set the primary key
    pub fn set_id(&mut self, id: Value) {
        self.0.insert(PRIMARY_KEY.to_string(), id);
    }

    /// Builder-style field insertion
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Get the underlying map
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Convert into a JSON object value
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// True iff every `(field, value)` in `predicate` is present with an equal value
    pub fn matches(&self, predicate: &Map<String, Value>) -> bool {
        predicate
            .iter()
            .all(|(field, expected)| self.0.get(field) == Some(expected))
    }

    /// Merge `patch` into this document.
    ///
    /// Nested objects merge recursively; any other patch value replaces the
    /// target field, including `null`.
    pub fn merge(&mut self, patch: &Document) {
        merge_objects(&mut self.0, &patch.0);
    }

    /// Approximate size in bytes, based on the compact JSON encoding
    pub fn size_bytes(&self) -> usize {
        serde_json::to_vec(&self.0).map(|v| v.len()).unwrap_or(0)
    }

    /// Maximum nesting depth. A flat document has depth 1.
    pub fn nesting_depth(&self) -> usize {
        fn depth_of(value: &Value) -> usize {
            match value {
                Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => 0,
                Value::Array(arr) => 1 + arr.iter().map(depth_of).max().unwrap_or(0),
                Value::Object(obj) => 1 + obj.values().map(depth_of).max().unwrap_or(0),
            }
        }
        1 + self.0.values().map(depth_of).max().unwrap_or(0)
    }

    /// Validate document limits, returning the first violation
    pub fn validate(&self) -> std::result::Result<(), LimitError> {
        let depth = self.nesting_depth();
        if depth > MAX_NESTING_DEPTH {
            return Err(LimitError::NestingTooDeep {
                depth,
                max: MAX_NESTING_DEPTH,
            });
        }
        let size = self.size_bytes();
        if size > MAX_DOCUMENT_SIZE {
            return Err(LimitError::DocumentTooLarge {
                size,
                max: MAX_DOCUMENT_SIZE,
            });
        }
        Ok(())
    }
}

fn merge_objects(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (field, value) in patch {
        match (target.get_mut(field), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                merge_objects(existing, nested);
            }
            _ => {
                target.insert(field.clone(), value.clone());
            }
        }
    }
}

/// Short name of a JSON value's type, for messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Deref for Document {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Document {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Document(map)
    }
}

impl TryFrom<Value> for Document {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Document::from_value(value)
    }
}

impl From<Document> for Map<String, Value> {
    fn from(doc: Document) -> Self {
        doc.0
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}
