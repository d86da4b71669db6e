//! Secondary index keys
//!
//! An index is described by an [`IndexSpec`]: a name plus a [`FieldExtractor`]
//! that maps a document to its index key. Field names are resolved once, when
//! the extractor is built from the schema, rather than looked up ad hoc at each
//! call site.
//!
//! - Single-field index: the index name is the field name and the key is the
//!   field's value.
//! - Compound index: the key is the ordered array of the listed field values.
//!
//! Documents missing any indexed field are not indexed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::document::Document;

// =============================================================================
// FieldExtractor
// =============================================================================

/// Maps a document to the ordered values of a fixed list of fields
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldExtractor {
    fields: Vec<String>,
    compound: bool,
}

impl FieldExtractor {
    /// Extractor for a single-field index
    pub fn single(field: impl Into<String>) -> Self {
        Self {
            fields: vec![field.into()],
            compound: false,
        }
    }

    /// Extractor for a compound index over `fields`, in order
    pub fn compound<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            compound: true,
        }
    }

    /// Field names in key order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Whether keys are tuples rather than scalars
    pub fn is_compound(&self) -> bool {
        self.compound
    }

    /// Ordered field values, or `None` if any field is missing
    pub fn extract(&self, doc: &Document) -> Option<Vec<Value>> {
        self.fields
            .iter()
            .map(|field| doc.get(field).cloned())
            .collect()
    }

    /// The index value of `doc`: scalar for single-field, array for compound
    pub fn key_value(&self, doc: &Document) -> Option<Value> {
        let mut values = self.extract(doc)?;
        if self.compound {
            Some(Value::Array(values))
        } else {
            values.pop()
        }
    }

    /// The encoded index key of `doc`
    pub fn key(&self, doc: &Document) -> Option<IndexKey> {
        self.key_value(doc).map(|v| IndexKey::from_value(&v))
    }
}

// =============================================================================
// IndexSpec
// =============================================================================

/// A named secondary index definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpec {
    name: String,
    extractor: FieldExtractor,
}

impl IndexSpec {
    /// Single-field index keyed by `field`; the index takes the field's name
    pub fn single(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            extractor: FieldExtractor::single(field.clone()),
            name: field,
        }
    }

    /// Compound index `name` over the ordered `fields`
    pub fn compound<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            extractor: FieldExtractor::compound(fields),
        }
    }

    /// Index name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key extractor
    pub fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }
}

// =============================================================================
// IndexKey
// =============================================================================

/// Hashable encoding of an index or primary key value
///
/// JSON values are not `Hash`, so keys are stored as their canonical compact
/// JSON text. Two values compare equal as keys iff their encodings match.
/// Numbers compare by value: an integral float such as `1.0` encodes the same
/// as the integer `1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexKey(String);

impl IndexKey {
    /// Encode a JSON value as a key
    pub fn from_value(value: &Value) -> Self {
        IndexKey(canonical(value).to_string())
    }

    /// The encoded form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Integral floats inside the i64 range collapse to integers.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Value::from(f as i64)
            }
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), canonical(v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
