//! Table schema declarations
//!
//! A [`Schema`] names a table and the secondary indices it needs. It is
//! immutable once built and is the only input the schema materializer needs.
//!
//! ```toml
//! table = "users"
//! indices = ["email"]
//!
//! [[compound]]
//! name = "fullName"
//! fields = ["first", "last"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::document::PRIMARY_KEY;
use crate::error::{Error, Result};
use crate::index::IndexSpec;

/// A compound index declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundIndex {
    /// Index name, distinct from any field name
    pub name: String,
    /// Ordered field list forming the key tuple
    #[serde(alias = "rows")]
    pub fields: Vec<String>,
}

impl CompoundIndex {
    /// Create a compound index declaration
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Declarative table schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    table: String,
    #[serde(default)]
    indices: Vec<String>,
    #[serde(default)]
    compound: Vec<CompoundIndex>,
}

impl Schema {
    /// Schema for `table` with no secondary indices
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            indices: Vec::new(),
            compound: Vec::new(),
        }
    }

    /// Add a single-field secondary index
    pub fn with_index(mut self, field: impl Into<String>) -> Self {
        self.indices.push(field.into());
        self
    }

    /// Add a compound index
    pub fn with_compound<I, S>(mut self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compound.push(CompoundIndex::new(name, fields));
        self
    }

    /// Parse a schema from TOML
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let schema: Schema = toml::from_str(s)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Single-field index names, in declaration order
    pub fn indices(&self) -> &[String] {
        &self.indices
    }

    /// Compound index declarations, in declaration order
    pub fn compound(&self) -> &[CompoundIndex] {
        &self.compound
    }

    /// Index definitions in creation order: simple indices, then compound
    pub fn index_specs(&self) -> impl Iterator<Item = IndexSpec> + '_ {
        self.indices
            .iter()
            .map(IndexSpec::single)
            .chain(
                self.compound
                    .iter()
                    .map(|c| IndexSpec::compound(c.name.clone(), c.fields.iter().cloned())),
            )
    }

    /// Whether the schema declares an index called `name`
    pub fn has_index(&self, name: &str) -> bool {
        self.indices.iter().any(|i| i == name) || self.compound.iter().any(|c| c.name == name)
    }

    /// Check schema invariants
    ///
    /// - table name non-empty
    /// - index names non-empty and unique, and never the primary key field
    /// - every compound index lists at least one non-empty field
    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(Error::validation("schema requires a table name"));
        }

        let mut seen = HashSet::new();
        let names = self
            .indices
            .iter()
            .chain(self.compound.iter().map(|c| &c.name));
        for name in names {
            if name.is_empty() {
                return Err(Error::validation(format!(
                    "table {} declares an index with an empty name",
                    self.table
                )));
            }
            if name == PRIMARY_KEY {
                return Err(Error::validation(format!(
                    "table {}: the primary key {} is indexed implicitly",
                    self.table, PRIMARY_KEY
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::validation(format!(
                    "table {} declares index {} more than once",
                    self.table, name
                )));
            }
        }

        for c in &self.compound {
            if c.fields.is_empty() {
                return Err(Error::validation(format!(
                    "compound index {} on {} requires at least one field",
                    c.name, self.table
                )));
            }
            if c.fields.iter().any(|f| f.is_empty()) {
                return Err(Error::validation(format!(
                    "compound index {} on {} lists an empty field name",
                    c.name, self.table
                )));
            }
        }
        Ok(())
    }
}
