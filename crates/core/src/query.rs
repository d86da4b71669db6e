//! Query model
//!
//! A [`Query`] is one request against the store. Every table operation is
//! translated into exactly one query, so one query means one round trip.
//! [`TableRef`] builds table-scoped queries.
//!
//! Mutations answer with a [`WriteSummary`]: counters plus, when requested, the
//! old/new value of each changed document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::Document;
use crate::index::IndexSpec;

// =============================================================================
// Query
// =============================================================================

/// What an insert does when the primary key already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Report an error for the document
    Error,
    /// Replace the stored document entirely
    Replace,
    /// Merge the new fields into the stored document
    Update,
}

/// A single store request
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Create a database
    DbCreate {
        /// Database name
        db: String,
    },
    /// Create a table in the selected database
    TableCreate {
        /// Table name
        table: String,
    },
    /// List table names in the selected database
    TableList,
    /// Start building a secondary index
    IndexCreate {
        /// Table name
        table: String,
        /// Index definition
        index: IndexSpec,
    },
    /// Block until an index is queryable
    IndexWait {
        /// Table name
        table: String,
        /// Index name
        index: String,
    },
    /// List index names on a table
    IndexList {
        /// Table name
        table: String,
    },
    /// Fetch one document by primary key
    Get {
        /// Table name
        table: String,
        /// Primary key
        id: Value,
    },
    /// Fetch documents by a list of primary keys
    GetAll {
        /// Table name
        table: String,
        /// Primary keys
        ids: Vec<Value>,
    },
    /// Fetch documents whose index value equals `key`
    GetAllByIndex {
        /// Table name
        table: String,
        /// Index name
        index: String,
        /// Scalar, or ordered array for compound indices
        key: Value,
    },
    /// Documents matching every field of `predicate` exactly
    Filter {
        /// Table name
        table: String,
        /// Field to expected value
        predicate: Map<String, Value>,
    },
    /// Full table scan returned as a cursor
    Scan {
        /// Table name
        table: String,
    },
    /// Full table scan materialized into an array
    List {
        /// Table name
        table: String,
    },
    /// Number of documents in the table
    Count {
        /// Table name
        table: String,
    },
    /// Insert one document
    Insert {
        /// Table name
        table: String,
        /// Document to insert
        document: Document,
        /// Behavior on primary key collision
        conflict: ConflictPolicy,
        /// Report old/new values of changed documents
        return_changes: bool,
    },
    /// Merge `patch` into the document with primary key `id`
    Update {
        /// Table name
        table: String,
        /// Primary key
        id: Value,
        /// Fields to merge
        patch: Document,
        /// Report old/new values of changed documents
        return_changes: bool,
    },
    /// Delete one document by primary key
    Delete {
        /// Table name
        table: String,
        /// Primary key
        id: Value,
    },
    /// Delete every document, keeping the table and its indices
    DeleteAll {
        /// Table name
        table: String,
    },
}

impl Query {
    /// Short name of the query kind, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Query::DbCreate { .. } => "db_create",
            Query::TableCreate { .. } => "table_create",
            Query::TableList => "table_list",
            Query::IndexCreate { .. } => "index_create",
            Query::IndexWait { .. } => "index_wait",
            Query::IndexList { .. } => "index_list",
            Query::Get { .. } => "get",
            Query::GetAll { .. } => "get_all",
            Query::GetAllByIndex { .. } => "get_all_by_index",
            Query::Filter { .. } => "filter",
            Query::Scan { .. } => "scan",
            Query::List { .. } => "list",
            Query::Count { .. } => "count",
            Query::Insert { .. } => "insert",
            Query::Update { .. } => "update",
            Query::Delete { .. } => "delete",
            Query::DeleteAll { .. } => "delete_all",
        }
    }

    /// Table the query targets, if it is table-scoped
    pub fn table(&self) -> Option<&str> {
        match self {
            Query::DbCreate { .. } | Query::TableList => None,
            Query::TableCreate { table }
            | Query::IndexCreate { table, .. }
            | Query::IndexWait { table, .. }
            | Query::IndexList { table }
            | Query::Get { table, .. }
            | Query::GetAll { table, .. }
            | Query::GetAllByIndex { table, .. }
            | Query::Filter { table, .. }
            | Query::Scan { table }
            | Query::List { table }
            | Query::Count { table }
            | Query::Insert { table, .. }
            | Query::Update { table, .. }
            | Query::Delete { table, .. }
            | Query::DeleteAll { table } => Some(table),
        }
    }
}

// =============================================================================
// TableRef
// =============================================================================

/// Builder for queries scoped to one table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    name: String,
}

impl TableRef {
    /// Reference the table called `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `TableCreate`
    pub fn create(&self) -> Query {
        Query::TableCreate {
            table: self.name.clone(),
        }
    }

    /// `IndexCreate`
    pub fn index_create(&self, index: IndexSpec) -> Query {
        Query::IndexCreate {
            table: self.name.clone(),
            index,
        }
    }

    /// `IndexWait`
    pub fn index_wait(&self, index: impl Into<String>) -> Query {
        Query::IndexWait {
            table: self.name.clone(),
            index: index.into(),
        }
    }

    /// `IndexList`
    pub fn index_list(&self) -> Query {
        Query::IndexList {
            table: self.name.clone(),
        }
    }

    /// `Get`
    pub fn get(&self, id: Value) -> Query {
        Query::Get {
            table: self.name.clone(),
            id,
        }
    }

    /// `GetAll`
    pub fn get_all(&self, ids: Vec<Value>) -> Query {
        Query::GetAll {
            table: self.name.clone(),
            ids,
        }
    }

    /// `GetAllByIndex`
    pub fn get_all_by_index(&self, index: impl Into<String>, key: Value) -> Query {
        Query::GetAllByIndex {
            table: self.name.clone(),
            index: index.into(),
            key,
        }
    }

    /// `Filter`
    pub fn filter(&self, predicate: Map<String, Value>) -> Query {
        Query::Filter {
            table: self.name.clone(),
            predicate,
        }
    }

    /// `Scan`
    pub fn scan(&self) -> Query {
        Query::Scan {
            table: self.name.clone(),
        }
    }

    /// `List`
    pub fn list(&self) -> Query {
        Query::List {
            table: self.name.clone(),
        }
    }

    /// `Count`
    pub fn count(&self) -> Query {
        Query::Count {
            table: self.name.clone(),
        }
    }

    /// `Insert` with change reporting on
    pub fn insert(&self, document: Document, conflict: ConflictPolicy) -> Query {
        Query::Insert {
            table: self.name.clone(),
            document,
            conflict,
            return_changes: true,
        }
    }

    /// `Update` with change reporting on
    pub fn update(&self, id: Value, patch: Document) -> Query {
        Query::Update {
            table: self.name.clone(),
            id,
            patch,
            return_changes: true,
        }
    }

    /// `Delete`
    pub fn delete(&self, id: Value) -> Query {
        Query::Delete {
            table: self.name.clone(),
            id,
        }
    }

    /// `DeleteAll`
    pub fn delete_all(&self) -> Query {
        Query::DeleteAll {
            table: self.name.clone(),
        }
    }
}

// =============================================================================
// WriteSummary
// =============================================================================

/// Old and new value of one changed document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// Value before the write; `None` for inserts
    pub old_val: Option<Document>,
    /// Value after the write; `None` for deletes
    pub new_val: Option<Document>,
}

/// Result of a mutation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteSummary {
    /// Documents inserted
    pub inserted: u64,
    /// Documents replaced or merged
    pub replaced: u64,
    /// Documents matched but left identical
    pub unchanged: u64,
    /// Targets that did not exist
    pub skipped: u64,
    /// Documents deleted
    pub deleted: u64,
    /// Per-document errors
    pub errors: u64,
    /// Message of the first per-document error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_error: Option<String>,
    /// Primary keys assigned by the store
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generated_keys: Vec<Value>,
    /// Old/new values, present only when change reporting was requested
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<Change>,
}

impl WriteSummary {
    /// New value of the first reported change, if any
    pub fn first_new_val(&self) -> Option<&Document> {
        self.changes.first().and_then(|c| c.new_val.as_ref())
    }

    /// The stored document: first change's new value, else `fallback`.
    ///
    /// Covers stores that omit change detail, and writes that changed nothing.
    pub fn into_document_or(mut self, fallback: Document) -> Document {
        if self.changes.is_empty() {
            return fallback;
        }
        self.changes.swap_remove(0).new_val.unwrap_or(fallback)
    }
}
