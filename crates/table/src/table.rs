//! Table handle
//!
//! A [`Table`] is bound to one connection and one schema. It only exists after
//! the schema has been materialized, and every operation on it is a single
//! round trip to the store unless its documentation says otherwise.
//!
//! ## Thread Safety
//!
//! `Table` is `Clone + Send + Sync`. Clones share the connection; the table
//! holds no other state and adds no locking.
//!
//! ## Existence checks
//!
//! Primary key lookups are modelled as `Option<Document>` ([`Table::find`]).
//! [`Table::get`] turns `None` into `NotFound`; [`Table::has`] turns it into
//! `false`. Transport failures are never converted into `false`.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use doctable_core::{
    ConflictPolicy, Document, Error, IndexKey, Query, Result, Schema, TableRef, WriteSummary,
    PRIMARY_KEY,
};
use doctable_storage::{Connection, Response};

use crate::materialize::{materialize, Materialized};
use crate::stream::CursorStream;

/// Handle over one materialized table
#[derive(Clone)]
pub struct Table {
    conn: Arc<dyn Connection>,
    schema: Arc<Schema>,
    table: TableRef,
}

fn require_id(id: Value, op: &str) -> Result<Value> {
    if id.is_null() {
        return Err(Error::validation(format!("requires id to {}", op)));
    }
    Ok(id)
}

fn require_index(index: &str, op: &str) -> Result<()> {
    if index.is_empty() {
        return Err(Error::validation(format!("requires index to {}", op)));
    }
    Ok(())
}

fn require_document(doc: &Document, op: &str) -> Result<()> {
    if matches!(doc.id(), Some(Value::Null)) {
        return Err(Error::validation(format!(
            "requires non-null primary key to {}",
            op
        )));
    }
    doc.validate()?;
    Ok(())
}

impl Table {
    /// Materialize `schema` and return a ready handle
    ///
    /// # Errors
    ///
    /// Propagates schema validation failures and any store failure other
    /// than "already exists".
    pub async fn open(conn: Arc<dyn Connection>, schema: Schema) -> Result<Self> {
        Self::open_with_report(conn, schema).await.map(|(t, _)| t)
    }

    /// Like [`Table::open`], also returning what materialization created
    pub async fn open_with_report(
        conn: Arc<dyn Connection>,
        schema: Schema,
    ) -> Result<(Self, Materialized)> {
        let report = materialize(conn.as_ref(), &schema).await?;
        let table = TableRef::new(schema.table());
        Ok((
            Self {
                conn,
                schema: Arc::new(schema),
                table,
            },
            report,
        ))
    }

    /// Schema the handle was opened with
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Table name
    pub fn name(&self) -> &str {
        self.table.name()
    }

    /// Shared connection
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.conn
    }

    /// Query builder for this table, for use with [`Table::run`]
    pub fn query(&self) -> &TableRef {
        &self.table
    }

    fn not_found(&self, id: &Value) -> Error {
        Error::NotFound {
            table: self.name().to_string(),
            id: id.to_string(),
        }
    }

    /// Execute an arbitrary query on the handle's connection
    pub async fn run(&self, query: Query) -> Result<Response> {
        self.conn.run(query).await
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Document with primary key `id`, or `None`
    pub async fn find(&self, id: impl Into<Value>) -> Result<Option<Document>> {
        let id = require_id(id.into(), "get")?;
        self.run(self.table.get(id)).await?.into_document()
    }

    /// Document with primary key `id`
    ///
    /// # Errors
    ///
    /// `NotFound` if no such document exists.
    pub async fn get(&self, id: impl Into<Value>) -> Result<Document> {
        let id = require_id(id.into(), "get")?;
        match self.run(self.table.get(id.clone())).await?.into_document()? {
            Some(doc) => Ok(doc),
            None => Err(self.not_found(&id)),
        }
    }

    /// Documents for a list of primary keys, order unspecified
    ///
    /// An empty list returns immediately without a store call.
    pub async fn get_all<I, V>(&self, ids: I) -> Result<Vec<Document>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let ids = ids
            .into_iter()
            .map(|id| require_id(id.into(), "get all"))
            .collect::<Result<Vec<_>>>()?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.run(self.table.get_all(ids)).await?.into_documents()
    }

    /// Documents whose `index` value equals `key`
    ///
    /// `key` is a scalar for single-field indices and an ordered array for
    /// compound indices. No match yields an empty vector.
    pub async fn get_by(&self, index: &str, key: impl Into<Value>) -> Result<Vec<Document>> {
        require_index(index, "get by")?;
        let key = require_id(key.into(), "get by")?;
        self.run(self.table.get_all_by_index(index, key))
            .await?
            .into_documents()
    }

    /// True iff [`Table::get_by`] would return at least one document
    pub async fn has_by(&self, index: &str, key: impl Into<Value>) -> Result<bool> {
        require_index(index, "check existence of")?;
        let key = require_id(key.into(), "check existence of")?;
        Ok(!self.get_by(index, key).await?.is_empty())
    }

    /// True iff a document with primary key `id` exists
    ///
    /// A missing document is `Ok(false)`, never an error.
    pub async fn has(&self, id: impl Into<Value>) -> Result<bool> {
        let id = require_id(id.into(), "check existence of")?;
        Ok(self.find(id).await?.is_some())
    }

    /// Documents matching every `(field, value)` in `predicate` exactly
    pub async fn filter(&self, predicate: impl Into<Map<String, Value>>) -> Result<Vec<Document>> {
        self.run(self.table.filter(predicate.into()))
            .await?
            .into_documents()
    }

    /// Every document, materialized in memory. Prefer [`Table::read_stream`]
    /// for large tables.
    pub async fn list(&self) -> Result<Vec<Document>> {
        self.run(self.table.list()).await?.into_documents()
    }

    /// Number of documents in the table
    pub async fn count(&self) -> Result<u64> {
        self.run(self.table.count()).await?.into_count()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert a new document; the store assigns a primary key if absent
    ///
    /// # Errors
    ///
    /// `Conflict` if the primary key already exists.
    pub async fn create(&self, doc: Document) -> Result<Document> {
        require_document(&doc, "create")?;
        let summary = self
            .run(self.table.insert(doc.clone(), ConflictPolicy::Error))
            .await?
            .into_write()?;
        if summary.errors > 0 {
            let id = doc.id().map(Value::to_string).unwrap_or_default();
            debug!(target: "doctable::table", table = %self.name(), id = %id, "Create conflicted");
            return Err(Error::Conflict {
                table: self.name().to_string(),
                id,
            });
        }
        Ok(summary.into_document_or(doc))
    }

    /// Insert, or fully replace the document with the same primary key
    pub async fn upsert(&self, doc: Document) -> Result<Document> {
        require_document(&doc, "upsert")?;
        let summary = self
            .run(self.table.insert(doc.clone(), ConflictPolicy::Replace))
            .await?
            .into_write()?;
        self.check_write_errors(&summary)?;
        Ok(summary.into_document_or(doc))
    }

    /// Merge `patch` into the document with primary key `id`
    ///
    /// Returns the merged document. If the store reports no change detail,
    /// the document is read back with one extra round trip.
    ///
    /// # Errors
    ///
    /// - `Validation` if `patch` carries a different primary key (no store call)
    /// - `NotFound` if no such document exists
    /// - `WriteRejected` if the store refuses the merge
    pub async fn update(&self, id: impl Into<Value>, patch: Document) -> Result<Document> {
        let id = require_id(id.into(), "update")?;
        patch.validate()?;
        let target = IndexKey::from_value(&id);
        if matches!(patch.id(), Some(patch_id) if IndexKey::from_value(patch_id) != target) {
            return Err(Error::validation(format!(
                "primary key {} cannot be changed by update",
                PRIMARY_KEY
            )));
        }
        let summary = self
            .run(self.table.update(id.clone(), patch))
            .await?
            .into_write()?;
        if summary.skipped > 0 {
            return Err(self.not_found(&id));
        }
        self.check_write_errors(&summary)?;
        match summary.changes.into_iter().next().and_then(|c| c.new_val) {
            Some(doc) => Ok(doc),
            None => self.get(id).await,
        }
    }

    /// Delete the document with primary key `id`
    ///
    /// Deleting an absent id succeeds with `skipped == 1`.
    pub async fn delete(&self, id: impl Into<Value>) -> Result<WriteSummary> {
        let id = require_id(id.into(), "delete")?;
        self.run(self.table.delete(id)).await?.into_write()
    }

    /// Delete every document, keeping the table and its indices
    pub async fn truncate(&self) -> Result<WriteSummary> {
        self.run(self.table.delete_all()).await?.into_write()
    }

    fn check_write_errors(&self, summary: &WriteSummary) -> Result<()> {
        if summary.errors == 0 {
            return Ok(());
        }
        Err(Error::WriteRejected {
            table: self.name().to_string(),
            reason: summary
                .first_error
                .clone()
                .unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    // ========================================================================
    // Streaming
    // ========================================================================

    /// Lazily stream the results of a cursor-producing query
    pub fn streamify(&self, query: Query) -> CursorStream {
        CursorStream::new(Arc::clone(&self.conn), query)
    }

    /// Lazily stream every document in the table
    pub fn read_stream(&self) -> CursorStream {
        self.streamify(self.table.scan())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Close the underlying connection
    ///
    /// Every handle sharing the connection becomes unusable; later
    /// operations fail with `ConnectionClosed`.
    pub async fn close(&self) -> Result<()> {
        self.conn.close().await
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("schema", &self.schema)
            .field("database", &self.conn.database())
            .finish()
    }
}
