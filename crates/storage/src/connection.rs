//! Store connection boundary
//!
//! These traits are the only seam between the table layer and a concrete
//! store. A [`Connector`] opens a [`Connection`]; a connection executes one
//! [`Query`] per call and answers with a [`Response`]. Full scans answer with a
//! [`Cursor`] that is drained one document at a time.
//!
//! Connections are shared behind `Arc` and must tolerate concurrent queries.
//! The table layer adds no locking of its own.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use doctable_core::{ConnectOptions, Document, Error, Query, Result, WriteSummary};

/// Server-side cursor over a result set
#[async_trait]
pub trait Cursor: Send {
    /// Next document, or `None` once the cursor is exhausted
    async fn next(&mut self) -> Result<Option<Document>>;

    /// Release server-side resources. Idempotent.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A live connection to a store
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute one query
    async fn run(&self, query: Query) -> Result<Response>;

    /// Scope subsequent table queries to `db`
    fn use_db(&self, db: &str);

    /// Currently selected database
    fn database(&self) -> Option<String>;

    /// Close the connection. Later queries fail with `ConnectionClosed`.
    async fn close(&self) -> Result<()>;

    /// Whether `close` has been called
    fn is_closed(&self) -> bool;
}

/// Opens connections
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection. The returned connection has no database selected.
    async fn open(&self, options: &ConnectOptions) -> Result<Arc<dyn Connection>>;
}

// =============================================================================
// Response
// =============================================================================

/// Answer to a [`Query`]; the shape depends on the query kind
pub enum Response {
    /// Acknowledgement with no payload (DDL, index wait)
    Ack,
    /// Scalar count
    Count(u64),
    /// Single lookup result; `None` when absent
    Document(Option<Document>),
    /// Materialized array of documents
    Documents(Vec<Document>),
    /// Names (tables, indices)
    Names(Vec<String>),
    /// Server-side cursor
    Cursor(Box<dyn Cursor>),
    /// Mutation change report
    Write(WriteSummary),
}

impl Response {
    /// Short name of the response kind
    pub fn kind(&self) -> &'static str {
        match self {
            Response::Ack => "ack",
            Response::Count(_) => "count",
            Response::Document(_) => "document",
            Response::Documents(_) => "documents",
            Response::Names(_) => "names",
            Response::Cursor(_) => "cursor",
            Response::Write(_) => "write",
        }
    }

    fn unexpected(self, expected: &'static str) -> Error {
        Error::UnexpectedResponse {
            expected,
            actual: self.kind(),
        }
    }

    /// Expect a count
    pub fn into_count(self) -> Result<u64> {
        match self {
            Response::Count(n) => Ok(n),
            other => Err(other.unexpected("count")),
        }
    }

    /// Expect a single-document lookup
    pub fn into_document(self) -> Result<Option<Document>> {
        match self {
            Response::Document(doc) => Ok(doc),
            other => Err(other.unexpected("document")),
        }
    }

    /// Expect a document array
    pub fn into_documents(self) -> Result<Vec<Document>> {
        match self {
            Response::Documents(docs) => Ok(docs),
            other => Err(other.unexpected("documents")),
        }
    }

    /// Expect a name list
    pub fn into_names(self) -> Result<Vec<String>> {
        match self {
            Response::Names(names) => Ok(names),
            other => Err(other.unexpected("names")),
        }
    }

    /// Expect a cursor
    pub fn into_cursor(self) -> Result<Box<dyn Cursor>> {
        match self {
            Response::Cursor(cursor) => Ok(cursor),
            other => Err(other.unexpected("cursor")),
        }
    }

    /// Expect a write summary
    pub fn into_write(self) -> Result<WriteSummary> {
        match self {
            Response::Write(summary) => Ok(summary),
            other => Err(other.unexpected("write")),
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ack => f.write_str("Ack"),
            Response::Count(n) => f.debug_tuple("Count").field(n).finish(),
            Response::Document(d) => f.debug_tuple("Document").field(d).finish(),
            Response::Documents(d) => f.debug_tuple("Documents").field(d).finish(),
            Response::Names(n) => f.debug_tuple("Names").field(n).finish(),
            Response::Cursor(_) => f.write_str("Cursor(..)"),
            Response::Write(w) => f.debug_tuple("Write").field(w).finish(),
        }
    }
}
