//! doctable - schema-driven table access over document stores
//!
//! Declare a table and its secondary indices once; doctable creates them in
//! the backing store (idempotently) and hands back a [`Table`] exposing
//! typed-error CRUD, index lookups and lazy streaming.
//!
//! # Quick Start
//!
//! ```
//! use doctable::{connect, ConnectOptions, Document, MemoryServer, Schema, Table};
//! use serde_json::json;
//!
//! # async fn demo() -> doctable::Result<()> {
//! let server = MemoryServer::new();
//! let conn = connect(&server, &ConnectOptions::default().db("app")).await?;
//!
//! let users = Table::open(
//!     conn,
//!     Schema::new("users")
//!         .with_index("email")
//!         .with_compound("fullName", ["first", "last"]),
//! )
//! .await?;
//!
//! users
//!     .upsert(Document::try_from(json!({"email": "js@x", "first": "Jon", "last": "Snow"}))?)
//!     .await?;
//! assert!(users.has_by("fullName", json!(["Jon", "Snow"])).await?);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `doctable-core`: documents, schema, query model, errors, options
//! - `doctable-storage`: the async store boundary and an in-memory backend
//! - `doctable-table`: materialization, table handles, streams, registries
//!
//! Only the items below are public; crate internals are not re-exported.

pub use doctable_core::{
    json_type_name, Change, CompoundIndex, ConflictPolicy, ConnectOptions, Document, Error,
    FieldExtractor, IndexKey, IndexSpec, ObjectKind, Query, Result, Schema, TableRef,
    WriteSummary, PRIMARY_KEY,
};
pub use doctable_storage::{Connection, Connector, Cursor, MemoryConnection, MemoryServer, Response};
pub use doctable_table::{
    connect, ensure_database, materialize, CursorStream, Materialized, Outcome, Table,
    TableFactory, TableSet,
};
