//! Table layer for doctable
//!
//! Builds on the storage boundary to provide:
//! - materialize: idempotent creation of a schema's table and indices
//! - Table: a handle exposing CRUD, index lookups and streaming over one table
//! - CursorStream: lazy document stream backed by a server-side cursor
//! - connect: connection bootstrap with idempotent database creation
//! - TableSet: several tables initialized on one shared connection

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connect;
pub mod materialize;
pub mod registry;
pub mod stream;
pub mod table;


pub use connect::{connect, ensure_database};
pub use materialize::{materialize, Materialized, Outcome};
pub use registry::{TableFactory, TableSet};
pub use stream::CursorStream;
pub use table::Table;
