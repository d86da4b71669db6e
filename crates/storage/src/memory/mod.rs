//! In-process reference backend
//!
//! Implements the connection boundary entirely in memory: databases, tables,
//! asynchronously built secondary indices, and live cursors. Nothing is
//! persisted. Used for tests and for embedding the table layer without an
//! external store.

mod cursor;
mod index;
mod server;
mod table;

pub use cursor::MemoryCursor;
pub use index::SecondaryIndex;
pub use server::{MemoryConnection, MemoryDatabase, MemoryServer};
pub use table::MemoryTable;
