//! Storage boundary for doctable
//!
//! This crate defines the seam between the table layer and a concrete store:
//! - Connector / Connection / Cursor: async traits for opening connections,
//!   executing one query per call, and draining scans incrementally
//! - Response: the shape-tagged answer to a query
//! - memory: an in-process backend implementing the seam

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connection;
pub mod memory;

pub use connection::{Connection, Connector, Cursor, Response};
pub use memory::{MemoryConnection, MemoryServer};
