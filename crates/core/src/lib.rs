//! Core types for doctable
//!
//! This crate defines the foundational types used throughout the system:
//! - Document: JSON object record with a primary key field
//! - Schema: table name plus simple and compound index declarations
//! - IndexSpec / FieldExtractor / IndexKey: secondary index keys
//! - Query / TableRef / WriteSummary: the store request model
//! - ConnectOptions: connection configuration
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod query;
pub mod schema;

pub use config::ConnectOptions;
pub use document::{json_type_name, Document, LimitError, MAX_DOCUMENT_SIZE, MAX_NESTING_DEPTH, PRIMARY_KEY};
pub use error::{Error, ObjectKind, Result};
pub use index::{FieldExtractor, IndexKey, IndexSpec};
pub use query::{Change, ConflictPolicy, Query, TableRef, WriteSummary};
pub use schema::{CompoundIndex, Schema};
