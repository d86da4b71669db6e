//! Error types for doctable
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! # Categories
//!
//! | Category | Variants | Retried by this layer |
//! |----------|----------|-----------------------|
//! | Validation | `Validation` | never |
//! | Existence | `NotFound`, `TableNotFound`, `IndexNotFound`, `DatabaseNotFound` | never |
//! | Conflict | `Conflict`, `AlreadyExists` | never |
//! | Rejected write | `WriteRejected` | never |
//! | State | `IndexNotReady`, `DatabaseNotSelected`, `ConnectionClosed` | never |
//! | Transport | `Transport`, `UnexpectedResponse` | never |
//! | Config | `Config`, `Io`, `Serialization` | never |
//!
//! Nothing in this layer retries. [`Error::is_retryable`] only tells the caller
//! whether a retry could plausibly succeed.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for doctable operations
pub type Result<T> = std::result::Result<T, Error>;

/// Kind of store object reported by [`Error::AlreadyExists`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A database
    Database,
    /// A table inside a database
    Table,
    /// A secondary index on a table
    Index,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Database => f.write_str("database"),
            ObjectKind::Table => f.write_str("table"),
            ObjectKind::Index => f.write_str("index"),
        }
    }
}

/// Error types for doctable
#[derive(Debug, Error)]
pub enum Error {
    /// A required input was missing or malformed. Detected before any store call.
    #[error("validation failed: {reason}")]
    Validation {
        /// Which precondition failed
        reason: String,
    },

    /// Primary key lookup or update target does not exist
    #[error("document {id} does not exist in {table}")]
    NotFound {
        /// Table that was searched
        table: String,
        /// Primary key, rendered as JSON
        id: String,
    },

    /// Insert with conflict policy "error" hit an existing primary key
    #[error("duplicate primary key {id} in {table}")]
    Conflict {
        /// Table the insert targeted
        table: String,
        /// Primary key, rendered as JSON
        id: String,
    },

    /// The store accepted the request but refused the write
    #[error("write to {table} rejected: {reason}")]
    WriteRejected {
        /// Table the write targeted
        table: String,
        /// Store-supplied reason
        reason: String,
    },

    /// Database, table or index creation targeted an existing object
    #[error("{kind} {name} already exists")]
    AlreadyExists {
        /// What kind of object already exists
        kind: ObjectKind,
        /// Object name
        name: String,
    },

    /// Database does not exist
    #[error("database {name} does not exist")]
    DatabaseNotFound {
        /// Database name
        name: String,
    },

    /// Table does not exist in the selected database
    #[error("table {table} does not exist")]
    TableNotFound {
        /// Table name
        table: String,
    },

    /// Index does not exist on the table
    #[error("index {index} does not exist on table {table}")]
    IndexNotFound {
        /// Table name
        table: String,
        /// Index name
        index: String,
    },

    /// Index exists but has not finished building
    #[error("index {index} on table {table} is not ready")]
    IndexNotReady {
        /// Table name
        table: String,
        /// Index name
        index: String,
    },

    /// A table-scoped query was issued before any database was selected
    #[error("no database selected")]
    DatabaseNotSelected,

    /// The connection was closed before the query was issued
    #[error("connection closed")]
    ConnectionClosed,

    /// Transport/connectivity failure reported by the connection provider
    #[error("transport error: {reason}")]
    Transport {
        /// Provider-supplied description
        reason: String,
    },

    /// The store answered with a response shape the caller did not expect
    #[error("unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse {
        /// Expected response kind
        expected: &'static str,
        /// Actual response kind
        actual: &'static str,
    },

    /// Configuration could not be parsed or is inconsistent
    #[error("configuration error: {reason}")]
    Config {
        /// Parse or consistency failure
        reason: String,
    },

    /// I/O error (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Build a [`Error::Validation`]
    pub fn validation(reason: impl Into<String>) -> Self {
        Error::Validation {
            reason: reason.into(),
        }
    }

    /// Build a [`Error::Transport`]
    pub fn transport(reason: impl Into<String>) -> Self {
        Error::Transport {
            reason: reason.into(),
        }
    }

    /// True for locally detected precondition failures
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// True when a primary key lookup found nothing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// True when an insert collided with an existing primary key
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// True when a creation request hit an existing object
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists { .. })
    }

    /// Whether retrying the same call could plausibly succeed.
    ///
    /// Only transport failures and indices still building qualify. Validation
    /// and store-reported semantic failures are deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::IndexNotReady { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config {
            reason: e.to_string(),
        }
    }
}
