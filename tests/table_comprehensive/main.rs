//! Table Comprehensive Test Suite
//!
//! End-to-end tests for the table layer over the in-memory backend.
//!
//! ## Test Structure
//!
//! - **users_scenario**: the canonical users table walk-through
//! - **semantics**: error taxonomy and existence checks through the facade
//! - **concurrency**: concurrent writers and materializers on one connection
//! - **streaming**: cursor streams against list results
//! - **extension**: a domain table built on `Table` via `TableFactory`
//! - **bootstrap**: `connect`, `TableSet` and connection lifecycle
//! - **properties**: property-based checks (materialize, index lookups)
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test table_comprehensive
//! RUST_LOG=doctable=debug cargo test --test table_comprehensive -- --nocapture
//! ```

mod common;

mod bootstrap;
mod concurrency;
mod extension;
mod semantics;
mod streaming;
mod users_scenario;
