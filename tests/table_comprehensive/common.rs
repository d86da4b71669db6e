//! Shared helpers for the table test suite

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::{Arc, Once};
use tracing_subscriber::EnvFilter;

pub use doctable::{
    connect, ConnectOptions, Connection, Document, Error, MemoryServer, Schema, Table,
};

static INIT_TRACING: Once = Once::new();

/// Install a test-writer subscriber once per process; filter via `RUST_LOG`
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Fresh server plus a connection with database `app` selected
pub async fn fresh() -> (MemoryServer, Arc<dyn Connection>) {
    init_tracing();
    let server = MemoryServer::new();
    let conn = connect(&server, &ConnectOptions::default().db("app"))
        .await
        .expect("connect to in-memory server");
    (server, conn)
}

/// Schema used throughout the suite
pub fn users_schema() -> Schema {
    Schema::new("users")
        .with_index("email")
        .with_index("verified")
        .with_compound("fullName", ["first", "last"])
}

pub fn doc(value: Value) -> Document {
    Document::try_from(value).expect("test document must be an object")
}

pub fn user(first: &str, last: &str, email: &str, verified: bool) -> Document {
    doc(json!({
        "first": first,
        "last": last,
        "email": email,
        "verified": verified,
    }))
}

/// Seed the three users of the canonical scenario
pub async fn seed_users(table: &Table) {
    for d in [
        user("Tim", "Bo", "tb@x", false),
        user("Jon", "Snow", "js@x", false),
        user("Anna", "Banana", "ab@x", true),
    ] {
        table.upsert(d).await.expect("seed user");
    }
}
