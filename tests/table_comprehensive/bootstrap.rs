//! Connection bootstrap, table registries and connection lifecycle

use crate::common::*;
use doctable::{Query, TableSet};
use std::collections::HashMap;

#[tokio::test]
async fn connect_is_idempotent_per_database() {
    init_tracing();
    let server = MemoryServer::new();
    let options = ConnectOptions::default().db("app");

    let a = connect(&server, &options).await.unwrap();
    Table::open(a, users_schema()).await.unwrap();

    let b = connect(&server, &options).await.unwrap();
    let tables = b.run(Query::TableList).await.unwrap().into_names().unwrap();
    assert_eq!(tables, vec!["users"]);
}

#[tokio::test]
async fn reopen_preserves_documents() {
    let (server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();
    seed_users(&users).await;
    users.close().await.unwrap();

    let conn = connect(&server, &ConnectOptions::default().db("app"))
        .await
        .unwrap();
    let (users, report) = Table::open_with_report(conn, users_schema()).await.unwrap();
    assert!(report.was_noop());
    assert_eq!(users.count().await.unwrap(), 3);
}

#[tokio::test]
async fn options_from_toml_and_environment() {
    let options = ConnectOptions::from_toml_str("host = \"db.internal\"\ndb = \"app\"\n")
        .unwrap()
        .with_overrides(|key| {
            HashMap::from([("DOCTABLE_PORT", "29015")])
                .get(key)
                .map(|v| v.to_string())
        })
        .unwrap();
    assert_eq!(options.address(), "db.internal:29015");

    let server = MemoryServer::new();
    let conn = connect(&server, &options).await.unwrap();
    assert_eq!(conn.database().as_deref(), Some("app"));
}

#[tokio::test]
async fn schemas_from_toml_in_basic_set() {
    init_tracing();
    let users = Schema::from_toml_str(
        r#"
        table = "users"
        indices = ["email"]

        [[compound]]
        name = "fullName"
        fields = ["first", "last"]
        "#,
    )
    .unwrap();
    let server = MemoryServer::new();
    let set = TableSet::basic(
        &server,
        ConnectOptions::default().db("app"),
        vec![users, Schema::new("events")],
    )
    .await
    .unwrap();

    assert_eq!(set.len(), 2);
    let users = set.table("users").unwrap();
    seed_users(users).await;
    assert!(users
        .has_by("fullName", serde_json::json!(["Tim", "Bo"]))
        .await
        .unwrap());
}

#[tokio::test]
async fn closing_one_handle_closes_them_all() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn.clone(), users_schema()).await.unwrap();
    let events = Table::open(conn.clone(), Schema::new("events")).await.unwrap();

    events.close().await.unwrap();
    assert!(conn.is_closed());
    assert!(matches!(users.count().await, Err(Error::ConnectionClosed)));
    assert!(matches!(
        Table::open(conn, Schema::new("later")).await,
        Err(Error::ConnectionClosed)
    ));
}
