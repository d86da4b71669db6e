//! Error taxonomy and existence semantics through the public facade

use crate::common::*;
use doctable::ConflictPolicy;
use serde_json::{json, Value};

#[tokio::test]
async fn create_twice_conflicts_upsert_twice_succeeds() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();

    let d = doc(json!({"id": "jon", "email": "js@x"}));
    users.create(d.clone()).await.unwrap();
    let err = users.create(d.clone()).await.unwrap_err();
    assert!(err.is_conflict());
    assert!(!err.is_retryable());

    users.upsert(d.clone()).await.unwrap();
    let replaced = users
        .upsert(doc(json!({"id": "jon", "email": "jon@wall"})))
        .await
        .unwrap();
    assert_eq!(replaced.get("email"), Some(&json!("jon@wall")));
    assert_eq!(users.count().await.unwrap(), 1);
}

#[tokio::test]
async fn missing_document() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();

    assert!(users.get("nobody").await.unwrap_err().is_not_found());
    assert!(!users.has("nobody").await.unwrap());
    assert!(users.find("nobody").await.unwrap().is_none());
    assert!(users
        .update("nobody", doc(json!({"a": 1})))
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn generated_keys_are_distinct() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();

    let a = users.create(doc(json!({"email": "a@x"}))).await.unwrap();
    let b = users.create(doc(json!({"email": "b@x"}))).await.unwrap();
    let (a, b) = (a.id().unwrap(), b.id().unwrap());
    assert!(a.is_string());
    assert_ne!(a, b);
}

#[tokio::test]
async fn invalid_arguments_are_validation_errors() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();

    assert!(users.get(Value::Null).await.unwrap_err().is_validation());
    assert!(users.get_by("", "x").await.unwrap_err().is_validation());
    assert!(Document::try_from(json!("not an object"))
        .unwrap_err()
        .is_validation());
}

#[tokio::test]
async fn schema_validation_happens_before_store_calls() {
    let (server, conn) = fresh().await;
    let before = server.queries_executed();
    let err = Table::open(conn, Schema::new("users").with_index("id"))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(server.queries_executed(), before);
}

#[tokio::test]
async fn raw_queries_through_run() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();

    let summary = users
        .run(users.query().insert(
            doc(json!({"id": 1, "email": "a@x", "tags": {"x": 1}})),
            ConflictPolicy::Error,
        ))
        .await
        .unwrap()
        .into_write()
        .unwrap();
    assert_eq!(summary.inserted, 1);

    let merged = users
        .run(users.query().insert(
            doc(json!({"id": 1, "tags": {"y": 2}})),
            ConflictPolicy::Update,
        ))
        .await
        .unwrap()
        .into_write()
        .unwrap();
    assert_eq!(merged.replaced, 1);
    assert_eq!(
        users.get(1).await.unwrap().get("tags"),
        Some(&json!({"x": 1, "y": 2}))
    );
}
