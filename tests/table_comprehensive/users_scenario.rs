//! The canonical users walk-through

use crate::common::*;
use serde_json::json;

#[tokio::test]
async fn users_end_to_end() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();
    seed_users(&users).await;

    let jon = users.get_by("fullName", json!(["Jon", "Snow"])).await.unwrap();
    assert_eq!(jon.len(), 1);
    assert_eq!(jon[0].get("email"), Some(&json!("js@x")));

    let anna = users.get_by("email", "ab@x").await.unwrap();
    assert_eq!(anna.len(), 1);
    assert_eq!(anna[0].get("first"), Some(&json!("Anna")));

    assert_eq!(users.count().await.unwrap(), 3);

    let snows = users.filter(doc(json!({"last": "Snow"}))).await.unwrap();
    assert_eq!(snows.len(), 1);
    assert_eq!(snows[0].get("first"), Some(&json!("Jon")));
}

#[tokio::test]
async fn get_by_boolean_index() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();
    seed_users(&users).await;

    assert_eq!(users.get_by("verified", false).await.unwrap().len(), 2);
    assert_eq!(users.get_by("verified", true).await.unwrap().len(), 1);
}

#[tokio::test]
async fn has_by_compound_key() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();
    seed_users(&users).await;

    assert!(users.has_by("fullName", json!(["Anna", "Banana"])).await.unwrap());
    assert!(!users
        .has_by("fullName", json!(["Anna", "Pineapple"]))
        .await
        .unwrap());
    // Component order matters.
    assert!(!users.has_by("fullName", json!(["Banana", "Anna"])).await.unwrap());
}

#[tokio::test]
async fn truncate_empties_table() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();
    seed_users(&users).await;

    let summary = users.truncate().await.unwrap();
    assert_eq!(summary.deleted, 3);
    assert_eq!(users.count().await.unwrap(), 0);
    assert!(users.list().await.unwrap().is_empty());
    assert!(!users.has_by("email", "js@x").await.unwrap());
}

#[tokio::test]
async fn update_then_lookup_by_index() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();
    seed_users(&users).await;

    let jon = users.get_by("email", "js@x").await.unwrap().remove(0);
    let id = jon.id().cloned().unwrap();
    let updated = users
        .update(id.clone(), doc(json!({"email": "jon@wall", "verified": true})))
        .await
        .unwrap();
    assert_eq!(updated.get("first"), Some(&json!("Jon")));

    assert!(users.get_by("email", "js@x").await.unwrap().is_empty());
    assert_eq!(users.get_by("email", "jon@wall").await.unwrap().len(), 1);
    assert_eq!(users.get_by("verified", true).await.unwrap().len(), 2);

    users.delete(id.clone()).await.unwrap();
    assert!(!users.has(id).await.unwrap());
    assert_eq!(users.count().await.unwrap(), 2);
}
