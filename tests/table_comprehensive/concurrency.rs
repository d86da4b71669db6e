//! Concurrent use of one shared connection

use crate::common::*;
use doctable::materialize;
use serde_json::json;
use std::collections::HashSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_with_distinct_keys() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let users = users.clone();
            tokio::spawn(async move {
                users
                    .create(doc(json!({"id": i, "email": format!("u{}@x", i)})))
                    .await
            })
        })
        .collect();
    for h in handles {
        h.await.unwrap().unwrap();
    }

    assert_eq!(users.count().await.unwrap(), 32);
    let ids: HashSet<i64> = users
        .list()
        .await
        .unwrap()
        .iter()
        .filter_map(|d| d.id().and_then(|v| v.as_i64()))
        .collect();
    assert_eq!(ids, (0..32).collect());
    assert!(users.has_by("email", "u17@x").await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_same_key_one_wins() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let users = users.clone();
            tokio::spawn(async move { users.create(doc(json!({"id": "same", "n": i}))).await })
        })
        .collect();
    let mut ok = 0;
    let mut conflicts = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(_) => ok += 1,
            Err(e) if e.is_conflict() => conflicts += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_materializers_leave_one_copy() {
    let (_server, conn) = fresh().await;
    let schema = users_schema();

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let conn = conn.clone();
            let schema = schema.clone();
            tokio::spawn(async move { materialize(conn.as_ref(), &schema).await })
        })
        .collect();
    let mut created = 0;
    for h in handles {
        if h.await.unwrap().unwrap().table.is_created() {
            created += 1;
        }
    }
    assert_eq!(created, 1);

    // Every index is queryable once any materializer has returned.
    let users = Table::open(conn, schema).await.unwrap();
    seed_users(&users).await;
    assert_eq!(users.get_by("verified", false).await.unwrap().len(), 2);
}
