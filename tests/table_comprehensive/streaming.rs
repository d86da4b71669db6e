//! Cursor streams over the public facade

use crate::common::*;
use futures_util::{StreamExt, TryStreamExt};
use serde_json::json;

#[tokio::test]
async fn stream_count_matches_list() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();
    seed_users(&users).await;
    for i in 0..50 {
        users
            .create(doc(json!({"email": format!("bulk{}@x", i)})))
            .await
            .unwrap();
    }

    let streamed = users.read_stream().try_collect::<Vec<_>>().await.unwrap();
    let listed = users.list().await.unwrap();
    assert_eq!(streamed.len(), listed.len());
    assert_eq!(streamed.len() as u64, users.count().await.unwrap());
}

#[tokio::test]
async fn stream_releases_cursor() {
    let (server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();
    seed_users(&users).await;

    let mut stream = users.read_stream();
    assert!(stream.next().await.is_some());
    assert_eq!(server.open_cursors(), 1);
    while stream.next().await.is_some() {}
    assert_eq!(server.open_cursors(), 0);
    let issued = server.queries_executed();
    assert!(stream.next().await.is_none());
    assert_eq!(server.queries_executed(), issued);

    let mut abandoned = users.read_stream();
    abandoned.next().await.unwrap().unwrap();
    drop(abandoned);
    assert_eq!(server.open_cursors(), 0);
}

#[tokio::test]
async fn stream_sees_writes_ahead_of_position() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();
    users.create(doc(json!({"id": "a"}))).await.unwrap();

    let mut stream = users.read_stream();
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.id(), Some(&json!("a")));
    users.create(doc(json!({"id": "b"}))).await.unwrap();

    let rest: Vec<_> = stream.try_collect().await.unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].id(), Some(&json!("b")));
}

#[tokio::test]
async fn streamify_custom_query() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();
    seed_users(&users).await;

    let docs = users
        .streamify(users.query().scan())
        .try_collect_vec()
        .await
        .unwrap();
    assert_eq!(docs.len(), 3);

    let err = users
        .streamify(users.query().count())
        .try_collect_vec()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnexpectedResponse { .. }));
}

#[tokio::test]
async fn stream_on_closed_connection_fails() {
    let (_server, conn) = fresh().await;
    let users = Table::open(conn, users_schema()).await.unwrap();
    let stream = users.read_stream();
    users.close().await.unwrap();
    let err = stream.try_collect_vec().await.unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed));
}
