//! A domain table layered on `Table`
//!
//! `Users` adds user-specific operations on top of a plain handle, with a
//! typed record and defaults applied before insert.

use crate::common::*;
use async_trait::async_trait;
use doctable::{TableFactory, TableSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    email: String,
    first: String,
    #[serde(default)]
    last: String,
    #[serde(default = "default_role")]
    role: String,
    #[serde(default)]
    verified: bool,
}

fn default_role() -> String {
    "user".to_string()
}

fn schema() -> Schema {
    Schema::new("users")
        .with_index("email")
        .with_compound("fullName", ["first", "last"])
}

#[derive(Clone)]
struct Users {
    table: Table,
}

impl Users {
    async fn open(conn: Arc<dyn Connection>) -> doctable::Result<Self> {
        Ok(Self {
            table: Table::open(conn, schema()).await?,
        })
    }

    /// Uniqueness is checked, not enforced: concurrent callers can race.
    async fn create_user(&self, email: &str, first: &str, last: &str) -> doctable::Result<User> {
        if email.is_empty() || first.is_empty() {
            return Err(Error::validation("requires email and first name"));
        }
        if self.table.has_by("email", email).await? {
            return Err(Error::Conflict {
                table: self.table.name().to_string(),
                id: email.to_string(),
            });
        }
        let user = User {
            id: None,
            email: email.to_string(),
            first: first.to_string(),
            last: last.to_string(),
            role: default_role(),
            verified: false,
        };
        self.table
            .create(Document::from_serialize(&user)?)
            .await?
            .deserialize()
    }

    async fn get_by_email(&self, email: &str) -> doctable::Result<User> {
        match self.table.get_by("email", email).await?.into_iter().next() {
            Some(doc) => doc.deserialize(),
            None => Err(Error::NotFound {
                table: self.table.name().to_string(),
                id: email.to_string(),
            }),
        }
    }

    async fn get_by_full_name(&self, first: &str, last: &str) -> doctable::Result<Vec<User>> {
        self.table
            .get_by("fullName", serde_json::json!([first, last]))
            .await?
            .iter()
            .map(Document::deserialize)
            .collect()
    }
}

struct UsersFactory;

#[async_trait]
impl TableFactory for UsersFactory {
    async fn build(&self, conn: Arc<dyn Connection>) -> doctable::Result<Table> {
        Ok(Users::open(conn).await?.table)
    }
}

#[tokio::test]
async fn create_user_applies_defaults() {
    let (_server, conn) = fresh().await;
    let users = Users::open(conn).await.unwrap();

    let tim = users.create_user("tb@x", "Tim", "Bo").await.unwrap();
    assert!(tim.id.is_some());
    assert_eq!(tim.role, "user");
    assert!(!tim.verified);

    assert_eq!(users.get_by_email("tb@x").await.unwrap(), tim);
}

#[tokio::test]
async fn create_user_rejects_taken_email() {
    let (_server, conn) = fresh().await;
    let users = Users::open(conn).await.unwrap();

    users.create_user("js@x", "Jon", "Snow").await.unwrap();
    let err = users.create_user("js@x", "Jonathan", "Snow").await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(users.table.count().await.unwrap(), 1);
}

#[tokio::test]
async fn create_user_requires_fields() {
    let (_server, conn) = fresh().await;
    let users = Users::open(conn).await.unwrap();
    assert!(users.create_user("", "Anna", "").await.unwrap_err().is_validation());
}

#[tokio::test]
async fn lookups_by_email_and_full_name() {
    let (_server, conn) = fresh().await;
    let users = Users::open(conn).await.unwrap();
    users.create_user("ab@x", "Anna", "Banana").await.unwrap();
    users.create_user("ab2@x", "Anna", "Banana").await.unwrap();

    assert_eq!(users.get_by_full_name("Anna", "Banana").await.unwrap().len(), 2);
    assert!(users.get_by_full_name("Anna", "Pineapple").await.unwrap().is_empty());
    assert!(users.get_by_email("none@x").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn users_factory_in_table_set() {
    init_tracing();
    let server = MemoryServer::new();
    let factories: Vec<Box<dyn TableFactory>> =
        vec![Box::new(UsersFactory), Box::new(Schema::new("sessions"))];
    let set = TableSet::advanced(&server, ConnectOptions::default().db("app"), factories)
        .await
        .unwrap();

    let users = Users {
        table: set.table("users").unwrap().clone(),
    };
    users.create_user("tb@x", "Tim", "Bo").await.unwrap();
    assert_eq!(users.get_by_email("tb@x").await.unwrap().first, "Tim");
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["sessions", "users"]);
}
