//! Multi-table initialization
//!
//! A [`TableSet`] opens one connection and materializes several tables on it,
//! one after another, keeping the handles in a registry keyed by table name.
//!
//! - **basic**: a list of [`Schema`]s, each becoming a plain [`Table`]
//! - **advanced**: a list of [`TableFactory`] values, for domain types that
//!   wrap a `Table` with extra operations and want to run their own setup

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use doctable_core::{ConnectOptions, Error, Result, Schema};
use doctable_storage::{Connection, Connector};

use crate::connect::connect;
use crate::table::Table;

/// Builds a ready [`Table`] on a shared connection
#[async_trait]
pub trait TableFactory: Send + Sync {
    /// Materialize and return the table
    async fn build(&self, conn: Arc<dyn Connection>) -> Result<Table>;
}

#[async_trait]
impl TableFactory for Schema {
    async fn build(&self, conn: Arc<dyn Connection>) -> Result<Table> {
        Table::open(conn, self.clone()).await
    }
}

/// Tables sharing one connection, keyed by name
pub struct TableSet {
    connection: Arc<dyn Connection>,
    options: ConnectOptions,
    tables: BTreeMap<String, Table>,
}

impl TableSet {
    /// Connect and materialize one plain table per schema
    pub async fn basic<C>(connector: &C, options: ConnectOptions, schemas: Vec<Schema>) -> Result<Self>
    where
        C: Connector + ?Sized,
    {
        let factories = schemas
            .into_iter()
            .map(|s| Box::new(s) as Box<dyn TableFactory>)
            .collect();
        Self::advanced(connector, options, factories).await
    }

    /// Connect and build one table per factory, in order
    ///
    /// # Errors
    ///
    /// Fails on the first factory error, or with `Validation` if two
    /// factories produce tables with the same name.
    pub async fn advanced<C>(
        connector: &C,
        options: ConnectOptions,
        factories: Vec<Box<dyn TableFactory>>,
    ) -> Result<Self>
    where
        C: Connector + ?Sized,
    {
        let connection = connect(connector, &options).await?;
        let mut tables = BTreeMap::new();
        for factory in factories {
            let table = factory.build(Arc::clone(&connection)).await?;
            let name = table.name().to_string();
            if tables.contains_key(&name) {
                return Err(Error::validation(format!("table {} declared twice", name)));
            }
            tables.insert(name, table);
        }
        info!(
            target: "doctable::registry",
            tables = tables.len(),
            db = ?options.db,
            "Tables initialized"
        );
        Ok(Self {
            connection,
            options,
            tables,
        })
    }

    /// Handle for `name`, if registered
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Handle for `name`
    ///
    /// # Errors
    ///
    /// `TableNotFound` if no table with that name was registered.
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.get(name).ok_or_else(|| Error::TableNotFound {
            table: name.to_string(),
        })
    }

    /// Registered table names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether no tables were registered
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// The shared connection
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// Options the set was opened with
    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    /// Close the shared connection, invalidating every table in the set
    pub async fn close(&self) -> Result<()> {
        self.connection.close().await
    }
}

impl fmt::Debug for TableSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableSet")
            .field("options", &self.options)
            .field("tables", &self.tables.keys().collect::<Vec<_>>())
            .finish()
    }
}
