//! In-process server and connections
//!
//! A [`MemoryServer`] holds databases of [`MemoryTable`]s and hands out
//! [`MemoryConnection`]s. Cloning the server shares its state, so every
//! connection opened from any clone sees the same data.
//!
//! Index creation returns as soon as the index is registered; the build runs
//! on a spawned tokio task, and `IndexWait` suspends until it completes.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use doctable_core::{ConnectOptions, Error, ObjectKind, Query, Result};

use super::cursor::MemoryCursor;
use super::table::MemoryTable;
use crate::connection::{Connection, Connector, Response};

// =============================================================================
// MemoryDatabase
// =============================================================================

/// A named collection of tables
#[derive(Debug)]
pub struct MemoryDatabase {
    name: String,
    tables: DashMap<String, Arc<MemoryTable>>,
}

impl MemoryDatabase {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: DashMap::new(),
        }
    }

    /// Database name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create `table`; fails with `AlreadyExists` if present
    pub fn create_table(&self, table: &str) -> Result<()> {
        match self.tables.entry(table.to_string()) {
            Entry::Occupied(_) => Err(Error::AlreadyExists {
                kind: ObjectKind::Table,
                name: table.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(MemoryTable::new(table)));
                Ok(())
            }
        }
    }

    /// Look up `table`
    pub fn table(&self, table: &str) -> Result<Arc<MemoryTable>> {
        self.tables
            .get(table)
            .map(|t| Arc::clone(t.value()))
            .ok_or_else(|| Error::TableNotFound {
                table: table.to_string(),
            })
    }

    /// Table names, sorted
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|t| t.key().clone()).collect();
        names.sort();
        names
    }
}

// =============================================================================
// MemoryServer
// =============================================================================

#[derive(Debug, Default)]
struct ServerInner {
    databases: DashMap<String, Arc<MemoryDatabase>>,
    queries: AtomicU64,
    connections: AtomicU64,
    open_cursors: Arc<AtomicUsize>,
}

/// In-process store implementing [`Connector`]
///
/// # Example
///
/// ```ignore
/// let server = MemoryServer::new();
/// let conn = server.open(&ConnectOptions::default()).await?;
/// conn.run(Query::DbCreate { db: "test".into() }).await?;
/// conn.use_db("test");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryServer {
    inner: Arc<ServerInner>,
}

impl MemoryServer {
    /// Create an empty server
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a connection without going through [`Connector`]
    pub fn connect_local(&self) -> Arc<MemoryConnection> {
        self.inner.connections.fetch_add(1, Ordering::Relaxed);
        Arc::new(MemoryConnection::new(self.clone(), "local".to_string()))
    }

    /// Create `db`; fails with `AlreadyExists` if present
    pub fn create_database(&self, db: &str) -> Result<()> {
        match self.inner.databases.entry(db.to_string()) {
            Entry::Occupied(_) => Err(Error::AlreadyExists {
                kind: ObjectKind::Database,
                name: db.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(MemoryDatabase::new(db)));
                Ok(())
            }
        }
    }

    /// Look up `db`
    pub fn database(&self, db: &str) -> Result<Arc<MemoryDatabase>> {
        self.inner
            .databases
            .get(db)
            .map(|d| Arc::clone(d.value()))
            .ok_or_else(|| Error::DatabaseNotFound {
                name: db.to_string(),
            })
    }

    /// Queries executed across all connections
    pub fn queries_executed(&self) -> u64 {
        self.inner.queries.load(Ordering::SeqCst)
    }

    /// Connections opened
    pub fn connections_opened(&self) -> u64 {
        self.inner.connections.load(Ordering::Relaxed)
    }

    /// Cursors created and not yet closed or dropped
    pub fn open_cursors(&self) -> usize {
        self.inner.open_cursors.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryServer {
    async fn open(&self, options: &ConnectOptions) -> Result<Arc<dyn Connection>> {
        options.validate()?;
        self.inner.connections.fetch_add(1, Ordering::Relaxed);
        debug!(target: "doctable::memory", address = %options.address(), "Opened in-memory connection");
        Ok(Arc::new(MemoryConnection::new(self.clone(), options.address())))
    }
}

// =============================================================================
// MemoryConnection
// =============================================================================

/// Connection to a [`MemoryServer`]
#[derive(Debug)]
pub struct MemoryConnection {
    server: MemoryServer,
    address: String,
    db: RwLock<Option<String>>,
    closed: AtomicBool,
    queries: AtomicU64,
}

impl MemoryConnection {
    fn new(server: MemoryServer, address: String) -> Self {
        Self {
            server,
            address,
            db: RwLock::new(None),
            closed: AtomicBool::new(false),
            queries: AtomicU64::new(0),
        }
    }

    /// Server this connection talks to
    pub fn server(&self) -> &MemoryServer {
        &self.server
    }

    /// Address the connection was opened with
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Queries executed on this connection
    pub fn queries_executed(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    fn selected_database(&self) -> Result<Arc<MemoryDatabase>> {
        let name = self.db.read().clone().ok_or(Error::DatabaseNotSelected)?;
        self.server.database(&name)
    }

    fn table(&self, table: &str) -> Result<Arc<MemoryTable>> {
        self.selected_database()?.table(table)
    }

    async fn execute(&self, query: Query) -> Result<Response> {
        match query {
            Query::DbCreate { db } => {
                self.server.create_database(&db)?;
                Ok(Response::Ack)
            }
            Query::TableList => Ok(Response::Names(self.selected_database()?.table_names())),
            Query::TableCreate { table } => {
                self.selected_database()?.create_table(&table)?;
                Ok(Response::Ack)
            }
            Query::IndexCreate { table, index } => {
                let target = self.table(&table)?;
                let name = index.name().to_string();
                target.create_index(index)?;
                tokio::spawn(async move {
                    if let Err(e) = target.build_index(&name) {
                        warn!(target: "doctable::memory", index = %name, error = %e, "Index build failed");
                    }
                });
                Ok(Response::Ack)
            }
            Query::IndexWait { table, index } => {
                let mut status = self.table(&table)?.index_status(&index)?;
                let built = status.wait_for(|ready| *ready).await.is_ok();
                if !built {
                    return Err(Error::IndexNotFound { table, index });
                }
                Ok(Response::Ack)
            }
            Query::IndexList { table } => Ok(Response::Names(self.table(&table)?.index_names())),
            Query::Get { table, id } => Ok(Response::Document(self.table(&table)?.get(&id)?)),
            Query::GetAll { table, ids } => {
                Ok(Response::Documents(self.table(&table)?.get_all(&ids)?))
            }
            Query::GetAllByIndex { table, index, key } => Ok(Response::Documents(
                self.table(&table)?.get_all_by_index(&index, &key)?,
            )),
            Query::Filter { table, predicate } => {
                Ok(Response::Documents(self.table(&table)?.filter(&predicate)))
            }
            Query::Scan { table } => {
                let target = self.table(&table)?;
                let cursor = MemoryCursor::new(target, Arc::clone(&self.server.inner.open_cursors));
                Ok(Response::Cursor(Box::new(cursor)))
            }
            Query::List { table } => Ok(Response::Documents(self.table(&table)?.list())),
            Query::Count { table } => Ok(Response::Count(self.table(&table)?.count())),
            Query::Insert {
                table,
                document,
                conflict,
                return_changes,
            } => Ok(Response::Write(self.table(&table)?.insert(
                document,
                conflict,
                return_changes,
            )?)),
            Query::Update {
                table,
                id,
                patch,
                return_changes,
            } => Ok(Response::Write(
                self.table(&table)?.update(&id, &patch, return_changes)?,
            )),
            Query::Delete { table, id } => Ok(Response::Write(self.table(&table)?.delete(&id)?)),
            Query::DeleteAll { table } => Ok(Response::Write(self.table(&table)?.delete_all())),
        }
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn run(&self, query: Query) -> Result<Response> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.server.inner.queries.fetch_add(1, Ordering::SeqCst);
        trace!(target: "doctable::memory", kind = query.kind(), table = ?query.table(), "Executing query");
        self.execute(query).await
    }

    fn use_db(&self, db: &str) {
        *self.db.write() = Some(db.to_string());
    }

    fn database(&self) -> Option<String> {
        self.db.read().clone()
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(target: "doctable::memory", address = %self.address, "Closed in-memory connection");
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
