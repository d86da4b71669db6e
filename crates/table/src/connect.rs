//! Connection bootstrap
//!
//! Opens a connection through a [`Connector`] and, when the options name a
//! database, makes sure it exists and selects it. Database creation is
//! idempotent: "already exists" is success.

use std::sync::Arc;
use tracing::{debug, info};

use doctable_core::{ConnectOptions, Query, Result};
use doctable_storage::{Connection, Connector};

use crate::materialize::{absorb_existing, Outcome};

/// Open a connection and select `options.db`, creating it if needed
///
/// # Errors
///
/// - `Config` if the options are invalid
/// - any transport failure from the connector
/// - any database creation failure other than "already exists"
pub async fn connect<C>(connector: &C, options: &ConnectOptions) -> Result<Arc<dyn Connection>>
where
    C: Connector + ?Sized,
{
    options.validate()?;
    let conn = connector.open(options).await?;
    debug!(target: "doctable::connect", address = %options.address(), "Connection opened");

    if let Some(db) = options.db.as_deref() {
        ensure_database(conn.as_ref(), db).await?;
        conn.use_db(db);
    }
    Ok(conn)
}

/// Create database `db` unless it already exists
pub async fn ensure_database(conn: &dyn Connection, db: &str) -> Result<Outcome> {
    let outcome = absorb_existing(conn.run(Query::DbCreate { db: db.to_string() }).await)?;
    match outcome {
        Outcome::Created => info!(target: "doctable::connect", db = %db, "Database created"),
        Outcome::AlreadyExisted => {
            debug!(target: "doctable::connect", db = %db, "Database already exists")
        }
    }
    Ok(outcome)
}
