//! Schema materialization
//!
//! Makes sure a schema's table and every declared index exist, exactly once,
//! no matter how many callers race to create them. "Already exists" from the
//! store counts as success; every other failure aborts materialization and is
//! propagated without retry.
//!
//! Order: table, then simple indices in declaration order, then compound
//! indices in declaration order. Index creation is asynchronous in the store,
//! so each creation is followed by an explicit wait until the index is
//! queryable. The wait has no timeout; wrap the call in
//! `tokio::time::timeout` for bounded startup.

use tracing::{debug, info};

use doctable_core::{IndexSpec, Result, Schema, TableRef};
use doctable_storage::{Connection, Response};

/// Whether a creation request made something new
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The object was created by this call
    Created,
    /// The object already existed; nothing changed
    AlreadyExisted,
}

impl Outcome {
    /// Whether this call created the object
    pub fn is_created(self) -> bool {
        self == Outcome::Created
    }
}

/// Report of what materialization did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    /// Table creation outcome
    pub table: Outcome,
    /// Index name and creation outcome, in creation order
    pub indices: Vec<(String, Outcome)>,
}

impl Materialized {
    /// Names of indices created by this call
    pub fn created_indices(&self) -> impl Iterator<Item = &str> {
        self.indices
            .iter()
            .filter(|(_, outcome)| outcome.is_created())
            .map(|(name, _)| name.as_str())
    }

    /// True if nothing was created (schema was already in place)
    pub fn was_noop(&self) -> bool {
        !self.table.is_created() && self.created_indices().next().is_none()
    }
}

/// Turn an "already exists" failure into [`Outcome::AlreadyExisted`]
pub(crate) fn absorb_existing(result: Result<Response>) -> Result<Outcome> {
    match result {
        Ok(_) => Ok(Outcome::Created),
        Err(e) if e.is_already_exists() => Ok(Outcome::AlreadyExisted),
        Err(e) => Err(e),
    }
}

/// Ensure the schema's table and indices exist and are queryable
///
/// # Errors
///
/// - `Validation` if the schema is malformed (no store call is made)
/// - any store failure other than "already exists"
pub async fn materialize(conn: &dyn Connection, schema: &Schema) -> Result<Materialized> {
    schema.validate()?;

    let table = TableRef::new(schema.table());
    let table_outcome = absorb_existing(conn.run(table.create()).await)?;
    match table_outcome {
        Outcome::Created => info!(target: "doctable::schema", table = %schema.table(), "Table created"),
        Outcome::AlreadyExisted => {
            debug!(target: "doctable::schema", table = %schema.table(), "Table already exists")
        }
    }

    let mut indices = Vec::new();
    for spec in schema.index_specs() {
        let name = spec.name().to_string();
        let outcome = create_index(conn, &table, spec).await?;
        indices.push((name, outcome));
    }

    Ok(Materialized {
        table: table_outcome,
        indices,
    })
}

/// Create one index and wait until it is queryable
///
/// The wait also runs when the index already existed: a concurrent
/// materializer may have registered it without finishing the build.
async fn create_index(conn: &dyn Connection, table: &TableRef, spec: IndexSpec) -> Result<Outcome> {
    let name = spec.name().to_string();
    let kind = if spec.extractor().is_compound() {
        "compound"
    } else {
        "secondary"
    };

    let outcome = absorb_existing(conn.run(table.index_create(spec)).await)?;
    conn.run(table.index_wait(name.as_str())).await?;

    match outcome {
        Outcome::Created => info!(
            target: "doctable::schema",
            table = %table.name(),
            index = %name,
            kind,
            "Index created"
        ),
        Outcome::AlreadyExisted => debug!(
            target: "doctable::schema",
            table = %table.name(),
            index = %name,
            kind,
            "Index already exists"
        ),
    }
    Ok(outcome)
}
