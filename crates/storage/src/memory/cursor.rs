//! Live cursor over an in-memory table
//!
//! The cursor remembers the last primary key it returned and asks the table
//! for the next one on each pull, so nothing is buffered. Documents inserted
//! ahead of the cursor during a scan are observed; ones behind it are not.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use doctable_core::{Document, Error, IndexKey, Result};

use super::table::MemoryTable;
use crate::connection::Cursor;

/// Server-side cursor produced by a `Scan` query
#[derive(Debug)]
pub struct MemoryCursor {
    table: Arc<MemoryTable>,
    position: Option<IndexKey>,
    exhausted: bool,
    released: bool,
    open_cursors: Arc<AtomicUsize>,
}

impl MemoryCursor {
    pub(crate) fn new(table: Arc<MemoryTable>, open_cursors: Arc<AtomicUsize>) -> Self {
        open_cursors.fetch_add(1, Ordering::SeqCst);
        Self {
            table,
            position: None,
            exhausted: false,
            released: false,
            open_cursors,
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.open_cursors.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Cursor for MemoryCursor {
    async fn next(&mut self) -> Result<Option<Document>> {
        if self.exhausted {
            return Ok(None);
        }
        if self.released {
            return Err(Error::transport("cursor already closed"));
        }

        // Each pull is its own round trip.
        tokio::task::yield_now().await;

        match self.table.next_after(self.position.as_ref()) {
            Some((pk, doc)) => {
                self.position = Some(pk);
                Ok(Some(doc))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.release();
        Ok(())
    }
}

impl Drop for MemoryCursor {
    fn drop(&mut self) {
        self.release();
    }
}
