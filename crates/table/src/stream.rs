//! Cursor-to-stream adapter
//!
//! [`CursorStream`] turns a cursor-producing query into a lazy
//! [`Stream`] of documents:
//!
//! - the query runs on the first poll, not on construction
//! - each poll pulls exactly one document from the cursor, so the adapter
//!   never holds more than the item being handed out; a slow consumer simply
//!   polls less often
//! - cursor exhaustion closes the cursor and ends the stream
//! - an error is yielded once, after which the stream ends
//! - once ended, further polls return `None` without touching the cursor
//!
//! A stream is single-shot: one query, one traversal.

use futures_core::stream::{BoxStream, FusedStream, Stream};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tracing::debug;

use doctable_core::{Document, Query, Result};
use doctable_storage::{Connection, Cursor};

enum State {
    Pending {
        conn: Arc<dyn Connection>,
        query: Query,
    },
    Open(Box<dyn Cursor>),
    Done,
}

async fn step(state: State) -> Option<(Result<Document>, State)> {
    let mut cursor = match state {
        State::Pending { conn, query } => {
            match conn.run(query).await.and_then(|r| r.into_cursor()) {
                Ok(cursor) => cursor,
                Err(e) => return Some((Err(e), State::Done)),
            }
        }
        State::Open(cursor) => cursor,
        State::Done => return None,
    };

    match cursor.next().await {
        Ok(Some(doc)) => Some((Ok(doc), State::Open(cursor))),
        Ok(None) => match cursor.close().await {
            Ok(()) => None,
            Err(e) => Some((Err(e), State::Done)),
        },
        Err(e) => {
            if let Err(close_err) = cursor.close().await {
                debug!(target: "doctable::stream", error = %close_err, "Cursor close failed after pull error");
            }
            Some((Err(e), State::Done))
        }
    }
}

/// Lazy, forward-only stream of documents backed by a server-side cursor
pub struct CursorStream {
    inner: BoxStream<'static, Result<Document>>,
    terminated: bool,
}

impl CursorStream {
    /// Stream the results of `query`, which must produce a cursor
    pub fn new(conn: Arc<dyn Connection>, query: Query) -> Self {
        Self {
            inner: stream::unfold(State::Pending { conn, query }, step).boxed(),
            terminated: false,
        }
    }

    /// Drain the stream into memory, stopping at the first error
    pub async fn try_collect_vec(self) -> Result<Vec<Document>> {
        self.try_collect().await
    }
}

impl Stream for CursorStream {
    type Item = Result<Document>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.terminated {
            return Poll::Ready(None);
        }
        let item = ready!(self.inner.poll_next_unpin(cx));
        if item.is_none() {
            self.terminated = true;
        }
        Poll::Ready(item)
    }
}

impl FusedStream for CursorStream {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl fmt::Debug for CursorStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorStream")
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}
