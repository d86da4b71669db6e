//! Secondary index for the in-memory backend
//!
//! Maps an index key to the set of primary keys of documents carrying that
//! key. Keys come from the index's [`FieldExtractor`], resolved once from the
//! declared field list.
//!
//! Indices start out building. Readiness is published on a `watch` channel so
//! that `IndexWait` can suspend until the background build finishes.
//!
//! [`FieldExtractor`]: doctable_core::FieldExtractor

use std::collections::{BTreeSet, HashMap};

use doctable_core::{Document, IndexKey, IndexSpec};
use tokio::sync::watch;

/// Secondary index: index key → primary keys
#[derive(Debug)]
pub struct SecondaryIndex {
    spec: IndexSpec,
    entries: HashMap<IndexKey, BTreeSet<IndexKey>>,
    ready: watch::Sender<bool>,
}

impl SecondaryIndex {
    /// Create an empty, not yet built index
    pub fn new(spec: IndexSpec) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            spec,
            entries: HashMap::new(),
            ready,
        }
    }

    /// Index definition
    pub fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    /// Index name
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Add `doc` under its index key
    ///
    /// Documents missing an indexed field are skipped.
    pub fn insert(&mut self, pk: &IndexKey, doc: &Document) {
        if let Some(key) = self.spec.extractor().key(doc) {
            self.entries.entry(key).or_default().insert(pk.clone());
        }
    }

    /// Remove `doc` from its index key
    ///
    /// If the key's set becomes empty, the key is dropped entirely
    /// to avoid accumulating empty sets.
    pub fn remove(&mut self, pk: &IndexKey, doc: &Document) {
        if let Some(key) = self.spec.extractor().key(doc) {
            if let Some(pks) = self.entries.get_mut(&key) {
                pks.remove(pk);
                if pks.is_empty() {
                    self.entries.remove(&key);
                }
            }
        }
    }

    /// Primary keys of documents whose index value is `key`
    pub fn lookup(&self, key: &IndexKey) -> Option<&BTreeSet<IndexKey>> {
        self.entries.get(key)
    }

    /// Rebuild from scratch and mark the index ready
    pub fn rebuild<'a, I>(&mut self, docs: I)
    where
        I: IntoIterator<Item = (&'a IndexKey, &'a Document)>,
    {
        self.entries.clear();
        for (pk, doc) in docs {
            self.insert(pk, doc);
        }
        self.ready.send_replace(true);
    }

    /// Drop every entry, keeping the definition and readiness
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether the index has finished building
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Receiver that observes readiness
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }

    /// Number of distinct index keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
