//! In-memory table
//!
//! Documents are kept in a `BTreeMap` keyed by the encoded primary key, so
//! full scans and cursors walk a stable order. Every write updates all
//! registered secondary indices, including ones still building; a build
//! rebuilds its index from scratch under the write lock.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use tokio::sync::watch;
use uuid::Uuid;

use doctable_core::{
    Change, ConflictPolicy, Document, Error, IndexKey, IndexSpec, ObjectKind, Result, WriteSummary,
    PRIMARY_KEY,
};

use super::index::SecondaryIndex;

#[derive(Debug, Default)]
struct TableState {
    docs: BTreeMap<IndexKey, Document>,
    indices: BTreeMap<String, SecondaryIndex>,
}

impl TableState {
    fn put(&mut self, pk: IndexKey, old: Option<&Document>, new: Document) {
        for index in self.indices.values_mut() {
            if let Some(old) = old {
                index.remove(&pk, old);
            }
            index.insert(&pk, &new);
        }
        self.docs.insert(pk, new);
    }

    fn remove(&mut self, pk: &IndexKey) -> Option<Document> {
        let old = self.docs.remove(pk)?;
        for index in self.indices.values_mut() {
            index.remove(pk, &old);
        }
        Some(old)
    }
}

/// A table of documents with secondary indices
#[derive(Debug)]
pub struct MemoryTable {
    name: String,
    state: RwLock<TableState>,
}

fn primary_key(id: &Value) -> Result<IndexKey> {
    if id.is_null() {
        return Err(Error::validation(format!(
            "primary key {} cannot be null",
            PRIMARY_KEY
        )));
    }
    Ok(IndexKey::from_value(id))
}

impl MemoryTable {
    /// Create an empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(TableState::default()),
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    // ========================================================================
    // Indices
    // ========================================================================

    /// Register a new index in the building state
    pub fn create_index(&self, spec: IndexSpec) -> Result<()> {
        let mut state = self.state.write();
        if state.indices.contains_key(spec.name()) {
            return Err(Error::AlreadyExists {
                kind: ObjectKind::Index,
                name: spec.name().to_string(),
            });
        }
        state
            .indices
            .insert(spec.name().to_string(), SecondaryIndex::new(spec));
        Ok(())
    }

    /// Build `index` from the current documents and mark it ready
    pub fn build_index(&self, index: &str) -> Result<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let idx = state
            .indices
            .get_mut(index)
            .ok_or_else(|| self.index_not_found(index))?;
        idx.rebuild(state.docs.iter());
        Ok(())
    }

    /// Readiness receiver for `index`
    pub fn index_status(&self, index: &str) -> Result<watch::Receiver<bool>> {
        self.state
            .read()
            .indices
            .get(index)
            .map(SecondaryIndex::subscribe)
            .ok_or_else(|| self.index_not_found(index))
    }

    /// Index names, sorted
    pub fn index_names(&self) -> Vec<String> {
        self.state.read().indices.keys().cloned().collect()
    }

    fn index_not_found(&self, index: &str) -> Error {
        Error::IndexNotFound {
            table: self.name.clone(),
            index: index.to_string(),
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Document with primary key `id`
    pub fn get(&self, id: &Value) -> Result<Option<Document>> {
        let pk = primary_key(id)?;
        Ok(self.state.read().docs.get(&pk).cloned())
    }

    /// Documents for each present id; duplicate ids yield one document
    pub fn get_all(&self, ids: &[Value]) -> Result<Vec<Document>> {
        let pks = ids.iter().map(primary_key).collect::<Result<Vec<_>>>()?;
        let state = self.state.read();
        let mut seen = HashSet::new();
        Ok(pks
            .into_iter()
            .filter(|pk| seen.insert(pk.clone()))
            .filter_map(|pk| state.docs.get(&pk).cloned())
            .collect())
    }

    /// Documents whose `index` value equals `key`
    ///
    /// The primary key field is always queryable as an index.
    pub fn get_all_by_index(&self, index: &str, key: &Value) -> Result<Vec<Document>> {
        if index == PRIMARY_KEY {
            return Ok(self.get(key)?.into_iter().collect());
        }

        let state = self.state.read();
        let idx = state
            .indices
            .get(index)
            .ok_or_else(|| self.index_not_found(index))?;
        if !idx.is_ready() {
            return Err(Error::IndexNotReady {
                table: self.name.clone(),
                index: index.to_string(),
            });
        }
        Ok(idx
            .lookup(&IndexKey::from_value(key))
            .map(|pks| {
                pks.iter()
                    .filter_map(|pk| state.docs.get(pk).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Documents matching every field of `predicate`
    pub fn filter(&self, predicate: &Map<String, Value>) -> Vec<Document> {
        self.state
            .read()
            .docs
            .values()
            .filter(|doc| doc.matches(predicate))
            .cloned()
            .collect()
    }

    /// All documents in primary key order
    pub fn list(&self) -> Vec<Document> {
        self.state.read().docs.values().cloned().collect()
    }

    /// Number of documents
    pub fn count(&self) -> u64 {
        self.state.read().docs.len() as u64
    }

    /// First document strictly after `position` in primary key order
    pub fn next_after(&self, position: Option<&IndexKey>) -> Option<(IndexKey, Document)> {
        let state = self.state.read();
        let lower = match position {
            Some(pk) => Bound::Excluded(pk),
            None => Bound::Unbounded,
        };
        state
            .docs
            .range((lower, Bound::Unbounded))
            .next()
            .map(|(pk, doc)| (pk.clone(), doc.clone()))
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert `document`, assigning a UUID primary key if absent
    pub fn insert(
        &self,
        mut document: Document,
        conflict: ConflictPolicy,
        return_changes: bool,
    ) -> Result<WriteSummary> {
        document.validate()?;

        let mut summary = WriteSummary::default();
        let pk = match document.id() {
            Some(id) => primary_key(id)?,
            None => {
                let id = Value::String(Uuid::new_v4().to_string());
                let pk = IndexKey::from_value(&id);
                document.set_id(id.clone());
                summary.generated_keys.push(id);
                pk
            }
        };

        let mut state = self.state.write();
        let old = state.docs.get(&pk).cloned();
        let new = match (&old, conflict) {
            (None, _) => {
                summary.inserted = 1;
                document
            }
            (Some(_), ConflictPolicy::Error) => {
                summary.errors = 1;
                summary.first_error = Some(format!("Duplicate primary key `{}`: {}", PRIMARY_KEY, pk));
                return Ok(summary);
            }
            (Some(_), ConflictPolicy::Replace) => document,
            (Some(existing), ConflictPolicy::Update) => {
                let mut merged = existing.clone();
                merged.merge(&document);
                merged
            }
        };

        if old.as_ref() == Some(&new) {
            summary.unchanged = 1;
            return Ok(summary);
        }
        if old.is_some() {
            summary.replaced = 1;
        }
        if return_changes {
            summary.changes.push(Change {
                old_val: old.clone(),
                new_val: Some(new.clone()),
            });
        }
        state.put(pk, old.as_ref(), new);
        Ok(summary)
    }

    /// Merge `patch` into the document with primary key `id`
    ///
    /// An absent target is reported as `skipped`, not as an error.
    pub fn update(&self, id: &Value, patch: &Document, return_changes: bool) -> Result<WriteSummary> {
        let pk = primary_key(id)?;
        patch.validate()?;

        let mut summary = WriteSummary::default();
        if matches!(patch.id(), Some(patch_id) if IndexKey::from_value(patch_id) != pk) {
            summary.errors = 1;
            summary.first_error = Some(format!("Primary key `{}` cannot be changed", PRIMARY_KEY));
            return Ok(summary);
        }

        let mut state = self.state.write();
        let Some(old) = state.docs.get(&pk).cloned() else {
            summary.skipped = 1;
            return Ok(summary);
        };

        let mut new = old.clone();
        new.merge(patch);
        if new == old {
            summary.unchanged = 1;
            if return_changes {
                summary.changes.push(Change {
                    old_val: Some(old),
                    new_val: Some(new),
                });
            }
            return Ok(summary);
        }

        summary.replaced = 1;
        if return_changes {
            summary.changes.push(Change {
                old_val: Some(old.clone()),
                new_val: Some(new.clone()),
            });
        }
        state.put(pk, Some(&old), new);
        Ok(summary)
    }

    /// Delete the document with primary key `id`; absent ids are `skipped`
    pub fn delete(&self, id: &Value) -> Result<WriteSummary> {
        let pk = primary_key(id)?;
        let mut summary = WriteSummary::default();
        match self.state.write().remove(&pk) {
            Some(_) => summary.deleted = 1,
            None => summary.skipped = 1,
        }
        Ok(summary)
    }

    /// Delete every document; indices stay registered and ready
    pub fn delete_all(&self) -> WriteSummary {
        let mut state = self.state.write();
        let deleted = state.docs.len() as u64;
        state.docs.clear();
        for index in state.indices.values_mut() {
            index.clear();
        }
        WriteSummary {
            deleted,
            ..Default::default()
        }
    }
}
