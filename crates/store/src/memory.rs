// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use std::collections::BTreeMap;
use std::sync::Arc;

use chronicle_core::{
    Collection, DocumentStore, Error, Filter, FindOptions, IndexSpec, Result, UpdateDoc,
    UpdateOutcome, compare_docs,
};
use chronicle_type::{AttrMap, Value};
use parking_lot::RwLock;
use tracing::debug;

/// Hands out named [`MemoryCollection`]s, creating them on first access.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, MemoryCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    type Collection = MemoryCollection;

    fn collection(&self, name: &str) -> MemoryCollection {
        let mut collections = self.collections.write();
        collections
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(collection = name, "creating in-memory collection");
                MemoryCollection::new(name)
            })
            .clone()
    }
}

/// One in-memory collection. A single lock per collection makes every call
/// atomic with respect to concurrent callers, which is exactly the per-call
/// atomicity the engine assumes of a backing document database.
#[derive(Clone)]
pub struct MemoryCollection {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    next_row: u64,
    docs: BTreeMap<u64, AttrMap>,
    indexes: Vec<Index>,
}

struct Index {
    spec: IndexSpec,
    /// Key tuple to owning row; maintained only for unique indexes.
    entries: BTreeMap<Vec<Value>, u64>,
}

impl Index {
    fn covers(&self, doc: &AttrMap) -> bool {
        self.spec.partial.as_ref().is_none_or(|filter| filter.matches(doc))
    }

    fn key_of(&self, doc: &AttrMap) -> Vec<Value> {
        self.spec
            .fields
            .iter()
            .map(|key| doc.get_path(&key.field).cloned().unwrap_or(Value::Undefined))
            .collect()
    }
}

impl State {
    fn check_unique(&self, doc: &AttrMap, exclude_row: Option<u64>) -> Result<()> {
        for index in self.indexes.iter().filter(|index| index.spec.unique) {
            if !index.covers(doc) {
                continue;
            }
            let key = index.key_of(doc);
            if let Some(&row) = index.entries.get(&key) {
                if Some(row) != exclude_row {
                    return Err(Error::DuplicateKey {
                        index: index.spec.name.clone(),
                        value: key.into_iter().next().unwrap_or(Value::Undefined),
                    });
                }
            }
        }
        Ok(())
    }

    fn index_insert(&mut self, row: u64, doc: &AttrMap) {
        for index in self.indexes.iter_mut().filter(|index| index.spec.unique) {
            if index.covers(doc) {
                let key = index.key_of(doc);
                index.entries.insert(key, row);
            }
        }
    }

    fn index_remove(&mut self, row: u64, doc: &AttrMap) {
        for index in self.indexes.iter_mut().filter(|index| index.spec.unique) {
            if index.covers(doc) {
                let key = index.key_of(doc);
                if index.entries.get(&key) == Some(&row) {
                    index.entries.remove(&key);
                }
            }
        }
    }

    fn insert(&mut self, doc: AttrMap) -> Result<()> {
        self.check_unique(&doc, None)?;
        let row = self.next_row;
        self.next_row += 1;
        self.index_insert(row, &doc);
        self.docs.insert(row, doc);
        Ok(())
    }

    fn replace(&mut self, row: u64, updated: AttrMap) -> Result<()> {
        self.check_unique(&updated, Some(row))?;
        if let Some(old) = self.docs.remove(&row) {
            self.index_remove(row, &old);
        }
        self.index_insert(row, &updated);
        self.docs.insert(row, updated);
        Ok(())
    }

    fn remove(&mut self, row: u64) {
        if let Some(doc) = self.docs.remove(&row) {
            self.index_remove(row, &doc);
        }
    }

    /// Row ids of matching documents in insertion order.
    fn matching_rows(&self, filter: &Filter) -> Vec<u64> {
        self.docs
            .iter()
            .filter(|(_, doc)| filter.matches(doc))
            .map(|(&row, _)| row)
            .collect()
    }
}

impl MemoryCollection {
    fn new(name: &str) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.to_string(),
                state: RwLock::new(State::default()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl Collection for MemoryCollection {
    fn insert_one(&self, doc: AttrMap) -> Result<()> {
        self.inner.state.write().insert(doc)
    }

    fn update_one(
        &self,
        filter: &Filter,
        update: &UpdateDoc,
        upsert: bool,
    ) -> Result<UpdateOutcome> {
        let mut state = self.inner.state.write();
        let target = state.matching_rows(filter).into_iter().next();
        match target {
            Some(row) => {
                let Some(mut updated) = state.docs.get(&row).cloned() else {
                    return Ok(UpdateOutcome::default());
                };
                let before = updated.clone();
                update.apply(&mut updated);
                if updated == before {
                    return Ok(UpdateOutcome {
                        matched: 1,
                        modified: 0,
                        upserted: false,
                    });
                }
                state.replace(row, updated)?;
                Ok(UpdateOutcome {
                    matched: 1,
                    modified: 1,
                    upserted: false,
                })
            }
            None if upsert => {
                // seed the fresh document from the filter's equality clauses,
                // the way document databases upsert
                let mut doc = AttrMap::new();
                for (field, value) in filter.eq_clauses() {
                    doc.insert(field, value.clone());
                }
                update.apply(&mut doc);
                state.insert(doc)?;
                Ok(UpdateOutcome {
                    matched: 0,
                    modified: 0,
                    upserted: true,
                })
            }
            None => Ok(UpdateOutcome::default()),
        }
    }

    fn update_many(&self, filter: &Filter, update: &UpdateDoc) -> Result<u64> {
        let mut state = self.inner.state.write();
        let rows = state.matching_rows(filter);
        let mut modified = 0;
        for row in rows {
            let Some(mut updated) = state.docs.get(&row).cloned() else {
                continue;
            };
            let before = updated.clone();
            update.apply(&mut updated);
            if updated == before {
                continue;
            }
            state.replace(row, updated)?;
            modified += 1;
        }
        Ok(modified)
    }

    fn delete_one(&self, filter: &Filter) -> Result<u64> {
        let mut state = self.inner.state.write();
        match state.matching_rows(filter).into_iter().next() {
            Some(row) => {
                state.remove(row);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn delete_many(&self, filter: &Filter) -> Result<u64> {
        let mut state = self.inner.state.write();
        let rows = state.matching_rows(filter);
        let removed = rows.len() as u64;
        for row in rows {
            state.remove(row);
        }
        Ok(removed)
    }

    fn find_one(&self, filter: &Filter, options: &FindOptions) -> Result<Option<AttrMap>> {
        let mut options = options.clone();
        options.limit = Some(1);
        Ok(self.find(filter, &options)?.into_iter().next())
    }

    fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<AttrMap>> {
        let state = self.inner.state.read();
        let mut results: Vec<AttrMap> = state
            .docs
            .values()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect();
        if !options.sort.is_empty() {
            results.sort_by(|left, right| compare_docs(left, right, &options.sort));
        }
        if let Some(limit) = options.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    fn count(&self, filter: &Filter) -> Result<u64> {
        let state = self.inner.state.read();
        Ok(state.docs.values().filter(|doc| filter.matches(doc)).count() as u64)
    }

    fn create_index(&self, spec: IndexSpec) -> Result<()> {
        let mut state = self.inner.state.write();
        if state.indexes.iter().any(|index| index.spec.name == spec.name) {
            return Ok(());
        }
        debug!(
            collection = self.inner.name,
            index = spec.name,
            unique = spec.unique,
            "creating index"
        );
        let mut index = Index {
            spec,
            entries: BTreeMap::new(),
        };
        if index.spec.unique {
            for (&row, doc) in &state.docs {
                if !index.covers(doc) {
                    continue;
                }
                let key = index.key_of(doc);
                if index.entries.insert(key.clone(), row).is_some() {
                    return Err(Error::DuplicateKey {
                        index: index.spec.name.clone(),
                        value: key.into_iter().next().unwrap_or(Value::Undefined),
                    });
                }
            }
        }
        state.indexes.push(index);
        Ok(())
    }
}
