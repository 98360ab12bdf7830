//! The immutable snippet store.
//!
//! A [`SnippetStore`] is built once from one or more corpus roots and never
//! mutated afterwards. Concurrent readers need no synchronization; when the
//! corpus must be reloaded, [`SharedStore`] swaps in a whole new store.

use crate::corpus::discover_entries;
use crate::entry::SnippetEntry;
use crate::{PrimerError, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::info;
use xxhash_rust::xxh3::Xxh3;

/// Read-only index of snippet entries by id and by integration.
#[derive(Debug, Default)]
pub struct SnippetStore {
    by_id: BTreeMap<String, Arc<SnippetEntry>>,
    by_integration: BTreeMap<String, Vec<Arc<SnippetEntry>>>,
}

impl SnippetStore {
    /// Loads every corpus root into a single store.
    ///
    /// ## Examples
    ///
    /// ```no_run
    /// use primer_lib::SnippetStore;
    /// use std::path::PathBuf;
    ///
    /// let store = SnippetStore::load(&[PathBuf::from("corpus")]).unwrap();
    /// for entry in store.lookup("convex") {
    ///     println!("{}", entry.id);
    /// }
    /// ```
    ///
    /// ## Errors
    ///
    /// Fails with [`PrimerError::DuplicateId`] when two files resolve to the
    /// same id (also across roots), and propagates discovery errors.
    pub fn load(source_paths: &[PathBuf]) -> Result<Self> {
        let mut entries = Vec::new();
        for root in source_paths {
            entries.extend(discover_entries(root)?);
        }

        let store = Self::from_entries(entries)?;
        info!(
            entries = store.len(),
            integrations = store.by_integration.len(),
            "Loaded snippet store"
        );
        Ok(store)
    }

    /// Builds a store from in-memory entries.
    ///
    /// ## Errors
    ///
    /// Fails with [`PrimerError::DuplicateId`] on a repeated id.
    pub fn from_entries(entries: impl IntoIterator<Item = SnippetEntry>) -> Result<Self> {
        let mut by_id: BTreeMap<String, Arc<SnippetEntry>> = BTreeMap::new();

        for entry in entries {
            if let Some(existing) = by_id.get(&entry.id) {
                return Err(PrimerError::DuplicateId {
                    id: entry.id.clone(),
                    first: existing.source.clone(),
                    second: entry.source.clone(),
                });
            }
            by_id.insert(entry.id.clone(), Arc::new(entry));
        }

        // by_id iterates in id order, so every integration's list is id-sorted
        let mut by_integration: BTreeMap<String, Vec<Arc<SnippetEntry>>> = BTreeMap::new();
        for entry in by_id.values() {
            by_integration
                .entry(entry.integration.clone())
                .or_default()
                .push(Arc::clone(entry));
        }

        Ok(Self {
            by_id,
            by_integration,
        })
    }

    /// All entries for an integration; case-sensitive exact match.
    pub fn lookup(&self, integration: &str) -> &[Arc<SnippetEntry>] {
        self.by_integration
            .get(integration)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Direct lookup by id. Absence is an expected outcome.
    pub fn get(&self, id: &str) -> Option<&Arc<SnippetEntry>> {
        self.by_id.get(id)
    }

    /// Integration identifiers present in the store, sorted.
    pub fn integrations(&self) -> impl Iterator<Item = &str> {
        self.by_integration.keys().map(String::as_str)
    }

    /// Every entry in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SnippetEntry>> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Digest over `(id, content_hash)` pairs in id order.
    ///
    /// Two stores with the same entries and contents share a fingerprint
    /// regardless of which roots or walk order produced them.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh3::new();
        for entry in self.by_id.values() {
            hasher.update(entry.id.as_bytes());
            hasher.update(&[0]);
            hasher.update(&entry.content_hash.to_le_bytes());
        }
        hasher.digest()
    }
}

/// A store handle that can be swapped atomically for hot reload.
///
/// Readers take a [`snapshot`](SharedStore::snapshot) and keep using it even
/// if a reload happens meanwhile; entries are never mutated in place.
#[derive(Debug, Clone)]
pub struct SharedStore {
    current: Arc<RwLock<Arc<SnippetStore>>>,
}

impl SharedStore {
    pub fn new(store: SnippetStore) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(store))),
        }
    }

    /// The store as of now.
    pub fn snapshot(&self) -> Arc<SnippetStore> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Replaces the whole store.
    pub fn replace(&self, store: SnippetStore) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(store);
    }

    /// Loads the corpus again and swaps it in.
    ///
    /// On failure the previous store stays in place.
    pub fn reload(&self, source_paths: &[PathBuf]) -> Result<()> {
        let store = SnippetStore::load(source_paths)?;
        self.replace(store);
        Ok(())
    }
}
