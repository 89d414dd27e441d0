//! # Schema Store
//!
//! The concurrent `name -> compiled schema` map every request reads from.
//!
//! ## Atomicity
//!
//! Entries are whole [`Arc<SchemaEntry>`] values. A writer builds the new
//! entry completely (parse, compile) before taking the write lock, and the
//! locked section is a single `HashMap::insert`/`remove`. Readers clone the
//! `Arc` out under the read lock and validate after releasing it, so a
//! reader either sees the previous entry or the new one, never a mix, and
//! a replacement never invalidates an entry a request is still using.
//!
//! The lock is `parking_lot::RwLock`, not `tokio::sync`: it is never held
//! across an `.await`, and it does not poison if a writer panics.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use schemagate_core::{SchemaName, SpecVersion};
use schemagate_schema::CompiledSchema;
use serde_json::Value;

/// A committed, servable schema.
pub struct SchemaEntry {
    /// Registry key and file name.
    pub name: SchemaName,
    /// Compiled validator.
    pub validator: Arc<dyn CompiledSchema>,
    /// Version the validator was compiled under.
    pub spec: SpecVersion,
    /// Parsed schema document the validator was compiled from.
    pub document: Arc<Value>,
    /// When the entry was committed.
    pub loaded_at: DateTime<Utc>,
}

impl fmt::Debug for SchemaEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaEntry")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .field("loaded_at", &self.loaded_at)
            .finish_non_exhaustive()
    }
}

/// Thread-safe, cloneable registry of compiled schemas.
///
/// Cloning yields another handle onto the same map.
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    entries: Arc<RwLock<HashMap<SchemaName, Arc<SchemaEntry>>>>,
}

impl SchemaStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a schema by name.
    pub fn get(&self, name: &SchemaName) -> Option<Arc<SchemaEntry>> {
        self.entries.read().get(name).cloned()
    }

    /// Commit an entry, returning the one it replaced.
    pub fn put(&self, entry: Arc<SchemaEntry>) -> Option<Arc<SchemaEntry>> {
        let name = entry.name.clone();
        self.entries.write().insert(name, entry)
    }

    /// Commit `entry` only if the store still holds `current` for its name
    /// (`None`: no entry). Returns whether the commit happened.
    ///
    /// The check and the insert happen under one write lock, so a writer
    /// that compiled against a stale entry cannot overwrite a newer one.
    pub fn put_if_current(
        &self,
        entry: Arc<SchemaEntry>,
        current: Option<&Arc<SchemaEntry>>,
    ) -> bool {
        let mut entries = self.entries.write();
        let unchanged = match (entries.get(&entry.name), current) {
            (None, None) => true,
            (Some(held), Some(seen)) => Arc::ptr_eq(held, seen),
            _ => false,
        };
        if unchanged {
            entries.insert(entry.name.clone(), entry);
        }
        unchanged
    }

    /// Remove an entry by name.
    pub fn remove(&self, name: &SchemaName) -> Option<Arc<SchemaEntry>> {
        self.entries.write().remove(name)
    }

    /// Whether a schema with this name is loaded.
    pub fn contains(&self, name: &SchemaName) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Names of all loaded schemas, sorted.
    pub fn names(&self) -> Vec<SchemaName> {
        let mut names: Vec<SchemaName> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// All loaded entries, sorted by name.
    pub fn entries(&self) -> Vec<Arc<SchemaEntry>> {
        let mut entries: Vec<Arc<SchemaEntry>> = self.entries.read().values().cloned().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// Number of loaded schemas.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemagate_schema::{JsonSchemaCompiler, SchemaCompiler};
    use serde_json::json;

    fn entry(name: &str, schema: Value) -> Arc<SchemaEntry> {
        let validator = JsonSchemaCompiler::new()
            .compile(&schema, SpecVersion::Draft7)
            .unwrap();
        Arc::new(SchemaEntry {
            name: SchemaName::parse(name).unwrap(),
            validator,
            spec: SpecVersion::Draft7,
            document: Arc::new(schema),
            loaded_at: Utc::now(),
        })
    }

    #[test]
    fn get_missing_returns_none() {
        let store = SchemaStore::new();
        assert!(store.get(&SchemaName::parse("nope").unwrap()).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn put_then_get() {
        let store = SchemaStore::new();
        assert!(store.put(entry("a", json!({"type": "string"}))).is_none());
        let got = store.get(&SchemaName::parse("a").unwrap()).unwrap();
        assert!(got.validator.validate(&json!("x")).valid);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn put_replaces_whole_entry() {
        let store = SchemaStore::new();
        let name = SchemaName::parse("a").unwrap();
        store.put(entry("a", json!({"type": "string"})));
        let held = store.get(&name).unwrap();

        let previous = store.put(entry("a", json!({"type": "integer"})));
        assert!(previous.is_some());

        // A reader holding the old entry keeps its behaviour.
        assert!(held.validator.validate(&json!("x")).valid);
        let fresh = store.get(&name).unwrap();
        assert!(!fresh.validator.validate(&json!("x")).valid);
        assert!(fresh.validator.validate(&json!(3)).valid);
    }

    #[test]
    fn put_if_current_refuses_stale_writers() {
        let store = SchemaStore::new();
        let name = SchemaName::parse("a").unwrap();

        assert!(store.put_if_current(entry("a", json!({"type": "string"})), None));
        let seen = store.get(&name).unwrap();

        // Someone else commits after `seen` was read.
        store.put(entry("a", json!({"type": "integer"})));
        assert!(!store.put_if_current(entry("a", json!({"type": "boolean"})), Some(&seen)));
        assert!(!store.put_if_current(entry("a", json!({"type": "boolean"})), None));
        assert!(store.get(&name).unwrap().validator.validate(&json!(3)).valid);

        let latest = store.get(&name).unwrap();
        assert!(store.put_if_current(entry("a", json!({"type": "boolean"})), Some(&latest)));
        assert!(store.get(&name).unwrap().validator.validate(&json!(true)).valid);
    }

    #[test]
    fn remove_and_contains() {
        let store = SchemaStore::new();
        let name = SchemaName::parse("a").unwrap();
        store.put(entry("a", json!({})));
        assert!(store.contains(&name));
        assert!(store.remove(&name).is_some());
        assert!(!store.contains(&name));
        assert!(store.remove(&name).is_none());
    }

    #[test]
    fn names_are_sorted() {
        let store = SchemaStore::new();
        store.put(entry("zeta", json!({})));
        store.put(entry("alpha", json!({})));
        store.put(entry("mid", json!({})));
        let names: Vec<String> = store.names().into_iter().map(String::from).collect();
        assert_eq!(names, vec!["alpha.json", "mid.json", "zeta.json"]);
        let entries = store.entries();
        assert_eq!(entries[0].name.as_str(), "alpha.json");
    }

    #[test]
    fn clones_share_state() {
        let store = SchemaStore::new();
        let handle = store.clone();
        store.put(entry("a", json!({})));
        assert_eq!(handle.len(), 1);
    }
}
