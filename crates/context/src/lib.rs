//! # skein-context
//!
//! The typed shared key-value store tasks read and write during a workflow
//! run (spec §4.1). Keys are schema-typed through [`ContextKey<T>`] — a
//! zero-sized, `const`-constructible handle carrying the key's name and its
//! value type as a phantom parameter — while the underlying storage is a
//! plain `serde_json::Map` so the whole context can be snapshotted and
//! restored as ordinary JSON (spec §4.6's serialization contract).
//!
//! Reads and writes are not ordered across concurrent tasks: the store is
//! guarded by a single `RwLock`, so concurrent fan-out siblings see
//! last-write-wins semantics on any key they both touch, exactly as spec
//! §4.1's contract describes.

use std::marker::PhantomData;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A schema-typed handle onto one entry of a [`TypedContext`].
///
/// `ContextKey`s are typically declared as `const` statics:
///
/// ```
/// use skein_context::ContextKey;
/// static PLAN: ContextKey<Vec<String>> = ContextKey::new("plan");
/// ```
pub struct ContextKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    /// Create a new key. `name` is the JSON object key used in the
    /// underlying snapshot.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The key's string name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

// Manual impls: `T` never needs to be `Clone`/`Copy` for the key itself,
// since the key only carries `T` as a phantom type parameter.
impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for ContextKey<T> {}

/// Shared key-value store for one workflow run.
#[derive(Default)]
pub struct TypedContext {
    entries: RwLock<Map<String, Value>>,
}

impl TypedContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the current value for `key`, if present and deserializable as
    /// `T`.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: ContextKey<T>) -> Option<T> {
        self.entries
            .read()
            .get(key.name())
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Replace the value for `key`.
    pub fn set<T: Serialize>(&self, key: ContextKey<T>, value: T) {
        if let Ok(json) = serde_json::to_value(value) {
            self.entries.write().insert(key.name().to_string(), json);
        }
    }

    /// Functional update: `v' = f(v)`. `f` receives the current value (or
    /// `None` if unset) and returns the replacement — mutating the prior
    /// value in place is not observed, only the returned value is stored.
    pub fn update<T, F>(&self, key: ContextKey<T>, f: F)
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> T,
    {
        let current = self.get(key);
        let next = f(current);
        self.set(key, next);
    }

    /// Shallow-merge a JSON object of key-value pairs into the context.
    pub fn merge(&self, partial: Map<String, Value>) {
        let mut entries = self.entries.write();
        for (k, v) in partial {
            entries.insert(k, v);
        }
    }

    /// Serialize every entry as a JSON object.
    #[must_use]
    pub fn snapshot(&self) -> Map<String, Value> {
        self.entries.read().clone()
    }

    /// Replace the entire store with a previously taken `snapshot()`.
    pub fn restore(&self, snapshot: Map<String, Value>) {
        *self.entries.write() = snapshot;
    }

    /// Number of entries currently stored. Mostly useful for tests/debugging.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the context has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
