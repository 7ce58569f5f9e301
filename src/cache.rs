//! Query keys and the in-memory query cache.
//!
//! Keys are derived per call from the identifier, the resolved query
//! parameters, and (for mutations) the props bag; the cache stores decoded
//! response values under the key's canonical string form and supports
//! targeted invalidation after mutations.

use crate::api::JsonMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// A reactive-cache key: a literal string or an ordered sequence of
/// string/object segments.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryKey {
    Literal(String),
    Segments(Vec<Value>),
}

impl QueryKey {
    /// Canonical string form used as the cache map key. Segment keys encode
    /// each segment as JSON, so `Segments(["users"])` and `Literal("users")`
    /// remain distinct.
    pub fn canonical(&self) -> String {
        match self {
            Self::Literal(key) => key.clone(),
            Self::Segments(segments) => {
                let parts: Vec<String> = segments
                    .iter()
                    .map(|segment| serde_json::to_string(segment).unwrap_or_default())
                    .collect();
                format!("[{}]", parts.join(","))
            }
        }
    }
}

impl From<&str> for QueryKey {
    fn from(key: &str) -> Self {
        Self::Literal(key.to_string())
    }
}

/// Inputs available to a key function. Which fields are populated depends on
/// how the endpoint was built: queries provide `id` and `query_params`,
/// mutation invalidation provides `props` and `query_params`.
#[derive(Debug, Clone, Default)]
pub struct KeyInput {
    pub id: Option<Value>,
    pub query_params: Option<JsonMap>,
    pub props: Option<JsonMap>,
}

/// Derives a [`QueryKey`] from a [`KeyInput`].
pub type KeyFn = Arc<dyn Fn(&KeyInput) -> QueryKey + Send + Sync>;

/// A key at definition time: a literal, or a key function invoked per call.
#[derive(Clone)]
pub enum KeySpec {
    Literal(String),
    Fn(KeyFn),
}

impl KeySpec {
    pub fn from_fn(f: impl Fn(&KeyInput) -> QueryKey + Send + Sync + 'static) -> Self {
        Self::Fn(Arc::new(f))
    }

    pub fn resolve(&self, input: &KeyInput) -> QueryKey {
        match self {
            Self::Literal(key) => QueryKey::Literal(key.clone()),
            Self::Fn(f) => f(input),
        }
    }
}

impl From<&str> for KeySpec {
    fn from(key: &str) -> Self {
        Self::Literal(key.to_string())
    }
}

impl fmt::Debug for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(key) => write!(f, "KeySpec::Literal({key:?})"),
            Self::Fn(_) => f.write_str("KeySpec::Fn(<fn>)"),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    inserted_at: Instant,
}

/// In-memory store of decoded query results, keyed by canonical key strings.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cached value younger than `stale_time`. `None` stale time means
    /// every entry is already stale (a miss), matching a zero default.
    pub fn get(&self, key: &str, stale_time: Option<Duration>) -> Option<Value> {
        let Some(stale_time) = stale_time else {
            return None;
        };
        let entries = self.entries.read().unwrap();
        entries.get(key).and_then(|entry| {
            (entry.inserted_at.elapsed() < stale_time).then(|| entry.value.clone())
        })
    }

    /// The cached value regardless of staleness.
    pub fn peek(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().unwrap();
        entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn put(&self, key: &str, value: Value) {
        let mut entries = self.entries.write().unwrap();
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop the entry for a key, forcing the next fetch to hit the network.
    pub fn invalidate(&self, key: &str) {
        let removed = {
            let mut entries = self.entries.write().unwrap();
            entries.remove(key).is_some()
        };
        if removed {
            tracing::info!(key, "Invalidated query cache entry");
        }
    }

    pub fn invalidate_all(&self) {
        self.entries.write().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}
