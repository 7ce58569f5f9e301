//! Static catalog mapping server error identifiers to human-readable messages.
//!
//! Each endpoint can define its own error message that best describes the
//! context of what went wrong; the catalog is the middle fallback between a
//! per-endpoint message and the generic default. Extra entries can be
//! registered at runtime-builder time.

use std::collections::HashMap;

/// Shown when no endpoint message and no catalog entry applies.
pub const DEFAULT_ERROR_MESSAGE: &str = "Something went wrong, please try again";

/// Lookup table from server error identifiers (e.g. `"BadRequest"`) to
/// user-facing strings, plus the generic fallback message.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    entries: HashMap<String, String>,
    fallback: String,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        let mut entries = HashMap::new();
        entries.insert("BadRequest".to_string(), "Bad request".to_string());
        entries.insert("ServerError".to_string(), "Server error".to_string());
        Self {
            entries,
            fallback: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

impl MessageCatalog {
    /// Register (or replace) a catalog entry.
    pub fn insert(&mut self, error_id: impl Into<String>, message: impl Into<String>) {
        self.entries.insert(error_id.into(), message.into());
    }

    /// Look up the message for a server error identifier.
    pub fn lookup(&self, error_id: &str) -> Option<&str> {
        self.entries.get(error_id).map(String::as_str)
    }

    /// The generic fallback message.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}
