//! Per-worker memory

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Key/value store private to one worker.
///
/// Every worker starts from a copy of the initial memory given to its
/// provisioner and keeps whatever its tasks store between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerMemory {
    entries: HashMap<String, JsonValue>,
}

impl WorkerMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.entries.get(key)
    }

    /// Store a value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: JsonValue) -> Option<JsonValue> {
        self.entries.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<HashMap<String, JsonValue>> for WorkerMemory {
    fn from(entries: HashMap<String, JsonValue>) -> Self {
        Self { entries }
    }
}
