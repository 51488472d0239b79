//! Realtime key-tree store seam.
//!
//! Paths are `/`-separated keys (`users/raspi-01/watering_status`).

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::subscription::Subscription;

/// Hierarchical key/value store with change subscriptions.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Reads the value at a path once. `None` when nothing is stored there.
    async fn read(&self, path: &str) -> Result<Option<Value>>;

    /// Reads the last `n` children of a path in key order, oldest first.
    async fn read_last(&self, path: &str, n: usize) -> Result<Vec<(String, Value)>>;

    /// Replaces the value at a path. Writing `null` removes it.
    async fn write(&self, path: &str, value: Value) -> Result<()>;

    /// Appends a child under a path with a key that sorts after all
    /// existing children, and returns the key.
    async fn push(&self, path: &str, value: Value) -> Result<String>;

    /// Subscribes to the value at a path.
    ///
    /// The first delivery is the value at subscription time; after that a
    /// value is delivered on every change. Writes that leave the value
    /// unchanged are not delivered.
    async fn watch(&self, path: &str) -> Result<Subscription<Option<Value>>>;
}

/// Splits a path into its non-empty segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments() {
        assert_eq!(segments("users/a/b"), vec!["users", "a", "b"]);
        assert_eq!(segments("/users//a/"), vec!["users", "a"]);
        assert!(segments("").is_empty());
    }
}
