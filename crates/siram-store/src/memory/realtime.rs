//! In-memory realtime key tree.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

use crate::error::{Result, StoreError};
use crate::realtime::{segments, RealtimeStore};
use crate::subscription::Subscription;

struct Watcher {
    path: Vec<String>,
    last: Option<Value>,
    tx: UnboundedSender<Option<Value>>,
}

struct Tree {
    root: Value,
    watchers: Vec<Watcher>,
    next_push: u64,
}

/// Realtime store holding a single JSON tree.
pub struct MemoryRealtimeStore {
    tree: Mutex<Tree>,
    unavailable: AtomicBool,
}

impl Default for MemoryRealtimeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRealtimeStore {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::with_root(Value::Object(Map::new()))
    }

    /// Creates a store holding the given tree.
    pub fn with_root(root: Value) -> Self {
        let root = if root.is_object() {
            root
        } else {
            Value::Object(Map::new())
        };
        Self {
            tree: Mutex::new(Tree {
                root,
                watchers: Vec::new(),
                next_push: 0,
            }),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Makes every trait operation fail with [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of live subscriptions on exactly this path.
    pub fn watcher_count(&self, path: &str) -> usize {
        let wanted: Vec<String> = segments(path).into_iter().map(String::from).collect();
        self.tree
            .lock()
            .map(|tree| {
                tree.watchers
                    .iter()
                    .filter(|w| w.path == wanted && !w.tx.is_closed())
                    .count()
            })
            .unwrap_or(0)
    }

    /// Ends every subscription, as a dropped backend connection would.
    pub fn disconnect_watchers(&self) {
        if let Ok(mut tree) = self.tree.lock() {
            let count = tree.watchers.len();
            tree.watchers.clear();
            debug!(count, "Disconnected realtime watchers");
        }
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("realtime store offline".to_string()));
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tree>> {
        self.tree
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

fn lookup<'a, S: AsRef<str>>(root: &'a Value, path: &[S]) -> Option<&'a Value> {
    path.iter()
        .try_fold(root, |node, key| node.as_object()?.get(key.as_ref()))
}

fn is_empty_node(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Writes `value` below `node`, creating parents and pruning emptied ones.
fn set_at(node: &mut Value, path: &[&str], value: Value) {
    let Some((key, rest)) = path.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    if rest.is_empty() {
        if value.is_null() {
            map.remove(*key);
        } else {
            map.insert(key.to_string(), value);
        }
        return;
    }

    if value.is_null() && !map.contains_key(*key) {
        return;
    }
    let child = map.entry(key.to_string()).or_insert(Value::Null);
    set_at(child, rest, value);
    if is_empty_node(child) {
        map.remove(*key);
    }
}

impl Tree {
    fn apply(&mut self, path: &[&str], value: Value) {
        set_at(&mut self.root, path, value);

        let root = &self.root;
        self.watchers.retain_mut(|watcher| {
            let current = lookup(root, &watcher.path).cloned();
            if current == watcher.last {
                return !watcher.tx.is_closed();
            }
            watcher.last = current.clone();
            watcher.tx.send(current).is_ok()
        });
        trace!(watchers = self.watchers.len(), "Applied realtime write");
    }
}

#[async_trait]
impl RealtimeStore for MemoryRealtimeStore {
    async fn read(&self, path: &str) -> Result<Option<Value>> {
        self.check_available()?;
        let tree = self.lock()?;
        Ok(lookup(&tree.root, &segments(path)).cloned())
    }

    async fn read_last(&self, path: &str, n: usize) -> Result<Vec<(String, Value)>> {
        self.check_available()?;
        let tree = self.lock()?;
        let Some(Value::Object(children)) = lookup(&tree.root, &segments(path)) else {
            return Ok(Vec::new());
        };

        let mut entries: Vec<(String, Value)> = children
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let skip = entries.len().saturating_sub(n);
        Ok(entries.into_iter().skip(skip).collect())
    }

    async fn write(&self, path: &str, value: Value) -> Result<()> {
        self.check_available()?;
        let parts = segments(path);
        if parts.is_empty() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        self.lock()?.apply(&parts, value);
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String> {
        self.check_available()?;
        let mut tree = self.lock()?;
        let key = format!("-{:016}", tree.next_push);
        tree.next_push += 1;

        let mut parts = segments(path);
        parts.push(&key);
        tree.apply(&parts, value);
        Ok(key)
    }

    async fn watch(&self, path: &str) -> Result<Subscription<Option<Value>>> {
        self.check_available()?;
        let mut tree = self.lock()?;
        let watched: Vec<String> = segments(path).into_iter().map(String::from).collect();
        let current = lookup(&tree.root, &watched).cloned();

        let (tx, subscription) = Subscription::channel();
        let _ = tx.send(current.clone());
        tree.watchers.push(Watcher {
            path: watched,
            last: current,
            tx,
        });

        debug!(path, "Realtime watcher registered");
        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_write_and_read() {
        let store = MemoryRealtimeStore::new();
        store.write("users/dev-1/watering_status", json!("idle")).await.unwrap();
        store.write("users/dev-1/last_watered", json!("07:00")).await.unwrap();

        let tree = store.read("users/dev-1").await.unwrap().unwrap();
        assert_eq!(tree["watering_status"], "idle");
        assert_eq!(tree["last_watered"], "07:00");
        assert!(store.read("users/unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_null_write_prunes() {
        let store = MemoryRealtimeStore::new();
        store.write("users/dev-1/watering_status", json!("idle")).await.unwrap();
        store.write("users/dev-1/watering_status", Value::Null).await.unwrap();
        assert!(store.read("users/dev-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_last_in_key_order() {
        let store = MemoryRealtimeStore::new();
        for moisture in [30, 40, 50] {
            store
                .push("users/dev-1/data_kadar_air", json!({"nilai": moisture}))
                .await
                .unwrap();
        }

        let last = store.read_last("users/dev-1/data_kadar_air", 1).await.unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].1["nilai"], 50);

        let all = store.read_last("users/dev-1/data_kadar_air", 10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].1["nilai"], 30);

        assert!(store.read_last("users/dev-2/data_kadar_air", 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_watch_delivers_current_then_changes() {
        let store = MemoryRealtimeStore::new();
        store.write("users/dev-1/watering_status", json!("idle")).await.unwrap();

        let mut sub = store.watch("users/dev-1/watering_status").await.unwrap();
        assert_eq!(sub.next().await, Some(Some(json!("idle"))));

        store.write("users/dev-1/watering_status", json!("done")).await.unwrap();
        store.write("users/dev-1/watering_status", json!("done")).await.unwrap();
        store.write("users/dev-1/last_watered", json!("08:00")).await.unwrap();
        store.write("users/dev-1/watering_status", json!("idle")).await.unwrap();

        assert_eq!(sub.next().await, Some(Some(json!("done"))));
        assert_eq!(sub.next().await, Some(Some(json!("idle"))));
        assert!(sub.try_next().is_none());
    }

    #[tokio::test]
    async fn test_parent_write_reaches_child_watcher() {
        let store = MemoryRealtimeStore::new();
        let mut sub = store.watch("users/dev-1/watering_status").await.unwrap();
        assert_eq!(sub.next().await, Some(None));

        store
            .write("users/dev-1", json!({"watering_status": "requested"}))
            .await
            .unwrap();
        assert_eq!(sub.next().await, Some(Some(json!("requested"))));
    }

    #[tokio::test]
    async fn test_watcher_count_and_disconnect() {
        let store = MemoryRealtimeStore::new();
        let sub = store.watch("users/dev-1/watering_status").await.unwrap();
        let mut other = store.watch("users/dev-2/watering_status").await.unwrap();
        assert_eq!(store.watcher_count("users/dev-1/watering_status"), 1);

        drop(sub);
        assert_eq!(store.watcher_count("users/dev-1/watering_status"), 0);

        store.disconnect_watchers();
        assert_eq!(other.next().await, Some(None));
        assert_eq!(other.next().await, None);
    }

    #[tokio::test]
    async fn test_empty_path_rejected() {
        let store = MemoryRealtimeStore::new();
        let result = store.write("/", json!(1)).await;
        assert!(matches!(result, Err(StoreError::InvalidPath(_))));
    }
}
