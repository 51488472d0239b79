//! In-memory document store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

use crate::document::{ChangeKind, Document, DocumentChange, DocumentStore};
use crate::error::{Result, StoreError};
use crate::subscription::Subscription;

/// Document store keeping collections in insertion order.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    subscribers: RwLock<HashMap<String, Vec<UnboundedSender<DocumentChange>>>>,
    unavailable: AtomicBool,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a document and notifies watchers.
    pub fn upsert(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let docs = collections.entry(collection.to_string()).or_default();
        let document = Document::new(id, data);

        let kind = match docs.iter_mut().find(|d| d.id == id) {
            Some(existing) => {
                *existing = document.clone();
                ChangeKind::Modified
            }
            None => {
                docs.push(document.clone());
                ChangeKind::Added
            }
        };

        // Broadcast while holding the collection lock so a concurrent
        // `watch` never sees the document both in its snapshot and live.
        self.broadcast(collection, DocumentChange { kind, document });
        Ok(())
    }

    /// Removes a document. Returns false if it did not exist.
    pub fn remove(&self, collection: &str, id: &str) -> Result<bool> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(index) = docs.iter().position(|d| d.id == id) else {
            return Ok(false);
        };

        let document = docs.remove(index);
        self.broadcast(
            collection,
            DocumentChange {
                kind: ChangeKind::Removed,
                document,
            },
        );
        Ok(true)
    }

    /// Makes every trait operation fail with [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of live change-feed subscriptions on a collection.
    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.subscribers
            .read()
            .map(|subs| {
                subs.get(collection)
                    .map(|list| list.iter().filter(|tx| !tx.is_closed()).count())
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }

    /// Ends every change feed, as a dropped backend connection would.
    pub fn disconnect_watchers(&self) {
        if let Ok(mut subs) = self.subscribers.write() {
            let count: usize = subs.values().map(Vec::len).sum();
            subs.clear();
            debug!(count, "Disconnected document watchers");
        }
    }

    fn broadcast(&self, collection: &str, change: DocumentChange) {
        if let Ok(mut subs) = self.subscribers.write() {
            if let Some(list) = subs.get_mut(collection) {
                list.retain(|tx| tx.send(change.clone()).is_ok());
                trace!(collection, subscribers = list.len(), "Broadcast document change");
            }
        }
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("document store offline".to_string()));
        }
        Ok(())
    }

    fn snapshot(&self, collection: &str) -> Result<Vec<Document>> {
        let collections = self
            .collections
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> Result<Vec<Document>> {
        self.check_available()?;
        let matches = self
            .snapshot(collection)?
            .into_iter()
            .filter(|d| d.field(field) == Some(value))
            .take(limit.unwrap_or(usize::MAX))
            .collect();
        Ok(matches)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        self.check_available()?;
        self.snapshot(collection)
    }

    async fn watch(&self, collection: &str) -> Result<Subscription<DocumentChange>> {
        self.check_available()?;
        let collections = self
            .collections
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let mut subs = self
            .subscribers
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;

        let (tx, subscription) = Subscription::channel();
        for document in collections.get(collection).into_iter().flatten() {
            let _ = tx.send(DocumentChange {
                kind: ChangeKind::Added,
                document: document.clone(),
            });
        }
        subs.entry(collection.to_string()).or_default().push(tx);

        debug!(collection, "Document watcher registered");
        Ok(subscription)
    }
}
