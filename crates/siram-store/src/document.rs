//! Document store seam.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::subscription::Subscription;

/// A stored document: id plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Returns a top-level field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

/// Kind of change reported by a collection feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One entry of a collection change feed.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    pub kind: ChangeKind,
    pub document: Document,
}

/// Collection-oriented document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns documents whose `field` equals `value`, in collection order.
    ///
    /// Equality is exact (case-sensitive for strings). `limit` caps the
    /// number of results.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> Result<Vec<Document>>;

    /// Returns every document of a collection, in collection order.
    async fn list(&self, collection: &str) -> Result<Vec<Document>>;

    /// Subscribes to a collection's change feed.
    ///
    /// The feed starts with one `Added` change per existing document,
    /// followed by live add/modify/remove changes.
    async fn watch(&self, collection: &str) -> Result<Subscription<DocumentChange>>;
}
