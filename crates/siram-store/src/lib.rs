//! Store seams for Siram.
//!
//! Siram reads from two external stores:
//!
//! - a **document store** holding the `users` collection, queried by field
//!   equality and watched through a change feed
//! - a **realtime store** holding one key tree per device, read once, read
//!   by last-N children, written, and watched for value changes
//!
//! Both are traits so the runtime can be driven by any backend. The
//! [`memory`] module provides in-process implementations used by tests and
//! by local runs.
//!
//! # Example
//!
//! ```no_run
//! use siram_store::{MemoryRealtimeStore, RealtimeStore};
//! use serde_json::json;
//!
//! # async fn demo() -> siram_store::Result<()> {
//! let store = MemoryRealtimeStore::new();
//! let mut sub = store.watch("users/raspi-01/watering_status").await?;
//!
//! store.write("users/raspi-01/watering_status", json!("done")).await?;
//! while let Some(value) = sub.next().await {
//!     println!("status is now {:?}", value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod error;
pub mod memory;
pub mod realtime;
pub mod subscription;

pub use document::{ChangeKind, Document, DocumentChange, DocumentStore};
pub use error::{Result, StoreError};
pub use memory::{MemoryDocumentStore, MemoryRealtimeStore};
pub use realtime::RealtimeStore;
pub use subscription::Subscription;

/// Collection holding plant owners.
pub const USERS_COLLECTION: &str = "users";
