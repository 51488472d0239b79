//! Notification runtime for Siram.
//!
//! This crate wires the store seams to the chat seam:
//! - `WateringWatcher` - one status subscription per device, feeding a
//!   single `WatchReactor` that detects transitions into `done`
//! - `RegistrationDispatcher` - follows the user collection and starts a
//!   watch for every newly registered device
//! - `PeriodicBroadcaster` - sends every owner a status card on a timer
//! - `PlantService` - owns all of the above for the process lifetime
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use siram_runtime::{PlantService, RuntimeConfig};
//! use siram_store::{MemoryDocumentStore, MemoryRealtimeStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = PlantService::new(
//!         RuntimeConfig::default(),
//!         Arc::new(MemoryDocumentStore::new()),
//!         Arc::new(MemoryRealtimeStore::new()),
//!         forecast_source,
//!     );
//!     service.start().await?;
//!
//!     // Every time the chat connection opens:
//!     service.connected(chat_client).await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     service.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency
//!
//! Store subscriptions are forwarded onto channels and consumed by tasks;
//! no callback runs inside a store. The only shared mutable state is the
//! watch registry and the dispatcher's listener slot, both updated under a
//! short lock that never spans an `.await`.

pub mod broadcaster;
pub mod chat;
pub mod config;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod notifier;
pub mod registry;
pub mod service;
pub mod telemetry;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use broadcaster::{BroadcastReport, PeriodicBroadcaster};
pub use chat::{ChatClient, ChatError, ChatLink};
pub use config::RuntimeConfig;
pub use directory::{device_id_of, Directory};
pub use dispatcher::RegistrationDispatcher;
pub use error::{Result, RuntimeError};
pub use notifier::{CompletionNotifier, ForecastStyle, Forecaster, StatusNotifier};
pub use registry::{ListenerSlot, WatchRegistry};
pub use service::PlantService;
pub use telemetry::Telemetry;
pub use watcher::{CompletionHandler, StatusEvent, WatchReactor, WatchState, WateringWatcher};
