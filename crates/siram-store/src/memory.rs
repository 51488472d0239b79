//! In-process store implementations.
//!
//! Both stores keep their data behind a `std::sync` lock and fan changes
//! out to subscribers over unbounded channels. Subscribers whose receiving
//! side was dropped are pruned on the next delivery.
//!
//! They also expose a few controls that real backends do not have, so the
//! runtime's failure handling can be exercised: marking the store
//! unavailable and cutting every live subscription.

mod documents;
mod realtime;

pub use documents::MemoryDocumentStore;
pub use realtime::MemoryRealtimeStore;
