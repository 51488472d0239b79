//! Seeding the in-memory stores from a JSON fixture.
//!
//! ```json
//! {
//!   "users": [{"id": "user-ani", "raspiId": "raspi-01", "whatsapp": "0812..."}],
//!   "realtime": {"users": {"raspi-01": {"watering_status": "idle"}}}
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use siram_store::{MemoryDocumentStore, MemoryRealtimeStore, USERS_COLLECTION};
use tracing::info;

use crate::error::{BotError, Result};

#[derive(Debug, Deserialize)]
struct SeedUser {
    id: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    users: Vec<SeedUser>,
    #[serde(default)]
    realtime: Option<Value>,
}

impl SeedData {
    /// Reads a seed file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::parse(&data)
    }

    /// Parses seed JSON.
    pub fn parse(data: &str) -> Result<Self> {
        let seed: SeedData = serde_json::from_str(data)?;
        if let Some(root) = &seed.realtime {
            if !root.is_object() {
                return Err(BotError::InvalidSeed("realtime must be an object".to_string()));
            }
        }
        Ok(seed)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Builds stores holding the seeded data, users in file order.
    pub fn into_stores(self) -> Result<(Arc<MemoryDocumentStore>, Arc<MemoryRealtimeStore>)> {
        let docs = Arc::new(MemoryDocumentStore::new());
        let count = self.users.len();
        for user in self.users {
            docs.upsert(USERS_COLLECTION, &user.id, Value::Object(user.fields))
                .map_err(|e| BotError::InvalidSeed(e.to_string()))?;
        }

        let realtime = match self.realtime {
            Some(root) => MemoryRealtimeStore::with_root(root),
            None => MemoryRealtimeStore::new(),
        };

        info!(users = count, "Seeded in-memory stores");
        Ok((docs, Arc::new(realtime)))
    }
}
