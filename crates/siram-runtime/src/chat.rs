//! Outbound chat seam.
//!
//! The chat-protocol client is external. The runtime only needs to send a
//! text to an address, and to survive the client being replaced on every
//! reconnect, which is what [`ChatLink`] is for.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Errors from the chat client.
#[derive(Debug, Error)]
pub enum ChatError {
    /// No live chat connection.
    #[error("chat is not connected")]
    NotConnected,

    /// The client rejected or failed to deliver the message.
    #[error("send to {to} failed: {reason}")]
    SendFailed { to: String, reason: String },
}

/// Sends text messages to chat addresses.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends one text message.
    async fn send_text(&self, to: &str, text: &str) -> Result<(), ChatError>;
}

/// Swappable handle to the current chat connection.
///
/// Long-lived components hold a `ChatLink` instead of a client, so a
/// reconnect never leaves them sending through a dead connection.
#[derive(Clone, Default)]
pub struct ChatLink {
    current: Arc<RwLock<Option<Arc<dyn ChatClient>>>>,
}

impl ChatLink {
    /// Creates a link with no connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes sends through a new connection.
    pub fn connect(&self, client: Arc<dyn ChatClient>) {
        if let Ok(mut current) = self.current.write() {
            *current = Some(client);
            debug!("Chat link connected");
        }
    }

    /// Drops the current connection.
    pub fn disconnect(&self) {
        if let Ok(mut current) = self.current.write() {
            *current = None;
            debug!("Chat link disconnected");
        }
    }

    /// Returns true while a connection is installed.
    pub fn is_connected(&self) -> bool {
        self.current.read().map(|c| c.is_some()).unwrap_or(false)
    }

    fn client(&self) -> Option<Arc<dyn ChatClient>> {
        self.current.read().ok().and_then(|c| c.clone())
    }
}

#[async_trait]
impl ChatClient for ChatLink {
    async fn send_text(&self, to: &str, text: &str) -> Result<(), ChatError> {
        let client = self.client().ok_or(ChatError::NotConnected)?;
        client.send_text(to, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingChat;

    #[tokio::test]
    async fn test_link_routes_to_current_client() {
        let link = ChatLink::new();
        let result = link.send_text("628@s.whatsapp.net", "hi").await;
        assert!(matches!(result, Err(ChatError::NotConnected)));

        let first = Arc::new(RecordingChat::new());
        let second = Arc::new(RecordingChat::new());

        link.connect(first.clone());
        link.send_text("a", "one").await.unwrap();
        link.connect(second.clone());
        link.send_text("a", "two").await.unwrap();

        assert_eq!(first.texts(), vec!["one"]);
        assert_eq!(second.texts(), vec!["two"]);

        link.disconnect();
        assert!(!link.is_connected());
    }
}
