//! Chat session events and the transport seam.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use siram_runtime::ChatClient;
use tokio::sync::mpsc;

use crate::error::Result;

/// Why a chat connection closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The account was unlinked. Stored credentials are no longer valid.
    LoggedOut,
    /// Network or server dropped the connection.
    ConnectionLost,
    /// The server closed the connection.
    ConnectionClosed,
    /// Another client took over the session.
    ConnectionReplaced,
    /// The server asked for a fresh connection.
    RestartRequired,
}

impl DisconnectReason {
    /// Every close except a logout is followed by a reconnect.
    pub fn should_reconnect(&self) -> bool {
        !matches!(self, DisconnectReason::LoggedOut)
    }
}

/// A message received by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Chat address of the sender.
    pub sender: String,
    /// Plain or extended text body, if the message has one.
    pub text: Option<String>,
    /// Sent by the bot's own account.
    pub from_me: bool,
}

impl InboundMessage {
    pub fn text(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: Some(text.into()),
            from_me: false,
        }
    }
}

/// Events delivered by an open session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Open,
    Close(DisconnectReason),
    Message(InboundMessage),
    /// The transport rotated its credentials; they must be persisted.
    CredentialsUpdated(Value),
    /// Code to show the operator for linking the account.
    PairingCode(String),
}

/// One connection: an outbound client plus its event stream.
///
/// The stream ending without a `Close` counts as a lost connection.
pub struct ChatSession {
    pub client: Arc<dyn ChatClient>,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
}

/// Opens chat sessions.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Connects with previously saved credentials, if any.
    async fn connect(&self, credentials: Option<Value>) -> Result<ChatSession>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_logout_stops_reconnects() {
        assert!(!DisconnectReason::LoggedOut.should_reconnect());
        for reason in [
            DisconnectReason::ConnectionLost,
            DisconnectReason::ConnectionClosed,
            DisconnectReason::ConnectionReplaced,
            DisconnectReason::RestartRequired,
        ] {
            assert!(reason.should_reconnect(), "{reason:?}");
        }
    }
}
