//! Console chat transport for local runs.
//!
//! Each stdin line `<phone> <text>` arrives as a message from that phone
//! number; replies are printed to stdout. End of input logs the session
//! out, which stops the bot.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use siram_core::to_chat_address;
use siram_runtime::{ChatClient, ChatError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::session::{ChatSession, ChatTransport, DisconnectReason, InboundMessage, SessionEvent};

/// Prints outbound messages.
pub struct ConsoleChat;

#[async_trait]
impl ChatClient for ConsoleChat {
    async fn send_text(&self, to: &str, text: &str) -> std::result::Result<(), ChatError> {
        println!("\n--> {}\n{}\n", to, text);
        Ok(())
    }
}

/// Splits a console line into sender address and text.
pub fn parse_line(line: &str) -> Option<InboundMessage> {
    let (phone, text) = line.trim().split_once(char::is_whitespace)?;
    let text = text.trim();
    if phone.is_empty() || text.is_empty() {
        return None;
    }
    Some(InboundMessage::text(to_chat_address(phone), text))
}

/// Forwards lines from `reader` as session events.
pub fn spawn_reader<R>(reader: R, events: mpsc::UnboundedSender<SessionEvent>)
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let _ = events.send(SessionEvent::Open);
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_line(&line) {
                    Some(message) => {
                        if events.send(SessionEvent::Message(message)).is_err() {
                            return;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => warn!(line = %line, "Expected '<phone> <text>'"),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Console input failed");
                    let _ = events.send(SessionEvent::Close(DisconnectReason::ConnectionLost));
                    return;
                }
            }
        }
        debug!("Console input closed");
        let _ = events.send(SessionEvent::Close(DisconnectReason::LoggedOut));
    });
}

/// Transport reading stdin.
#[derive(Debug, Default)]
pub struct ConsoleTransport;

impl ConsoleTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn connect(&self, _credentials: Option<Value>) -> Result<ChatSession> {
        let (tx, events) = mpsc::unbounded_channel();
        spawn_reader(BufReader::new(tokio::io::stdin()), tx);
        Ok(ChatSession {
            client: Arc::new(ConsoleChat),
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let message = parse_line("  08123 siram sekarang ").unwrap();
        assert_eq!(message.sender, "628123@s.whatsapp.net");
        assert_eq!(message.text.as_deref(), Some("siram sekarang"));
        assert!(!message.from_me);

        assert!(parse_line("08123").is_none());
        assert!(parse_line("").is_none());
    }

    #[tokio::test]
    async fn test_reader_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_reader(&b"0811 status\n\njunk\n0822 siram\n"[..], tx);

        assert_eq!(rx.recv().await, Some(SessionEvent::Open));
        assert_eq!(
            rx.recv().await,
            Some(SessionEvent::Message(InboundMessage::text("62811@s.whatsapp.net", "status")))
        );
        assert_eq!(
            rx.recv().await,
            Some(SessionEvent::Message(InboundMessage::text("62822@s.whatsapp.net", "siram")))
        );
        assert_eq!(
            rx.recv().await,
            Some(SessionEvent::Close(DisconnectReason::LoggedOut))
        );
        assert_eq!(rx.recv().await, None);
    }
}
