//! Connection lifecycle.

use std::sync::Arc;
use std::time::Duration;

use siram_runtime::PlantService;
use tracing::{debug, error, info, warn};

use crate::credentials::CredentialStore;
use crate::error::Result;
use crate::handlers::CommandHandler;
use crate::session::{ChatSession, ChatTransport, DisconnectReason, SessionEvent};

/// Drives chat sessions for a [`PlantService`].
///
/// Every close except a logout is followed by a reconnect after a fixed
/// delay. There is no backoff and no attempt limit. A logout invalidates
/// the saved credentials, so they are cleared before stopping.
pub struct SiramBot {
    service: Arc<PlantService>,
    transport: Arc<dyn ChatTransport>,
    credentials: CredentialStore,
    handler: CommandHandler,
    reconnect_delay: Duration,
}

impl SiramBot {
    pub fn new(
        service: Arc<PlantService>,
        transport: Arc<dyn ChatTransport>,
        credentials: CredentialStore,
    ) -> Self {
        let handler = CommandHandler::for_service(&service);
        let reconnect_delay = service.config().reconnect_delay;
        Self {
            service,
            transport,
            credentials,
            handler,
            reconnect_delay,
        }
    }

    pub fn service(&self) -> &Arc<PlantService> {
        &self.service
    }

    /// Starts the service and keeps a session open until logout.
    pub async fn run(&self) -> Result<()> {
        self.service.start().await?;

        loop {
            match self.run_session().await {
                Ok(reason) if !reason.should_reconnect() => {
                    info!(?reason, "Chat session logged out, stopping");
                    if let Err(e) = self.credentials.clear() {
                        warn!(error = %e, "Failed to clear chat credentials");
                    }
                    break;
                }
                Ok(reason) => info!(?reason, "Chat connection closed, reconnecting"),
                Err(e) => warn!(error = %e, "Chat connection failed, retrying"),
            }
            tokio::time::sleep(self.reconnect_delay).await;
        }

        self.service.shutdown().await?;
        Ok(())
    }

    /// Opens one session and processes its events until it closes.
    ///
    /// Each inbound message is answered on its own task, so a slow reply
    /// never holds up other senders or session events.
    pub async fn run_session(&self) -> Result<DisconnectReason> {
        let saved = self.credentials.load().unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring unreadable chat credentials");
            None
        });
        let ChatSession { client, mut events } = self.transport.connect(saved).await?;
        debug!("Chat session opened");

        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Open => {
                    info!("Connected, watching all devices");
                    if let Err(e) = self.service.connected(client.clone()).await {
                        error!(error = %e, "Failed to attach chat connection");
                    }
                }
                SessionEvent::Close(reason) => {
                    self.service.disconnected();
                    return Ok(reason);
                }
                SessionEvent::Message(message) => {
                    let handler = self.handler.clone();
                    let client = client.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handler.respond(client.as_ref(), &message).await {
                            let sender = &message.sender;
                            error!(sender = %sender, error = %e, "Failed to handle message");
                        }
                    });
                }
                SessionEvent::CredentialsUpdated(credentials) => {
                    if let Err(e) = self.credentials.save(&credentials) {
                        error!(error = %e, "Failed to save chat credentials");
                    }
                }
                SessionEvent::PairingCode(code) => {
                    info!("Pairing code received");
                    println!("\nLink this device with code: {}\n", code);
                }
            }
        }

        self.service.disconnected();
        Ok(DisconnectReason::ConnectionLost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InboundMessage;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use siram_core::{ForecastSource, WeatherError};
    use siram_runtime::{ChatClient, ChatError, RuntimeConfig};
    use siram_store::{MemoryDocumentStore, MemoryRealtimeStore, USERS_COLLECTION};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, String)>>);

    #[async_trait]
    impl ChatClient for Recorder {
        async fn send_text(&self, to: &str, text: &str) -> std::result::Result<(), ChatError> {
            self.0.lock().unwrap().push((to.to_string(), text.to_string()));
            Ok(())
        }
    }

    /// Replays one scripted event list per connect.
    struct Scripted {
        scripts: Mutex<VecDeque<Vec<SessionEvent>>>,
        seen_credentials: Mutex<Vec<Option<Value>>>,
        client: Arc<Recorder>,
    }

    #[async_trait]
    impl ChatTransport for Scripted {
        async fn connect(&self, credentials: Option<Value>) -> Result<ChatSession> {
            self.seen_credentials.lock().unwrap().push(credentials);
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| vec![SessionEvent::Close(DisconnectReason::LoggedOut)]);

            let (tx, events) = mpsc::unbounded_channel();
            for event in script {
                tx.send(event).unwrap();
            }
            Ok(ChatSession {
                client: self.client.clone(),
                events,
            })
        }
    }

    impl Scripted {
        fn new(scripts: Vec<Vec<SessionEvent>>, client: Arc<Recorder>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into()),
                seen_credentials: Mutex::new(Vec::new()),
                client,
            }
        }
    }

    struct Offline;

    #[async_trait]
    impl ForecastSource for Offline {
        async fn fetch(&self, _region_code: &str) -> std::result::Result<Value, WeatherError> {
            Err(WeatherError::RequestFailed("offline".to_string()))
        }
    }

    /// Never answers; only the fetch timeout ends a request.
    struct Stalled;

    #[async_trait]
    impl ForecastSource for Stalled {
        async fn fetch(&self, _region_code: &str) -> std::result::Result<Value, WeatherError> {
            std::future::pending().await
        }
    }

    fn service_with(forecasts: Arc<dyn ForecastSource>) -> Arc<PlantService> {
        let docs = Arc::new(MemoryDocumentStore::new());
        docs.upsert(
            USERS_COLLECTION,
            "u1",
            json!({"raspiId": "dev-1", "whatsapp": "0811", "kodeWilayah": "35.78"}),
        )
        .unwrap();
        docs.upsert(USERS_COLLECTION, "u2", json!({"raspiId": "dev-2", "whatsapp": "0822"}))
            .unwrap();
        Arc::new(PlantService::new(
            RuntimeConfig::default().with_reconnect_delay(Duration::ZERO),
            docs,
            Arc::new(MemoryRealtimeStore::new()),
            forecasts,
        ))
    }

    fn service() -> Arc<PlantService> {
        service_with(Arc::new(Offline))
    }

    async fn wait_for_sends(client: &Recorder, count: usize) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while client.0.lock().unwrap().len() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_reconnects_until_logout() {
        let dir = TempDir::new().unwrap();
        let client = Arc::new(Recorder::default());
        let transport = Arc::new(Scripted::new(
            vec![
                vec![
                    SessionEvent::Open,
                    SessionEvent::CredentialsUpdated(json!({"token": "t1"})),
                    SessionEvent::Message(InboundMessage::text("62899@s.whatsapp.net", "status")),
                    SessionEvent::Close(DisconnectReason::ConnectionLost),
                ],
                // Stream ends without a close.
                vec![SessionEvent::Open],
                vec![SessionEvent::Open, SessionEvent::Close(DisconnectReason::LoggedOut)],
            ],
            client.clone(),
        ));

        let bot = SiramBot::new(service(), transport.clone(), CredentialStore::new(dir.path()));
        bot.run().await.unwrap();

        let seen = transport.seen_credentials.lock().unwrap().clone();
        assert_eq!(seen, vec![None, Some(json!({"token": "t1"})), Some(json!({"token": "t1"}))]);

        wait_for_sends(&client, 1).await;
        let sent = client.0.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("Akses ditolak"));

        assert!(!bot.service().is_started());
        assert!(CredentialStore::new(dir.path()).load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_close_detaches_chat() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(Scripted::new(
            vec![vec![
                SessionEvent::Open,
                SessionEvent::Close(DisconnectReason::RestartRequired),
            ]],
            Arc::new(Recorder::default()),
        ));

        let bot = SiramBot::new(service(), transport, CredentialStore::new(dir.path()));
        bot.service().start().await.unwrap();

        let reason = bot.run_session().await.unwrap();
        assert_eq!(reason, DisconnectReason::RestartRequired);
        assert!(!bot.service().link().is_connected());

        bot.service().shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_slow_reply_does_not_hold_up_other_senders() {
        let dir = TempDir::new().unwrap();
        let client = Arc::new(Recorder::default());
        let transport = Arc::new(Scripted::new(
            vec![vec![
                SessionEvent::Open,
                SessionEvent::Message(InboundMessage::text("62811@s.whatsapp.net", "status")),
                SessionEvent::Message(InboundMessage::text("62822@s.whatsapp.net", "siram")),
                SessionEvent::Close(DisconnectReason::ConnectionLost),
            ]],
            client.clone(),
        ));

        let bot = SiramBot::new(
            service_with(Arc::new(Stalled)),
            transport,
            CredentialStore::new(dir.path()),
        );
        bot.service().start().await.unwrap();

        let reason = tokio::time::timeout(Duration::from_secs(1), bot.run_session())
            .await
            .expect("session loop blocked on a reply")
            .unwrap();
        assert_eq!(reason, DisconnectReason::ConnectionLost);

        wait_for_sends(&client, 1).await;
        let sent = client.0.lock().unwrap().clone();
        assert_eq!(sent.len(), 1, "status reply is still waiting on the forecast");
        assert_eq!(sent[0].0, "62822@s.whatsapp.net");
        assert!(sent[0].1.contains("dev-2"));

        bot.service().shutdown().await.unwrap();
    }
}
