//! Process-wide service owning the watcher, dispatcher and broadcaster.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use siram_core::{ForecastSource, WeatherFetcher};
use siram_store::{DocumentStore, RealtimeStore};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::broadcaster::PeriodicBroadcaster;
use crate::chat::{ChatClient, ChatLink};
use crate::config::RuntimeConfig;
use crate::directory::Directory;
use crate::dispatcher::RegistrationDispatcher;
use crate::error::{Result, RuntimeError};
use crate::notifier::{CompletionNotifier, Forecaster, StatusNotifier};
use crate::telemetry::Telemetry;
use crate::watcher::{WatchReactor, WateringWatcher};

/// Owns every long-lived component.
///
/// Created once per process. Chat connections come and go through
/// [`connected`](Self::connected) and [`disconnected`](Self::disconnected);
/// the broadcaster timer and the watches outlive them.
pub struct PlantService {
    config: RuntimeConfig,
    directory: Directory,
    telemetry: Telemetry,
    forecaster: Forecaster,
    link: ChatLink,
    watcher: WateringWatcher,
    dispatcher: RegistrationDispatcher,
    broadcaster: Arc<PeriodicBroadcaster>,
    reactor: Mutex<Option<WatchReactor>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
    started: AtomicBool,
}

impl PlantService {
    pub fn new(
        config: RuntimeConfig,
        docs: Arc<dyn DocumentStore>,
        realtime: Arc<dyn RealtimeStore>,
        forecasts: Arc<dyn ForecastSource>,
    ) -> Self {
        let directory = Directory::new(docs.clone());
        let telemetry = Telemetry::new(realtime);
        let weather = WeatherFetcher::new(forecasts).with_timeout(config.weather_timeout);
        let forecaster = Forecaster::new(directory.clone(), weather);
        let link = ChatLink::new();

        let (watcher, reactor) = WateringWatcher::new(telemetry.clone());
        let dispatcher = RegistrationDispatcher::new(docs, watcher.clone());
        let broadcaster = Arc::new(PeriodicBroadcaster::new(
            directory.clone(),
            telemetry.clone(),
            forecaster.clone(),
            StatusNotifier::new(Arc::new(link.clone())),
            config.broadcast_period,
        ));
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            directory,
            telemetry,
            forecaster,
            link,
            watcher,
            dispatcher,
            broadcaster,
            reactor: Mutex::new(Some(reactor)),
            tasks: Mutex::new(Vec::new()),
            shutdown_tx,
            started: AtomicBool::new(false),
        }
    }

    /// Starts the reactor and the broadcaster and arms every known device.
    pub async fn start(&self) -> Result<()> {
        let reactor = self
            .reactor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(RuntimeError::AlreadyStarted)?;
        self.started.store(true, Ordering::SeqCst);

        info!("Starting plant service");

        let completion = CompletionNotifier::new(
            self.directory.clone(),
            self.telemetry.clone(),
            StatusNotifier::new(Arc::new(self.link.clone())),
        );
        let reactor_task = tokio::spawn(reactor.run(Arc::new(completion)));
        let broadcaster_task = tokio::spawn(
            Arc::clone(&self.broadcaster).run(self.shutdown_tx.subscribe()),
        );
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend([reactor_task, broadcaster_task]);

        match self.directory.device_owners().await {
            Ok(owners) => {
                for device in owners.iter().filter_map(|u| u.device_id.as_ref()) {
                    if let Err(e) = self.watcher.watch(device).await {
                        warn!(device = %device, error = %e, "Failed to watch device");
                    }
                }
            }
            Err(e) => warn!(error = %e, "Could not list devices at startup"),
        }

        debug!(watched = self.watcher.watched().len(), "Plant service started");
        Ok(())
    }

    /// Routes output through a new chat connection.
    ///
    /// Restarts the registration listener and re-arms lost watches.
    /// Returns the number of watches re-armed.
    pub async fn connected(&self, client: Arc<dyn ChatClient>) -> Result<usize> {
        if !self.is_started() {
            return Err(RuntimeError::NotStarted);
        }
        self.link.connect(client);
        self.dispatcher.start().await?;
        let rearmed = self.watcher.rearm().await;
        info!(rearmed, "Chat connection live");
        Ok(rearmed)
    }

    /// Drops the current chat connection and its registration listener.
    pub fn disconnected(&self) {
        self.link.disconnect();
        self.dispatcher.stop();
        debug!("Chat connection dropped");
    }

    /// Stops every task and subscription.
    pub async fn shutdown(&self) -> Result<()> {
        if !self.started.swap(false, Ordering::SeqCst) {
            return Err(RuntimeError::NotStarted);
        }

        info!("Shutting down plant service");
        let _ = self.shutdown_tx.send(true);
        self.disconnected();
        self.watcher.shutdown();

        let tasks: Vec<_> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for task in tasks {
            task.abort();
            let _ = task.await;
        }

        info!("Plant service stopped");
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn forecaster(&self) -> &Forecaster {
        &self.forecaster
    }

    pub fn watcher(&self) -> &WateringWatcher {
        &self.watcher
    }

    pub fn broadcaster(&self) -> &Arc<PeriodicBroadcaster> {
        &self.broadcaster
    }

    pub fn link(&self) -> &ChatLink {
        &self.link
    }
}

impl Drop for PlantService {
    fn drop(&mut self) {
        if self.is_started() {
            let _ = self.shutdown_tx.send(true);
            self.watcher.shutdown();
        }
    }
}
