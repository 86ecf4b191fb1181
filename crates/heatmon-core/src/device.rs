//! Device lifecycle glue
//!
//! Ties one configured heat pump to its backend session, poll engine and
//! scheduler. Initialization connects (the only fatal failure), registers
//! the inventory entry, and starts polling; settings changes restart the
//! scheduler only when the interval changed; teardown cancels the task,
//! closes the session and removes the entry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::{DeviceConfig, SettingsChange};
use crate::engine::{EngineEvent, PollEngine};
use crate::scheduler::PollScheduler;
use crate::traits::{BackendConnector, DeviceEntry, DeviceStore, EventSink};
use crate::Result;

/// One initialized heat-pump device
pub struct HeatPumpDevice {
    config: DeviceConfig,
    engine: Arc<PollEngine>,
    scheduler: PollScheduler,
    store: Arc<dyn DeviceStore>,
    live: Arc<AtomicBool>,
}

impl HeatPumpDevice {
    /// Initialize a device
    ///
    /// Connects to the backend (a failure here aborts startup and is
    /// surfaced to the host), registers the device entry, and starts the
    /// periodic poll task at the configured interval.
    ///
    /// # Returns
    ///
    /// The device plus the receiver of its engine events.
    pub async fn init(
        connector: &dyn BackendConnector,
        store: Arc<dyn DeviceStore>,
        sink: Arc<dyn EventSink>,
        config: DeviceConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let client = connector.connect(&config.settings).await?;
        info!(
            device = %config.name,
            identity = %config.identity(),
            "connected to backend"
        );

        store
            .register_device(DeviceEntry {
                identity: config.identity().to_string(),
                name: config.name.clone(),
            })
            .await?;

        let live = Arc::new(AtomicBool::new(true));
        let (engine, event_rx) = PollEngine::new(
            client,
            store.clone(),
            sink,
            config.identity(),
            live.clone(),
            config.engine.clone(),
        );
        let engine = Arc::new(engine);

        let mut scheduler = PollScheduler::new();
        let tick_engine = engine.clone();
        scheduler.start(Duration::from_secs(config.poll_interval_secs), move || {
            let engine = tick_engine.clone();
            async move {
                engine.poll_cycle().await;
            }
        });

        info!(
            device = %config.name,
            interval_secs = config.poll_interval_secs,
            "device initialized, polling started"
        );

        Ok((
            Self {
                config,
                engine,
                scheduler,
                store,
                live,
            },
            event_rx,
        ))
    }

    /// The device configuration
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Apply a settings change from the host
    ///
    /// Only an interval change touches the scheduler; other settings take
    /// effect without restarting anything. The password is never logged.
    pub fn apply_settings(&mut self, change: SettingsChange) {
        for key in &change.changed_keys {
            if key != "password" {
                info!(device = %self.config.name, setting = %key, "setting changed");
            }
        }

        if change.interval_changed() {
            info!(
                device = %self.config.name,
                old_secs = change.old.poll_interval_secs,
                new_secs = change.new.poll_interval_secs,
                "poll interval changed, restarting poll task"
            );
            self.scheduler
                .restart(Duration::from_secs(change.new.poll_interval_secs));
        }

        self.config = change.new;
    }

    /// Tear the device down
    ///
    /// Clears the liveness flag first so a cycle already in flight will
    /// not write state or trigger events for a removed device, then
    /// cancels the poll task, closes the backend session and removes the
    /// inventory entry.
    pub async fn teardown(mut self) {
        info!(device = %self.config.name, "tearing down device");

        self.live.store(false, Ordering::SeqCst);
        self.scheduler.stop();

        if let Err(err) = self.engine.close().await {
            warn!(error = %err, "failed to close backend session");
        }

        if let Err(err) = self.store.remove_device(self.config.identity()).await {
            warn!(error = %err, "failed to remove device entry");
        }
    }
}
