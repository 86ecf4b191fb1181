//! Test doubles and common utilities for architecture contract tests
//!
//! Scripted collaborators that verify engine, pairing and lifecycle
//! behavior without a real gateway.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use heatmon_core::config::{ConnectionSettings, DeviceConfig, EngineConfig};
use heatmon_core::engine::{EngineEvent, PollEngine};
use heatmon_core::traits::{
    BackendClient, BackendConnector, BackendResponse, CapabilityValue, DeviceEntry, DeviceStore,
    EventScope, EventSink,
};
use heatmon_core::{Error, MemoryDeviceStore, Result};
use tokio::sync::mpsc;

/// Device identity used throughout the contract tests
pub const DEVICE_ID: &str = "7736901234";

/// How a scripted path should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    Fetch,
    Auth,
}

#[derive(Default)]
struct ScriptedInner {
    /// Raw JSON responses, keyed by exact path or path prefix
    responses: Mutex<HashMap<String, serde_json::Value>>,
    /// Injected failures, keyed by path prefix
    failures: Mutex<HashMap<String, ScriptedFailure>>,
    /// Injected latency, keyed by path prefix
    delays: Mutex<HashMap<String, Duration>>,
    /// Every path requested, in order
    calls: Mutex<Vec<String>>,
    close_count: AtomicUsize,
}

/// A backend session answering from a scripted response table
///
/// Clones share the same script and counters.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    inner: Arc<ScriptedInner>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend with every registry capability reporting healthy values
    pub fn healthy() -> Self {
        let backend = Self::new();
        backend.set_scalar("/heatSources/actualSupplyTemperature", serde_json::json!(40.1));
        backend.set_scalar("/heatSources/returnTemperature", serde_json::json!(35.2));
        backend.set_scalar(
            "/system/sensors/temperatures/outdoor_t1",
            serde_json::json!(7.5),
        );
        backend.set_scalar("/dhwCircuits/dhw1/actualTemp", serde_json::json!(48.0));
        backend.set_scalar("/system/healthStatus", serde_json::json!("ok"));
        backend.set_recording(
            "/recordings/heatSources/total/energyMonitoring/consumedEnergy",
            &[(2.4, 4); 24],
        );
        backend.set_recording(
            "/recordings/heatSources/total/energyMonitoring/eheater",
            &[(0.8, 4); 24],
        );
        backend.set_recording(
            "/recordings/heatSources/total/energyMonitoring/compressor",
            &[(1.6, 4); 24],
        );
        backend.set_notifications(&[]);
        backend
    }

    /// Script a `{"value": ..}` response
    pub fn set_scalar(&self, path: &str, value: serde_json::Value) {
        self.set_raw(path, serde_json::json!({ "value": value }));
    }

    /// Script a `{"recording": [..]}` response under a path prefix
    pub fn set_recording(&self, path_prefix: &str, buckets: &[(f64, u32)]) {
        let recording: Vec<serde_json::Value> = buckets
            .iter()
            .map(|(y, c)| serde_json::json!({ "y": y, "c": c }))
            .collect();
        self.set_raw(path_prefix, serde_json::json!({ "recording": recording }));
    }

    /// Script the `{"values": [..]}` notification response
    pub fn set_notifications(&self, codes: &[&str]) {
        let values: Vec<serde_json::Value> = codes
            .iter()
            .map(|code| serde_json::json!({ "ccd": code }))
            .collect();
        self.set_raw("/notifications", serde_json::json!({ "values": values }));
    }

    /// Script an arbitrary raw response
    pub fn set_raw(&self, path: &str, response: serde_json::Value) {
        self.inner
            .responses
            .lock()
            .unwrap()
            .insert(path.to_string(), response);
    }

    /// Make reads under a path prefix fail
    pub fn fail_path(&self, path_prefix: &str, failure: ScriptedFailure) {
        self.inner
            .failures
            .lock()
            .unwrap()
            .insert(path_prefix.to_string(), failure);
    }

    /// Stop failing a previously failed prefix
    pub fn heal_path(&self, path_prefix: &str) {
        self.inner.failures.lock().unwrap().remove(path_prefix);
    }

    /// Delay reads under a path prefix
    pub fn delay_path(&self, path_prefix: &str, delay: Duration) {
        self.inner
            .delays
            .lock()
            .unwrap()
            .insert(path_prefix.to_string(), delay);
    }

    /// Every requested path, in request order
    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().unwrap().clone()
    }

    /// How often `close()` was invoked
    pub fn close_count(&self) -> usize {
        self.inner.close_count.load(Ordering::SeqCst)
    }

    fn lookup(&self, path: &str) -> Option<serde_json::Value> {
        let responses = self.inner.responses.lock().unwrap();
        if let Some(exact) = responses.get(path) {
            return Some(exact.clone());
        }
        responses
            .iter()
            .find(|(key, _)| path.starts_with(key.as_str()))
            .map(|(_, value)| value.clone())
    }
}

#[async_trait]
impl BackendClient for ScriptedBackend {
    async fn get(&self, path: &str) -> Result<BackendResponse> {
        self.inner.calls.lock().unwrap().push(path.to_string());

        let delay = {
            let delays = self.inner.delays.lock().unwrap();
            delays
                .iter()
                .find(|(key, _)| path.starts_with(key.as_str()))
                .map(|(_, delay)| *delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = {
            let failures = self.inner.failures.lock().unwrap();
            failures
                .iter()
                .find(|(key, _)| path.starts_with(key.as_str()))
                .map(|(_, failure)| *failure)
        };
        match failure {
            Some(ScriptedFailure::Fetch) => {
                return Err(Error::fetch(format!("scripted failure for {path}")));
            }
            Some(ScriptedFailure::Auth) => {
                return Err(Error::auth(format!("scripted rejection for {path}")));
            }
            None => {}
        }

        let value = self
            .lookup(path)
            .ok_or_else(|| Error::fetch(format!("no scripted response for {path}")))?;
        Ok(serde_json::from_value(value)?)
    }

    async fn close(&self) -> Result<()> {
        self.inner.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A connector handing out clones of one scripted backend
#[derive(Clone)]
pub struct ScriptedConnector {
    backend: ScriptedBackend,
    refuse: Arc<AtomicBool>,
    connect_count: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub fn new(backend: ScriptedBackend) -> Self {
        Self {
            backend,
            refuse: Arc::new(AtomicBool::new(false)),
            connect_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every `connect` fail
    pub fn refuse_connections(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }

    pub fn connect_count(&self) -> usize {
        self.connect_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendConnector for ScriptedConnector {
    async fn connect(&self, _settings: &ConnectionSettings) -> Result<Box<dyn BackendClient>> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(Error::connection("scripted connection refusal"));
        }
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.backend.clone()))
    }
}

/// One event delivered to the sink
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub scope: EventScope,
    pub name: String,
    pub tokens: HashMap<String, String>,
}

/// An event sink that records every trigger
#[derive(Clone, Default)]
pub struct RecordingEventSink {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `trigger` fail with an emit error
    pub fn fail_deliveries(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn named(&self, name: &str) -> Vec<RecordedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.name == name)
            .collect()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn trigger(
        &self,
        scope: EventScope,
        event: &str,
        tokens: HashMap<String, String>,
    ) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::emit("scripted delivery failure"));
        }
        self.events.lock().unwrap().push(RecordedEvent {
            scope,
            name: event.to_string(),
            tokens,
        });
        Ok(())
    }
}

/// Device store delegating to [`MemoryDeviceStore`] while counting writes
#[derive(Clone, Default)]
pub struct MockDeviceStore {
    store: MemoryDeviceStore,
    set_calls: Arc<Mutex<Vec<String>>>,
}

impl MockDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with the contract-test device already registered
    pub async fn with_device() -> Self {
        let store = Self::new();
        store
            .register_device(DeviceEntry {
                identity: DEVICE_ID.to_string(),
                name: "Heat pump".to_string(),
            })
            .await
            .unwrap();
        store
    }

    /// Total number of value writes
    pub fn set_count(&self) -> usize {
        self.set_calls.lock().unwrap().len()
    }

    /// Number of writes for one capability
    pub fn set_count_for(&self, capability: &str) -> usize {
        self.set_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|written| written.as_str() == capability)
            .count()
    }

    pub async fn value(&self, capability: &str) -> Option<CapabilityValue> {
        self.store.get_value(DEVICE_ID, capability).await.unwrap()
    }
}

#[async_trait]
impl DeviceStore for MockDeviceStore {
    async fn find_by_identity(&self, identity: &str) -> Result<Option<DeviceEntry>> {
        self.store.find_by_identity(identity).await
    }

    async fn register_device(&self, entry: DeviceEntry) -> Result<()> {
        self.store.register_device(entry).await
    }

    async fn remove_device(&self, identity: &str) -> Result<()> {
        self.store.remove_device(identity).await
    }

    async fn get_value(&self, identity: &str, capability: &str) -> Result<Option<CapabilityValue>> {
        self.store.get_value(identity, capability).await
    }

    async fn set_value(
        &self,
        identity: &str,
        capability: &str,
        value: CapabilityValue,
    ) -> Result<()> {
        self.set_calls.lock().unwrap().push(capability.to_string());
        self.store.set_value(identity, capability, value).await
    }
}

/// Connection settings accepted by config validation
pub fn settings() -> ConnectionSettings {
    ConnectionSettings {
        serial: DEVICE_ID.to_string(),
        access_key: "abcd1234efgh5678".to_string(),
        password: "secret".to_string(),
    }
}

/// A minimal valid device configuration
pub fn device_config(interval_secs: u64) -> DeviceConfig {
    DeviceConfig {
        name: "Heat pump".to_string(),
        settings: settings(),
        poll_interval_secs: interval_secs,
        engine: EngineConfig {
            fetch_timeout_secs: 5,
            event_channel_capacity: 100,
        },
    }
}

/// Build an engine over the given doubles
///
/// Returns the engine, its event receiver, and the liveness flag the
/// engine watches.
pub fn engine_with(
    backend: &ScriptedBackend,
    store: &MockDeviceStore,
    sink: &RecordingEventSink,
) -> (
    PollEngine,
    mpsc::Receiver<EngineEvent>,
    Arc<AtomicBool>,
) {
    let live = Arc::new(AtomicBool::new(true));
    let (engine, event_rx) = PollEngine::new(
        Box::new(backend.clone()),
        Arc::new(store.clone()),
        Arc::new(sink.clone()),
        DEVICE_ID,
        live.clone(),
        EngineConfig {
            fetch_timeout_secs: 5,
            event_channel_capacity: 100,
        },
    );
    (engine, event_rx, live)
}
