//! Minimal embedding example for heatmon-core
//!
//! Demonstrates using heatmon-core as a library in a custom application:
//! a scripted in-process backend, the in-memory device store, and a
//! custom event sink. The device lifecycle is fully managed by the
//! application.

use async_trait::async_trait;
use heatmon_core::config::{ConnectionSettings, DeviceConfig, EngineConfig};
use heatmon_core::traits::{
    BackendClient, BackendConnector, BackendResponse, EventScope, EventSink,
};
use heatmon_core::{HeatPumpDevice, MemoryDeviceStore, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Backend answering from a small canned table; flips the health status
/// to faulted after the first few reads to show decoration
struct EmbeddedBackend {
    faulted: Arc<AtomicBool>,
}

#[async_trait]
impl BackendClient for EmbeddedBackend {
    async fn get(&self, path: &str) -> Result<BackendResponse> {
        let body = match path {
            "/heatSources/actualSupplyTemperature" => serde_json::json!({ "value": 41.3 }),
            "/heatSources/returnTemperature" => serde_json::json!({ "value": 35.8 }),
            "/system/sensors/temperatures/outdoor_t1" => serde_json::json!({ "value": 4.5 }),
            "/dhwCircuits/dhw1/actualTemp" => serde_json::json!({ "value": 49.2 }),
            "/system/healthStatus" => {
                let status = if self.faulted.load(Ordering::SeqCst) {
                    "error"
                } else {
                    "ok"
                };
                serde_json::json!({ "value": status })
            }
            "/notifications" => serde_json::json!({ "values": [{ "ccd": "E21" }] }),
            path if path.starts_with("/recordings/") => {
                let recording: Vec<_> = (0..24)
                    .map(|_| serde_json::json!({ "y": 2.4, "c": 4 }))
                    .collect();
                serde_json::json!({ "recording": recording })
            }
            other => {
                return Err(heatmon_core::Error::fetch(format!("unknown path: {other}")));
            }
        };
        Ok(serde_json::from_value(body)?)
    }

    async fn close(&self) -> Result<()> {
        println!("[embedded] backend session closed");
        Ok(())
    }
}

struct EmbeddedConnector {
    faulted: Arc<AtomicBool>,
}

#[async_trait]
impl BackendConnector for EmbeddedConnector {
    async fn connect(&self, settings: &ConnectionSettings) -> Result<Box<dyn BackendClient>> {
        println!("[embedded] connecting with serial {}", settings.serial);
        Ok(Box::new(EmbeddedBackend {
            faulted: self.faulted.clone(),
        }))
    }
}

/// Event sink that prints triggered events
struct PrintEventSink;

#[async_trait]
impl EventSink for PrintEventSink {
    async fn trigger(
        &self,
        scope: EventScope,
        event: &str,
        tokens: HashMap<String, String>,
    ) -> Result<()> {
        println!("[event] {scope:?} {event} {tokens:?}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Embedded heatmon-core Example ===\n");

    let faulted = Arc::new(AtomicBool::new(false));
    let connector = EmbeddedConnector {
        faulted: faulted.clone(),
    };
    let store = Arc::new(MemoryDeviceStore::new());
    let sink = Arc::new(PrintEventSink);

    let config = DeviceConfig {
        name: "Demo heat pump".to_string(),
        settings: ConnectionSettings {
            serial: "7736901234".to_string(),
            access_key: "demo_access_key1".to_string(),
            password: "demo".to_string(),
        },
        poll_interval_secs: 10,
        engine: EngineConfig::default(),
    };

    println!("1. Initializing device...");
    let (device, mut event_rx) =
        HeatPumpDevice::init(&connector, store, sink, config).await?;

    // Observe engine events alongside the triggered ones
    let event_listener = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            println!("[engine] {event:?}");
        }
    });

    println!("2. Polling healthy for one interval...");
    tokio::time::sleep(std::time::Duration::from_secs(11)).await;

    println!("3. Flipping the health status to faulted...");
    faulted.store(true, Ordering::SeqCst);
    tokio::time::sleep(std::time::Duration::from_secs(10)).await;

    println!("4. Clearing the fault...");
    faulted.store(false, Ordering::SeqCst);
    tokio::time::sleep(std::time::Duration::from_secs(10)).await;

    println!("5. Tearing down...");
    device.teardown().await;
    event_listener.abort();

    println!("\n=== Embedding Successful ===");
    Ok(())
}
