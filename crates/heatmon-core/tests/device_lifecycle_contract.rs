//! Architectural Contract Test: Device Lifecycle
//!
//! Constraints verified:
//! - Initialization connects, registers the inventory entry and starts
//!   polling at the configured cadence
//! - A backend connection failure aborts startup (the only fatal error)
//! - An interval settings change swaps the poll task without extra ticks
//! - Teardown stops polling, closes the session and removes the entry
//!
//! If this test fails, device startup or teardown leaks tasks, sessions
//! or inventory entries.

mod common;

use common::*;
use heatmon_core::{DeviceStore, Error, HeatPumpDevice, SettingsChange};
use std::sync::Arc;
use std::time::Duration;

fn cycles_fired(backend: &ScriptedBackend) -> usize {
    // A healthy cycle reads every registry capability exactly once
    backend.calls().len() / heatmon_core::capabilities::all().len()
}

#[tokio::test(start_paused = true)]
async fn init_starts_polling_and_teardown_stops_it() {
    let backend = ScriptedBackend::healthy();
    let connector = ScriptedConnector::new(backend.clone());
    let store = Arc::new(MockDeviceStore::new());
    let sink = Arc::new(RecordingEventSink::new());

    let (device, _events) = HeatPumpDevice::init(
        &connector,
        store.clone(),
        sink,
        device_config(10),
    )
    .await
    .expect("device initializes");

    assert_eq!(connector.connect_count(), 1);
    assert!(
        store.find_by_identity(DEVICE_ID).await.unwrap().is_some(),
        "inventory entry created at init"
    );

    // First poll fires one interval after start
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(cycles_fired(&backend), 1);

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(cycles_fired(&backend), 3);

    device.teardown().await;
    assert_eq!(backend.close_count(), 1);
    assert!(
        store.find_by_identity(DEVICE_ID).await.unwrap().is_none(),
        "inventory entry removed at teardown"
    );

    let frozen = backend.calls().len();
    tokio::time::sleep(Duration::from_secs(100)).await;
    assert_eq!(backend.calls().len(), frozen, "no polling after teardown");
}

#[tokio::test]
async fn connection_failure_aborts_startup() {
    let backend = ScriptedBackend::healthy();
    let connector = ScriptedConnector::new(backend.clone());
    connector.refuse_connections();
    let store = Arc::new(MockDeviceStore::new());
    let sink = Arc::new(RecordingEventSink::new());

    let result = HeatPumpDevice::init(&connector, store.clone(), sink, device_config(10)).await;

    assert!(matches!(result, Err(Error::Connection(_))));
    assert!(
        store.find_by_identity(DEVICE_ID).await.unwrap().is_none(),
        "nothing registered on a failed init"
    );
}

#[tokio::test]
async fn invalid_config_is_rejected_before_connecting() {
    let backend = ScriptedBackend::healthy();
    let connector = ScriptedConnector::new(backend.clone());
    let store = Arc::new(MockDeviceStore::new());
    let sink = Arc::new(RecordingEventSink::new());

    let result =
        HeatPumpDevice::init(&connector, store.clone(), sink, device_config(5)).await;

    assert!(matches!(result, Err(Error::Config(_))));
    assert_eq!(connector.connect_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn interval_change_swaps_the_poll_task_cleanly() {
    let backend = ScriptedBackend::healthy();
    let connector = ScriptedConnector::new(backend.clone());
    let store = Arc::new(MockDeviceStore::new());
    let sink = Arc::new(RecordingEventSink::new());

    let old_config = device_config(100);
    let (mut device, _events) = HeatPumpDevice::init(
        &connector,
        store.clone(),
        sink,
        old_config.clone(),
    )
    .await
    .expect("device initializes");

    tokio::time::sleep(Duration::from_secs(150)).await;
    assert_eq!(cycles_fired(&backend), 1);

    let new_config = device_config(200);
    device.apply_settings(SettingsChange {
        old: old_config,
        new: new_config,
        changed_keys: vec!["poll_interval_secs".to_string()],
    });

    // The old cadence would have ticked at +200; nothing fires in the gap
    tokio::time::sleep(Duration::from_secs(150)).await;
    assert_eq!(cycles_fired(&backend), 1, "no tick in the swap gap");

    // The new cadence ticks 200 seconds after the restart
    tokio::time::sleep(Duration::from_secs(100)).await;
    assert_eq!(cycles_fired(&backend), 2);

    // And exactly once per interval afterwards
    tokio::time::sleep(Duration::from_secs(400)).await;
    assert_eq!(cycles_fired(&backend), 4, "no double firing");

    device.teardown().await;
}
