//! Architectural Contract Test: Pairing Validation
//!
//! Constraints verified:
//! - Connection, duplicate and credential failures are reported as
//!   distinct errors
//! - The session opened for validation is closed exactly once on every
//!   exit path, success included
//! - The duplicate check runs before the credential probe
//!
//! If this test fails, pairing either leaks sessions or reports the
//! wrong failure to the user.

mod common;

use common::*;
use heatmon_core::capabilities::FIRMWARE_VERSION_ENDPOINT;
use heatmon_core::pairing::{self, PairingCandidate};
use heatmon_core::Error;

fn candidate() -> PairingCandidate {
    PairingCandidate::from_settings(settings())
}

#[tokio::test]
async fn valid_credentials_pass_and_close_once() {
    let backend = ScriptedBackend::healthy();
    backend.set_scalar(FIRMWARE_VERSION_ENDPOINT, serde_json::json!("04.07.00"));
    let connector = ScriptedConnector::new(backend.clone());
    let store = MockDeviceStore::new();

    let result = pairing::validate(&connector, &store, &candidate()).await;

    assert!(result.is_ok());
    assert_eq!(backend.close_count(), 1);
    assert_eq!(backend.calls(), vec![FIRMWARE_VERSION_ENDPOINT.to_string()]);
}

#[tokio::test]
async fn duplicate_identity_is_rejected_and_closed() {
    let backend = ScriptedBackend::healthy();
    backend.set_scalar(FIRMWARE_VERSION_ENDPOINT, serde_json::json!("04.07.00"));
    let connector = ScriptedConnector::new(backend.clone());

    // The identity is already registered
    let store = MockDeviceStore::with_device().await;

    let result = pairing::validate(&connector, &store, &candidate()).await;

    assert!(matches!(result, Err(Error::DuplicateDevice(_))));
    assert_eq!(backend.close_count(), 1, "close() invoked exactly once");
    assert!(
        backend.calls().is_empty(),
        "no probe after the duplicate check fails"
    );
}

#[tokio::test]
async fn rejected_credentials_surface_as_auth_error() {
    let backend = ScriptedBackend::healthy();
    backend.fail_path(FIRMWARE_VERSION_ENDPOINT, ScriptedFailure::Auth);
    let connector = ScriptedConnector::new(backend.clone());
    let store = MockDeviceStore::new();

    let result = pairing::validate(&connector, &store, &candidate()).await;

    assert!(matches!(result, Err(Error::Auth(_))));
    assert_eq!(backend.close_count(), 1);
}

#[tokio::test]
async fn probe_read_failure_surfaces_as_connection_error() {
    let backend = ScriptedBackend::healthy();
    backend.fail_path(FIRMWARE_VERSION_ENDPOINT, ScriptedFailure::Fetch);
    let connector = ScriptedConnector::new(backend.clone());
    let store = MockDeviceStore::new();

    let result = pairing::validate(&connector, &store, &candidate()).await;

    assert!(matches!(result, Err(Error::Connection(_))));
    assert_eq!(backend.close_count(), 1);
}

#[tokio::test]
async fn connect_failure_leaves_nothing_to_close() {
    let backend = ScriptedBackend::healthy();
    let connector = ScriptedConnector::new(backend.clone());
    connector.refuse_connections();
    let store = MockDeviceStore::new();

    let result = pairing::validate(&connector, &store, &candidate()).await;

    assert!(matches!(result, Err(Error::Connection(_))));
    assert_eq!(backend.close_count(), 0);
}
