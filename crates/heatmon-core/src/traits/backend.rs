// # Backend Client Trait
//
// Defines the interface for reading values from the remote heat-pump
// gateway backend.
//
// ## Implementations
//
// - HTTP gateway bridge: `heatmon-backend-http` crate
// - Test doubles: scripted clients under `tests/common`
//
// ## Connection model
//
// A connector opens sessions; a client is one established session. Each
// device's polling task exclusively owns its own client, and the pairing
// validator opens a separate short-lived one. Clients perform one read
// per call and must not retry, cache, or schedule on their own; cycle
// coordination is owned by the engine.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use crate::config::ConnectionSettings;

/// One hourly bucket of an energy recording
///
/// `y` is the accumulated value for the hour, `c` the number of samples
/// that contributed to it.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EnergyBucket {
    pub y: f64,
    pub c: u32,
}

/// A raw notification record as returned by the backend
///
/// Only the fault code is interpreted; remaining fields are carried
/// along untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRecord {
    /// Fault code ("ccd" on the wire)
    #[serde(rename = "ccd")]
    pub code: String,

    /// Any further fields of the record
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// The three response shapes the backend produces
///
/// - time series: `{"recording": [{"y": .., "c": ..}, ..]}` indexed by hour
/// - notifications: `{"values": [{"ccd": .., ..}, ..]}`
/// - scalar: `{"value": ..}`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BackendResponse {
    /// Hourly time series (energy recordings)
    Recording { recording: Vec<EnergyBucket> },

    /// Structured notification list
    Notifications { values: Vec<NotificationRecord> },

    /// Single scalar value (number, boolean, or string)
    Scalar { value: serde_json::Value },
}

/// An established backend session
///
/// Implementations must be thread-safe. A client performs exactly one
/// remote read per `get` call and propagates failures to the caller
/// unchanged; the engine decides what a failure means for the cycle.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Read one value from the backend
    ///
    /// # Parameters
    ///
    /// - `path`: resolved endpoint path (see `capabilities::resolve`)
    ///
    /// # Returns
    ///
    /// - `Ok(BackendResponse)`: the decoded response
    /// - `Err(Error)`: `Fetch` for read failures, `Auth` when the
    ///   response indicates rejected or malformed credentials
    async fn get(&self, path: &str) -> Result<BackendResponse, crate::Error>;

    /// Close the session
    ///
    /// Must be safe to call exactly once per session; the owner calls it
    /// on every exit path, success included.
    async fn close(&self) -> Result<(), crate::Error>;
}

/// Opens backend sessions from connection settings
#[async_trait]
pub trait BackendConnector: Send + Sync {
    /// Establish a session with the gateway
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn BackendClient>)`: an established session
    /// - `Err(Error::Connection)`: the session could not be established
    async fn connect(
        &self,
        settings: &ConnectionSettings,
    ) -> Result<Box<dyn BackendClient>, crate::Error>;
}

/// Helper trait for constructing backend connectors from configuration
pub trait BackendConnectorFactory: Send + Sync {
    /// Create a connector instance from configuration
    fn create(
        &self,
        config: &crate::config::BackendConfig,
    ) -> Result<Box<dyn BackendConnector>, crate::Error>;
}
