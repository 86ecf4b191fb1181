//! Pairing-time credential validation
//!
//! One-shot check that candidate connection settings actually work before
//! a device is added: open a session, reject duplicates, and probe a
//! read-only endpoint to confirm the credentials authorize application
//! access. A successful session handshake alone does not prove the
//! credentials are valid, hence the probe.
//!
//! The session opened here is short-lived and independent of any device's
//! polling session, and it is closed exactly once on every exit path.

use tracing::{info, warn};

use crate::capabilities::FIRMWARE_VERSION_ENDPOINT;
use crate::config::ConnectionSettings;
use crate::traits::{BackendClient, BackendConnector, DeviceStore};
use crate::{Error, Result};

/// A pairing candidate: identity plus the credentials to validate
#[derive(Debug, Clone)]
pub struct PairingCandidate {
    /// Identity the device would be registered under
    pub identity: String,
    /// Candidate connection settings
    pub settings: ConnectionSettings,
}

impl PairingCandidate {
    /// Build a candidate from connection settings; the identity is the
    /// gateway serial number
    pub fn from_settings(settings: ConnectionSettings) -> Self {
        Self {
            identity: settings.serial.clone(),
            settings,
        }
    }
}

/// Validate a pairing candidate
///
/// # Returns
///
/// - `Ok(())`: the settings connect, are not a duplicate, and pass the
///   credential probe
/// - `Err(Error::Connection)`: no session could be established, or the
///   probe failed for a non-credential reason
/// - `Err(Error::DuplicateDevice)`: a device with this identity exists
/// - `Err(Error::Auth)`: the credentials were rejected
pub async fn validate(
    connector: &dyn BackendConnector,
    store: &dyn DeviceStore,
    candidate: &PairingCandidate,
) -> Result<()> {
    // Nothing to close if this fails
    let client = connector
        .connect(&candidate.settings)
        .await
        .map_err(|err| Error::connection(format!("unable to reach backend: {err}")))?;

    let outcome = probe(client.as_ref(), store, candidate).await;

    // Single release point: the session is closed exactly once whether
    // the probe succeeded or not
    if let Err(err) = client.close().await {
        warn!(error = %err, "failed to close pairing session");
    }

    outcome
}

/// Duplicate check and credential probe against an open session
async fn probe(
    client: &dyn BackendClient,
    store: &dyn DeviceStore,
    candidate: &PairingCandidate,
) -> Result<()> {
    if let Some(existing) = store.find_by_identity(&candidate.identity).await? {
        info!(identity = %existing.identity, "device is already registered");
        return Err(Error::duplicate_device(existing.identity));
    }

    // Read-only probe: the session handshake succeeds even with a bad
    // access key, only an application-level read exposes it
    match client.get(FIRMWARE_VERSION_ENDPOINT).await {
        Ok(_) => {
            info!(identity = %candidate.identity, "pairing credentials validated");
            Ok(())
        }
        Err(err @ Error::Auth(_)) => Err(err),
        Err(err) => Err(Error::connection(format!(
            "credential probe failed: {err}"
        ))),
    }
}
