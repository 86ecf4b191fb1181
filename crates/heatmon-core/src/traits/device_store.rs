// # Device Store Trait
//
// Defines the interface to the host's device inventory and capability
// value storage.
//
// ## Ownership
//
// The store owns the bytes; this crate owns the mutations. Values are
// only ever written by the poll engine, once per capability per cycle,
// and a failed fetch never overwrites a previously stored value.
//
// ## Lifecycle
//
// A device's entry is created at initialization after a successful
// backend connection, mutated every poll cycle, and removed at teardown.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capabilities::FaultState;

/// A capability value as stored in device state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityValue {
    /// Numeric reading (temperatures, energy averages)
    Number(f64),
    /// Boolean reading
    Bool(bool),
    /// Text reading
    Text(String),
    /// Coerced fault state of a fault-capable capability
    Fault(FaultState),
}

impl CapabilityValue {
    /// The fault state, if this value is one
    pub fn as_fault(&self) -> Option<FaultState> {
        match self {
            CapabilityValue::Fault(state) => Some(*state),
            _ => None,
        }
    }
}

/// An inventory entry for a registered device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Device identity (the gateway serial number)
    pub identity: String,
    /// Display name
    pub name: String,
}

/// Trait for host inventory implementations
///
/// All methods must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Find a registered device by identity
    ///
    /// # Returns
    ///
    /// - `Ok(Some(DeviceEntry))`: a device with this identity exists
    /// - `Ok(None)`: no such device
    async fn find_by_identity(&self, identity: &str) -> Result<Option<DeviceEntry>, crate::Error>;

    /// Register a device entry
    ///
    /// Called once at device initialization, after the backend
    /// connection has been established.
    async fn register_device(&self, entry: DeviceEntry) -> Result<(), crate::Error>;

    /// Remove a device entry and all its stored values
    async fn remove_device(&self, identity: &str) -> Result<(), crate::Error>;

    /// Read the last stored value for a capability
    ///
    /// # Returns
    ///
    /// - `Ok(Some(CapabilityValue))`: the last successful reading
    /// - `Ok(None)`: nothing stored yet (or unknown device)
    async fn get_value(
        &self,
        identity: &str,
        capability: &str,
    ) -> Result<Option<CapabilityValue>, crate::Error>;

    /// Store a capability value
    ///
    /// Writing to an unregistered device is a store error; a cycle that
    /// races with teardown fails here instead of resurrecting state.
    async fn set_value(
        &self,
        identity: &str,
        capability: &str,
        value: CapabilityValue,
    ) -> Result<(), crate::Error>;
}
