//! Core traits for the heatmon system
//!
//! This module defines the abstract interfaces for the external
//! collaborators:
//!
//! - [`BackendConnector`] / [`BackendClient`]: sessions and reads against
//!   the remote gateway backend
//! - [`DeviceStore`]: the host's device inventory and capability storage
//! - [`EventSink`]: the host's named-event trigger registry

pub mod backend;
pub mod device_store;
pub mod event_sink;

pub use backend::{
    BackendClient, BackendConnector, BackendConnectorFactory, BackendResponse, EnergyBucket,
    NotificationRecord,
};
pub use device_store::{CapabilityValue, DeviceEntry, DeviceStore};
pub use event_sink::{EventScope, EventSink};
