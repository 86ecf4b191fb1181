// # heatmon-core
//
// Core library for the heatmon heat-pump integration.
//
// ## Architecture Overview
//
// This library bridges a remote heat-pump gateway backend into a local
// capability-based device model:
//
// - **capabilities**: static registry of remote values and their
//   endpoints, plus the unified fault model
// - **errorcodes**: static catalog of gateway fault codes
// - **traits**: seams to the external collaborators (backend client,
//   host device store, event registry)
// - **PollEngine**: per-cycle fetch, derivation, state synchronization
//   and fault-transition decoration
// - **PollScheduler**: cancellable periodic task per device
// - **pairing**: one-shot credential validation with guaranteed session
//   cleanup
// - **HeatPumpDevice**: lifecycle glue (init, settings changes, teardown)
// - **BackendRegistry**: plugin registry for backend implementations
//
// ## Design Principles
//
// 1. **Static configuration**: registries are immutable, process-wide
//    tables; pass by reference, never mutate
// 2. **Failure isolation**: one capability's failure never aborts the
//    rest of a poll cycle nor corrupts unrelated state
// 3. **Explicit lifecycle**: polling is a cancellable task object owned
//    by the device, not an ambient timer closure
// 4. **Library-first**: everything the daemon does is available to
//    embedders through this crate

pub mod capabilities;
pub mod config;
pub mod device;
pub mod engine;
pub mod error;
pub mod errorcodes;
pub mod pairing;
pub mod registry;
pub mod scheduler;
pub mod sink;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use capabilities::{CapabilityDescriptor, FaultSource, FaultState};
pub use config::{BackendConfig, ConnectionSettings, DeviceConfig, EngineConfig, SettingsChange};
pub use device::HeatPumpDevice;
pub use engine::{CycleOutcome, EngineEvent, PollEngine};
pub use error::{Error, Result};
pub use registry::BackendRegistry;
pub use scheduler::PollScheduler;
pub use sink::TracingEventSink;
pub use state::MemoryDeviceStore;
pub use traits::{BackendClient, BackendConnector, CapabilityValue, DeviceStore, EventSink};
