// # Event Sink Trait
//
// Defines the interface to the host's event/trigger registry. Events are
// named, device-scoped or global, and carry a string-to-string token
// mapping.

use async_trait::async_trait;
use std::collections::HashMap;

/// Scope of a triggered event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventScope {
    /// Event tied to one device, identified by its identity
    Device(String),
    /// App-wide event
    Global,
}

/// Trait for event registry implementations
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Fire a named event with the given tokens
    ///
    /// # Returns
    ///
    /// - `Ok(())`: the event was handed to the registry
    /// - `Err(Error::Emit)`: delivery failed; callers log and continue
    async fn trigger(
        &self,
        scope: EventScope,
        event: &str,
        tokens: HashMap<String, String>,
    ) -> Result<(), crate::Error>;
}
