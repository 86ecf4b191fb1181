//! Plugin-based backend registry
//!
//! Backend connector implementations register themselves by type name so
//! the daemon can instantiate whichever backend its configuration names,
//! with no hard-coded if-else chain.
//!
//! ## Registration
//!
//! Implementation crates provide a `register()` entry point:
//!
//! ```rust,ignore
//! // In heatmon-backend-http
//! pub fn register(registry: &BackendRegistry) {
//!     registry.register_connector("http", Box::new(HttpBackendFactory));
//! }
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::traits::{BackendConnector, BackendConnectorFactory};

/// Registry of backend connector factories
///
/// Uses interior mutability with RwLock, allowing concurrent reads and
/// exclusive writes.
#[derive(Default)]
pub struct BackendRegistry {
    connectors: RwLock<HashMap<String, Box<dyn BackendConnectorFactory>>>,
}

impl BackendRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend connector factory under a type name
    pub fn register_connector(
        &self,
        name: impl Into<String>,
        factory: Box<dyn BackendConnectorFactory>,
    ) {
        let name = name.into();
        let mut connectors = self.connectors.write().unwrap();
        connectors.insert(name, factory);
    }

    /// Create a backend connector from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn BackendConnector>)`: created connector instance
    /// - `Err(Error)`: the type is not registered or creation failed
    pub fn create_connector(&self, config: &BackendConfig) -> Result<Box<dyn BackendConnector>> {
        let backend_type = config.type_name();
        let connectors = self.connectors.read().unwrap();

        let factory = connectors
            .get(backend_type)
            .ok_or_else(|| Error::config(format!("unknown backend type: {}", backend_type)))?;

        factory.create(config)
    }

    /// Check if a backend type is registered
    pub fn has_connector(&self, name: &str) -> bool {
        let connectors = self.connectors.read().unwrap();
        connectors.contains_key(name)
    }

    /// List all registered backend types
    pub fn list_connectors(&self) -> Vec<String> {
        let connectors = self.connectors.read().unwrap();
        connectors.keys().cloned().collect()
    }
}
