// # Memory Device Store
//
// In-memory implementation of DeviceStore.
//
// ## Purpose
//
// Holds device entries and their capability values in a process-local
// map. Values do not survive a restart; the first cycle after a restart
// repopulates them, which is harmless because every cycle rewrites the
// full capability set anyway.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::traits::{CapabilityValue, DeviceEntry, DeviceStore};
use crate::Error;

#[derive(Debug)]
struct DeviceRecord {
    entry: DeviceEntry,
    values: HashMap<String, CapabilityValue>,
}

/// In-memory device store implementation
///
/// Entries live in a HashMap behind a RwLock. Cloning shares the
/// underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryDeviceStore {
    inner: Arc<RwLock<HashMap<String, DeviceRecord>>>,
}

impl MemoryDeviceStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered devices
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the store has no devices
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Remove every device and value
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

#[async_trait]
impl DeviceStore for MemoryDeviceStore {
    async fn find_by_identity(&self, identity: &str) -> Result<Option<DeviceEntry>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(identity).map(|record| record.entry.clone()))
    }

    async fn register_device(&self, entry: DeviceEntry) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(
            entry.identity.clone(),
            DeviceRecord {
                entry,
                values: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn remove_device(&self, identity: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(identity);
        Ok(())
    }

    async fn get_value(
        &self,
        identity: &str,
        capability: &str,
    ) -> Result<Option<CapabilityValue>, Error> {
        let guard = self.inner.read().await;
        Ok(guard
            .get(identity)
            .and_then(|record| record.values.get(capability))
            .cloned())
    }

    async fn set_value(
        &self,
        identity: &str,
        capability: &str,
        value: CapabilityValue,
    ) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        let record = guard
            .get_mut(identity)
            .ok_or_else(|| Error::store(format!("unknown device: {identity}")))?;
        record.values.insert(capability.to_string(), value);
        Ok(())
    }
}
