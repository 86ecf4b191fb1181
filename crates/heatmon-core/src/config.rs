//! Configuration types for the heatmon system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Connection settings for a backend gateway session
///
/// These are the pairing-time credentials: the gateway serial number
/// (which doubles as the device identity), the access key printed on the
/// unit, and the user-chosen password.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Gateway serial number, unique per unit
    pub serial: String,

    /// Gateway access key
    pub access_key: String,

    /// User password
    pub password: String,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("serial", &self.serial)
            .field("access_key", &"<REDACTED>")
            .field("password", &"<REDACTED>")
            .finish()
    }
}

impl ConnectionSettings {
    /// Validate the connection settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.serial.is_empty() {
            return Err(crate::Error::config("serial number cannot be empty"));
        }
        if self.access_key.len() < 8 {
            return Err(crate::Error::config(format!(
                "access key appears too short ({} chars)",
                self.access_key.len()
            )));
        }
        if self.password.is_empty() {
            return Err(crate::Error::config("password cannot be empty"));
        }
        Ok(())
    }
}

/// Per-device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Display name of the device
    pub name: String,

    /// Backend connection settings
    pub settings: ConnectionSettings,

    /// Poll interval in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DeviceConfig {
    /// The device identity (the gateway serial number)
    pub fn identity(&self) -> &str {
        &self.settings.serial
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.is_empty() {
            return Err(crate::Error::config("device name cannot be empty"));
        }
        if !(10..=3600).contains(&self.poll_interval_secs) {
            return Err(crate::Error::config(format!(
                "poll interval must be between 10 and 3600 seconds, got {}",
                self.poll_interval_secs
            )));
        }
        self.settings.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-request timeout for backend reads (in seconds)
    ///
    /// A read that exceeds this is treated like any other fetch failure:
    /// logged, skipped, and the previously stored value stands.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Capacity of the internal engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.fetch_timeout_secs == 0 {
            return Err(crate::Error::config("fetch timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_event_channel_capacity() -> usize {
    100
}

/// Backend connector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// HTTP gateway bridge backend
    Http {
        /// Base URL of the gateway bridge
        base_url: String,
    },

    /// Custom backend
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl BackendConfig {
    /// Validate the backend configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            BackendConfig::Http { base_url } => {
                if base_url.is_empty() {
                    return Err(crate::Error::config("backend base URL cannot be empty"));
                }
                if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                    return Err(crate::Error::config(format!(
                        "backend base URL must use HTTP or HTTPS scheme, got: {}",
                        base_url
                    )));
                }
                Ok(())
            }
            BackendConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("custom backend factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("custom backend config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the backend type name
    pub fn type_name(&self) -> &str {
        match self {
            BackendConfig::Http { .. } => "http",
            BackendConfig::Custom { factory, .. } => factory,
        }
    }
}

/// A settings-change notification from the host
///
/// Carries the old and new configuration plus the list of keys that
/// changed, as delivered by the host's settings framework.
#[derive(Debug, Clone)]
pub struct SettingsChange {
    /// Settings before the change
    pub old: DeviceConfig,
    /// Settings after the change
    pub new: DeviceConfig,
    /// Names of the keys that changed
    pub changed_keys: Vec<String>,
}

impl SettingsChange {
    /// Whether the poll interval is among the changed settings
    pub fn interval_changed(&self) -> bool {
        self.old.poll_interval_secs != self.new.poll_interval_secs
    }
}
