//! Pairing validation tool
//!
//! Runs the one-shot pairing credential check against a real gateway
//! bridge, the same routine a host UI would run before adding a device.
//!
//! ## Usage
//!
//! ```bash
//! HEATMON_BACKEND_URL=https://bridge.local:8080 \
//! HEATMON_SERIAL=7736901234 \
//! HEATMON_ACCESS_KEY=your_access_key \
//! HEATMON_PASSWORD=your_password \
//! cargo run --bin pairing_validation
//! ```

use heatmon_backend_http::HttpBackendConnector;
use heatmon_core::config::ConnectionSettings;
use heatmon_core::pairing::{self, PairingCandidate};
use heatmon_core::{Error, MemoryDeviceStore};
use std::env;

fn required(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        tracing::error!("{name} environment variable is required");
        std::process::exit(1);
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("=== heatmon pairing validation ===");

    let base_url = required("HEATMON_BACKEND_URL");
    let settings = ConnectionSettings {
        serial: required("HEATMON_SERIAL"),
        access_key: required("HEATMON_ACCESS_KEY"),
        password: required("HEATMON_PASSWORD"),
    };

    let connector = HttpBackendConnector::new(base_url);
    let store = MemoryDeviceStore::new();
    let candidate = PairingCandidate::from_settings(settings);

    match pairing::validate(&connector, &store, &candidate).await {
        Ok(()) => {
            tracing::info!("pairing credentials are valid, device can be added");
        }
        Err(Error::DuplicateDevice(identity)) => {
            tracing::error!("a device with serial {identity} is already registered");
            std::process::exit(1);
        }
        Err(Error::Auth(reason)) => {
            tracing::error!("invalid credentials: {reason}");
            std::process::exit(1);
        }
        Err(err) => {
            tracing::error!("unable to reach the gateway: {err}");
            std::process::exit(1);
        }
    }
}
