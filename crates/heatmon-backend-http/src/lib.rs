// # HTTP Gateway Backend
//
// This crate provides a backend client for gateways reachable over a
// plain HTTP(S) bridge.
//
// ## Purpose
//
// The heat pump's native transport is an encrypted session owned by the
// vendor gateway; local bridge daemons re-expose it as a small HTTP API
// with the same endpoint paths and response shapes. This client speaks
// to such a bridge.
//
// ## Behavior
//
// - One HTTP request per `get` call, no retries (cycle policy is owned
//   by the engine)
// - Request timeout configured on the client (10 seconds)
// - 401/403 map to authentication errors
// - A response body that does not decode maps to an authentication
//   error: a bridge fronting the encrypted transport returns garbage
//   when the access key or password is wrong
// - Credentials never appear in logs

use async_trait::async_trait;
use heatmon_core::config::{BackendConfig, ConnectionSettings};
use heatmon_core::traits::{
    BackendClient, BackendConnector, BackendConnectorFactory, BackendResponse,
};
use heatmon_core::{BackendRegistry, Error, Result};
use std::time::Duration;

/// Default HTTP timeout for bridge requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying the gateway serial number
const SERIAL_HEADER: &str = "x-gateway-serial";

/// Connector for HTTP gateway bridges
pub struct HttpBackendConnector {
    base_url: String,
}

impl HttpBackendConnector {
    /// Create a connector for the bridge at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }
}

#[async_trait]
impl BackendConnector for HttpBackendConnector {
    async fn connect(&self, settings: &ConnectionSettings) -> Result<Box<dyn BackendClient>> {
        settings.validate()?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::connection(format!("failed to build HTTP client: {e}")))?;

        // Reachability probe: any HTTP answer means the bridge is up.
        // Whether the credentials authorize reads is a separate question
        // answered by the first application-level request.
        let probe_url = format!("{}/", self.base_url);
        client
            .get(&probe_url)
            .header(SERIAL_HEADER, &settings.serial)
            .send()
            .await
            .map_err(|e| Error::connection(format!("gateway bridge unreachable: {e}")))?;

        tracing::debug!(base_url = %self.base_url, "gateway bridge session established");

        Ok(Box::new(HttpBackendClient {
            base_url: self.base_url.clone(),
            serial: settings.serial.clone(),
            access_key: settings.access_key.clone(),
            password: settings.password.clone(),
            client,
        }))
    }
}

/// One established bridge session
pub struct HttpBackendClient {
    base_url: String,
    serial: String,
    /// ⚠️ never log this value
    access_key: String,
    /// ⚠️ never log this value
    password: String,
    client: reqwest::Client,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for HttpBackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackendClient")
            .field("base_url", &self.base_url)
            .field("serial", &self.serial)
            .field("access_key", &"<REDACTED>")
            .field("password", &"<REDACTED>")
            .finish()
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn get(&self, path: &str) -> Result<BackendResponse> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%path, "reading gateway value");

        let response = self
            .client
            .get(&url)
            .header(SERIAL_HEADER, &self.serial)
            .basic_auth(&self.access_key, Some(&self.password))
            .send()
            .await
            .map_err(|e| Error::fetch(format!("request to {path} failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::auth(format!(
                "gateway rejected the credentials (status {status})"
            )));
        }
        if !status.is_success() {
            return Err(Error::fetch(format!(
                "request to {path} returned status {status}"
            )));
        }

        // An undecodable body means the bridge could not decrypt the
        // gateway payload, which happens with a wrong access key or
        // password rather than with a transport problem
        response.json::<BackendResponse>().await.map_err(|e| {
            Error::auth(format!(
                "response from {path} could not be decoded, check access key and password: {e}"
            ))
        })
    }

    async fn close(&self) -> Result<()> {
        // The bridge session is stateless on our side; nothing to tear down
        tracing::debug!(serial = %self.serial, "gateway bridge session closed");
        Ok(())
    }
}

/// Factory for creating HTTP backend connectors
pub struct HttpBackendFactory;

impl BackendConnectorFactory for HttpBackendFactory {
    fn create(&self, config: &BackendConfig) -> Result<Box<dyn BackendConnector>> {
        match config {
            BackendConfig::Http { base_url } => {
                config.validate()?;
                Ok(Box::new(HttpBackendConnector::new(base_url.clone())))
            }
            _ => Err(Error::config("invalid config for HTTP backend")),
        }
    }
}

/// Register the HTTP backend with a registry
///
/// # Example
///
/// ```rust
/// use heatmon_core::BackendRegistry;
///
/// let registry = BackendRegistry::new();
/// heatmon_backend_http::register(&registry);
/// assert!(registry.has_connector("http"));
/// ```
pub fn register(registry: &BackendRegistry) {
    registry.register_connector("http", Box::new(HttpBackendFactory));
}
