// # heatmond - Heat Pump Monitoring Daemon
//
// A THIN integration layer only: configuration, logging, runtime and
// lifecycle. All polling, synchronization and pairing logic lives in
// heatmon-core.
//
// The heatmond daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime
// 3. Registering backend implementations
// 4. Starting the device and logging its engine events
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Backend
// - `HEATMON_BACKEND_URL`: Base URL of the gateway bridge
//
// ### Device
// - `HEATMON_DEVICE_NAME`: Display name (default "Heat pump")
// - `HEATMON_SERIAL`: Gateway serial number
// - `HEATMON_ACCESS_KEY`: Gateway access key
// - `HEATMON_PASSWORD`: User password
// - `HEATMON_INTERVAL_SECS`: Poll interval in seconds (default 60)
//
// ### Logging
// - `HEATMON_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export HEATMON_BACKEND_URL=https://bridge.local:8080
// export HEATMON_SERIAL=7736901234
// export HEATMON_ACCESS_KEY=your_access_key
// export HEATMON_PASSWORD=your_password
//
// heatmond
// ```

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use heatmon_core::{
    BackendConfig, ConnectionSettings, DeviceConfig, EngineConfig, HeatPumpDevice,
    MemoryDeviceStore, TracingEventSink,
};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum HeatmonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<HeatmonExitCode> for ExitCode {
    fn from(code: HeatmonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    backend_url: String,
    device_name: String,
    serial: String,
    access_key: String,
    password: String,
    interval_secs: u64,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            backend_url: env::var("HEATMON_BACKEND_URL")?,
            device_name: env::var("HEATMON_DEVICE_NAME")
                .unwrap_or_else(|_| "Heat pump".to_string()),
            serial: env::var("HEATMON_SERIAL")?,
            access_key: env::var("HEATMON_ACCESS_KEY")?,
            password: env::var("HEATMON_PASSWORD")?,
            interval_secs: env::var("HEATMON_INTERVAL_SECS")
                .ok()
                .map(|s| s.parse().unwrap_or(60))
                .unwrap_or(60),
            log_level: env::var("HEATMON_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        // The detailed checks live in heatmon-core; surface them early
        // with actionable messages
        self.backend_config().validate().map_err(|e| {
            anyhow::anyhow!("{e}. Set it via: export HEATMON_BACKEND_URL=https://bridge.local:8080")
        })?;
        self.device_config().validate().map_err(|e| {
            anyhow::anyhow!(
                "{e}. Check HEATMON_SERIAL, HEATMON_ACCESS_KEY, HEATMON_PASSWORD \
                 and HEATMON_INTERVAL_SECS"
            )
        })?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => anyhow::bail!(
                "HEATMON_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                other
            ),
        }

        Ok(())
    }

    fn backend_config(&self) -> BackendConfig {
        BackendConfig::Http {
            base_url: self.backend_url.clone(),
        }
    }

    fn device_config(&self) -> DeviceConfig {
        DeviceConfig {
            name: self.device_name.clone(),
            settings: ConnectionSettings {
                serial: self.serial.clone(),
                access_key: self.access_key.clone(),
                password: self.password.clone(),
            },
            poll_interval_secs: self.interval_secs,
            engine: EngineConfig::default(),
        }
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return HeatmonExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return HeatmonExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return HeatmonExitCode::ConfigError.into();
    }

    info!("Starting heatmond daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return HeatmonExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            HeatmonExitCode::RuntimeError
        } else {
            HeatmonExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    // Create the backend registry and register built-in backends
    let registry = heatmon_core::BackendRegistry::new();

    #[cfg(feature = "http")]
    {
        info!("Registering HTTP gateway backend");
        heatmon_backend_http::register(&registry);
    }

    let connector = registry.create_connector(&config.backend_config())?;

    let store = Arc::new(MemoryDeviceStore::new());
    let sink = Arc::new(TracingEventSink::new());

    info!(
        device = %config.device_name,
        interval_secs = config.interval_secs,
        "initializing device"
    );

    let (device, event_rx) = HeatPumpDevice::init(
        connector.as_ref(),
        store,
        sink,
        config.device_config(),
    )
    .await?;

    // Log engine events as they stream in
    let event_logger = tokio::spawn(async move {
        let mut events = ReceiverStream::new(event_rx);
        while let Some(event) = events.next().await {
            info!(?event, "engine event");
        }
    });

    info!("Daemon initialized, polling until shutdown");

    let signal_name = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal_name);

    device.teardown().await;
    event_logger.abort();

    info!("Daemon stopped");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

/// Wait for shutdown (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
