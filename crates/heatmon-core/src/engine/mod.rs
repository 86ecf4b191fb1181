//! Core poll engine
//!
//! The PollEngine is responsible for:
//! - Reading every registered capability once per cycle
//! - Deriving hourly energy averages from recorded time series
//! - Synchronizing fetched values into device state
//! - Detecting fault-state transitions and decorating them with
//!   notification data before triggering alarm events
//!
//! ## Cycle Flow
//!
//! ```text
//! ┌───────────────┐      ┌──────────────┐      ┌─────────────┐
//! │  Capability   │      │  PollEngine  │      │ DeviceStore │
//! │  Registry     │─────▶│  (fetch +    │─────▶│ (write)     │
//! └───────────────┘      │   derive)    │      └─────────────┘
//!                        └──────┬───────┘
//!                               │ fault transition
//!                               ▼
//!                        ┌──────────────┐      ┌─────────────┐
//!                        │ Notification │─────▶│  EventSink  │
//!                        │ Decorator    │      │  (trigger)  │
//!                        └──────────────┘      └─────────────┘
//! ```
//!
//! ## Failure Policy
//!
//! Every read is an isolated unit of work. A failed or timed-out fetch is
//! logged, recorded in the cycle outcome, and skipped; the previously
//! stored value stands and the rest of the cycle proceeds. Only device
//! initialization treats a backend failure as fatal.

use chrono::{Local, NaiveDate, Timelike, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::capabilities::{self, CapabilityDescriptor, FaultState};
use crate::config::EngineConfig;
use crate::errorcodes;
use crate::traits::{
    BackendClient, BackendResponse, CapabilityValue, DeviceStore, EnergyBucket, EventScope,
    EventSink, NotificationRecord,
};
use crate::{Error, Result};

/// Event triggered when the device enters a fault state
pub const EVENT_ALARM_ERROR: &str = "alarm_status_error";

/// Event triggered when the device leaves a fault state
pub const EVENT_ALARM_OK: &str = "alarm_status_ok";

/// Events emitted by the PollEngine for observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A capability value was written to device state
    CapabilityUpdated { capability: String, changed: bool },

    /// A single capability read failed (cycle continued)
    FetchFailed { capability: String, error: String },

    /// The device entered a fault state; `codes` is the comma-joined
    /// code list from the notification backend
    FaultRaised { codes: String },

    /// The device left a fault state
    FaultCleared,

    /// A poll cycle finished
    CycleCompleted { updated: usize, failed: usize },
}

/// Direction of a detected fault transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaultTransition {
    Raised,
    Cleared,
}

/// Per-cycle batch outcome
///
/// Collects which capabilities were written and which reads failed, so a
/// partial failure never aborts the pass.
#[derive(Debug, Default)]
pub struct CycleOutcome {
    /// Display names written this cycle
    pub updated: Vec<String>,
    /// Capability keys whose read or write failed, with the error
    pub failed: Vec<(String, Error)>,
    /// The cycle observed device teardown and stopped early
    pub aborted: bool,
}

impl CycleOutcome {
    /// Whether every capability was fetched and written
    pub fn fully_successful(&self) -> bool {
        self.failed.is_empty() && !self.aborted
    }
}

/// Core poll engine for one device
///
/// Owns the device's backend session exclusively. One engine instance
/// exists per device; the scheduler invokes [`PollEngine::poll_cycle`]
/// once per tick.
pub struct PollEngine {
    /// Established backend session, exclusively owned
    client: Box<dyn BackendClient>,

    /// Host device store
    store: Arc<dyn DeviceStore>,

    /// Host event registry
    sink: Arc<dyn EventSink>,

    /// Identity of the device this engine polls
    device_id: String,

    /// Cleared at teardown; a cycle racing teardown must not write state
    /// or trigger events once this is false
    live: Arc<AtomicBool>,

    /// Per-request fetch timeout
    fetch_timeout: Duration,

    /// When the last poll cycle started; engine-only bookkeeping
    last_poll: std::sync::Mutex<Option<chrono::DateTime<Utc>>>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl PollEngine {
    /// Create a new poll engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields
    /// engine events.
    pub fn new(
        client: Box<dyn BackendClient>,
        store: Arc<dyn DeviceStore>,
        sink: Arc<dyn EventSink>,
        device_id: impl Into<String>,
        live: Arc<AtomicBool>,
        config: EngineConfig,
    ) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            client,
            store,
            sink,
            device_id: device_id.into(),
            live,
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            last_poll: std::sync::Mutex::new(None),
            event_tx: tx,
        };

        (engine, rx)
    }

    /// Run one poll cycle against the current clock
    pub async fn poll_cycle(&self) -> CycleOutcome {
        let date = Utc::now().date_naive();
        let hour = Local::now().hour();
        self.poll_cycle_at(date, hour).await
    }

    /// Run one poll cycle with fixed clock inputs
    ///
    /// The UTC date parameterizes energy endpoints and the local
    /// hour-of-day selects the derivation bucket. Both are captured once
    /// per pass so every read of the cycle sees the same reference, which
    /// is also why reads run sequentially in registry order.
    pub async fn poll_cycle_at(&self, date: NaiveDate, hour: u32) -> CycleOutcome {
        debug!(device = %self.device_id, "refreshing device values");
        *self.last_poll.lock().unwrap() = Some(Utc::now());

        let mut outcome = CycleOutcome::default();

        for descriptor in capabilities::all() {
            if !self.is_live() {
                outcome.aborted = true;
                break;
            }

            let value = match self.fetch_value(descriptor, date, hour).await {
                Ok(value) => value,
                Err(err) => {
                    warn!(
                        capability = descriptor.key,
                        error = %err,
                        "capability read failed, keeping previous value"
                    );
                    self.emit(EngineEvent::FetchFailed {
                        capability: descriptor.display_name.to_string(),
                        error: err.to_string(),
                    });
                    outcome.failed.push((descriptor.key.to_string(), err));
                    continue;
                }
            };

            if !self.is_live() {
                outcome.aborted = true;
                break;
            }

            match self.sync_value(descriptor, value).await {
                Ok(()) => outcome.updated.push(descriptor.display_name.to_string()),
                Err(err) => {
                    warn!(
                        capability = descriptor.key,
                        error = %err,
                        "failed to synchronize capability value"
                    );
                    outcome.failed.push((descriptor.key.to_string(), err));
                }
            }
        }

        if !outcome.aborted {
            self.emit(EngineEvent::CycleCompleted {
                updated: outcome.updated.len(),
                failed: outcome.failed.len(),
            });
        }

        outcome
    }

    /// Close the engine's backend session
    pub async fn close(&self) -> Result<()> {
        self.client.close().await
    }

    /// When the last poll cycle started, if any ran yet
    pub fn last_poll_time(&self) -> Option<chrono::DateTime<Utc>> {
        *self.last_poll.lock().unwrap()
    }

    /// Fetch and derive one capability value
    async fn fetch_value(
        &self,
        descriptor: &CapabilityDescriptor,
        date: NaiveDate,
        hour: u32,
    ) -> Result<CapabilityValue> {
        let endpoint = descriptor.resolve(date);
        let response = self.timed_get(&endpoint).await?;

        if descriptor.date_parameterized {
            match response {
                BackendResponse::Recording { recording } => derive_hourly_average(&recording, hour),
                other => Err(Error::derivation(format!(
                    "expected hourly recording at {endpoint}, got {other:?}"
                ))),
            }
        } else {
            match response {
                BackendResponse::Scalar { value } => scalar_value(value),
                other => Err(Error::fetch(format!(
                    "expected scalar at {endpoint}, got {other:?}"
                ))),
            }
        }
    }

    /// Synchronize one fetched value into device state
    ///
    /// The write is unconditional; decoration runs only when a
    /// fault-capable value changed.
    async fn sync_value(
        &self,
        descriptor: &CapabilityDescriptor,
        raw: CapabilityValue,
    ) -> Result<()> {
        let value = match descriptor.fault_source {
            Some(source) => CapabilityValue::Fault(FaultState::translate(source, &raw)?),
            None => raw,
        };

        let previous = self
            .store
            .get_value(&self.device_id, descriptor.display_name)
            .await?;
        let changed = previous.as_ref() != Some(&value);

        debug!(
            capability = descriptor.display_name,
            value = ?value,
            changed,
            "storing capability value"
        );
        self.store
            .set_value(&self.device_id, descriptor.display_name, value.clone())
            .await?;
        self.emit(EngineEvent::CapabilityUpdated {
            capability: descriptor.display_name.to_string(),
            changed,
        });

        if changed {
            if let Some(new_state) = value.as_fault() {
                let previous_state = previous.as_ref().and_then(CapabilityValue::as_fault);
                match fault_transition(previous_state, new_state) {
                    Some(FaultTransition::Raised) => self.decorate_fault().await,
                    Some(FaultTransition::Cleared) => self.announce_cleared().await,
                    None => {}
                }
            }
        }

        Ok(())
    }

    /// Decorate a newly raised fault with notification data and trigger
    /// the alarm event
    ///
    /// A failed notification fetch skips decoration for this cycle; the
    /// state write has already happened and no event fires.
    async fn decorate_fault(&self) {
        let response = match self.timed_get(capabilities::NOTIFICATIONS_ENDPOINT).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "notification fetch failed, skipping decoration");
                return;
            }
        };

        let records = match response {
            BackendResponse::Notifications { values } => values,
            other => {
                warn!(response = ?other, "unexpected notification shape, skipping decoration");
                return;
            }
        };

        let tokens = decoration_tokens(&records);
        let codes = tokens.get("code").cloned().unwrap_or_default();
        info!(device = %self.device_id, codes = %codes, "fault raised, triggering alarm event");

        if !self.is_live() {
            return;
        }

        if let Err(err) = self
            .sink
            .trigger(
                EventScope::Device(self.device_id.clone()),
                EVENT_ALARM_ERROR,
                tokens,
            )
            .await
        {
            warn!(error = %err, "failed to deliver alarm event");
        }

        self.emit(EngineEvent::FaultRaised { codes });
    }

    /// Announce a cleared fault
    ///
    /// Fires only on the faulted-to-ok edge, with empty tokens.
    async fn announce_cleared(&self) {
        info!(device = %self.device_id, "fault cleared, triggering ok event");

        if !self.is_live() {
            return;
        }

        if let Err(err) = self
            .sink
            .trigger(
                EventScope::Device(self.device_id.clone()),
                EVENT_ALARM_OK,
                HashMap::new(),
            )
            .await
        {
            warn!(error = %err, "failed to deliver ok event");
        }

        self.emit(EngineEvent::FaultCleared);
    }

    /// Read one endpoint with the configured per-request timeout
    async fn timed_get(&self, path: &str) -> Result<BackendResponse> {
        match tokio::time::timeout(self.fetch_timeout, self.client.get(path)).await {
            Ok(result) => result,
            Err(_) => Err(Error::fetch(format!(
                "read of {path} timed out after {:?}",
                self.fetch_timeout
            ))),
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Emit an engine event
    fn emit(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("engine event channel full, dropping event");
        }
    }
}

/// Derive the last fully completed hour's average from an hourly series
///
/// The series reports with a lag of two positions, so the relevant bucket
/// for local hour `H` is index `H - 2`. Before hour 2 there is no
/// completed bucket to read.
pub fn derive_hourly_average(buckets: &[EnergyBucket], hour: u32) -> Result<CapabilityValue> {
    if hour < 2 {
        return Err(Error::derivation(format!(
            "hour {hour} precedes the first fully reported bucket"
        )));
    }

    let index = (hour - 2) as usize;
    let bucket = buckets.get(index).ok_or_else(|| {
        Error::derivation(format!(
            "bucket {index} missing from a {}-bucket series",
            buckets.len()
        ))
    })?;

    if bucket.c == 0 {
        return Err(Error::derivation(format!("bucket {index} has no samples")));
    }

    Ok(CapabilityValue::Number(bucket.y / bucket.c as f64))
}

/// Convert a scalar backend value into a capability value
fn scalar_value(value: serde_json::Value) -> Result<CapabilityValue> {
    match value {
        serde_json::Value::Number(number) => number
            .as_f64()
            .map(CapabilityValue::Number)
            .ok_or_else(|| Error::fetch("numeric value out of f64 range")),
        serde_json::Value::Bool(flag) => Ok(CapabilityValue::Bool(flag)),
        serde_json::Value::String(text) => Ok(CapabilityValue::Text(text)),
        other => Err(Error::fetch(format!("unsupported scalar value: {other}"))),
    }
}

/// Classify a fault-value change as a transition
///
/// Raising requires the new state to be faulted; clearing requires the
/// previous stored state to have been faulted, so the first healthy write
/// of a fresh device announces nothing.
fn fault_transition(previous: Option<FaultState>, new: FaultState) -> Option<FaultTransition> {
    match (previous, new) {
        (Some(FaultState::Fault), FaultState::Ok) => Some(FaultTransition::Cleared),
        (Some(FaultState::Fault), FaultState::Fault) => None,
        (_, FaultState::Fault) => Some(FaultTransition::Raised),
        _ => None,
    }
}

/// Build the `code` and `description` tokens for a notification list
///
/// Codes keep backend order. Descriptions come from the error-code
/// catalog, degrading to the sentinel text for unrecognized codes.
pub fn decoration_tokens(records: &[NotificationRecord]) -> HashMap<String, String> {
    let code = records
        .iter()
        .map(|record| record.code.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let description = records
        .iter()
        .map(|record| format!("{}: {}", record.code, errorcodes::describe(&record.code)))
        .collect::<Vec<_>>()
        .join(", ");

    HashMap::from([
        ("code".to_string(), code),
        ("description".to_string(), description),
    ])
}
