//! Capability registry and endpoint resolution
//!
//! The registry is the fixed table of remote values the poller reads each
//! cycle, loaded once and read-only thereafter. Iteration order of
//! [`all()`] is the poll order.
//!
//! Energy capabilities record hourly consumption series; their endpoints
//! are parameterized with the current UTC calendar date. Everything else
//! resolves to a fixed path.

use chrono::NaiveDate;

use crate::traits::CapabilityValue;
use crate::{Error, Result};

/// Endpoint for the structured notification list (fault decoration)
pub const NOTIFICATIONS_ENDPOINT: &str = "/notifications";

/// Lightweight read-only endpoint used to probe credentials during pairing
pub const FIRMWARE_VERSION_ENDPOINT: &str = "/gateway/versionFirmware";

/// Which upstream representation a fault-capable capability reports
///
/// Two device generations report faults differently: one as a string
/// health status, one as a boolean alarm flag. The descriptor carries
/// this tag so the translation is selected by metadata instead of by
/// string comparisons in the sync path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultSource {
    /// String health status; the literal `"ok"` means healthy
    HealthStatus,
    /// Boolean alarm flag; `true` means faulted
    AlarmFlag,
}

/// Unified two-state fault model
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FaultState {
    /// No active fault
    Ok,
    /// Device reports a fault
    Fault,
}

impl FaultState {
    /// Coerce a raw backend value into the unified fault model
    ///
    /// The health-status comparison is case-sensitive: anything other
    /// than the exact literal `"ok"` counts as faulted.
    pub fn translate(source: FaultSource, raw: &CapabilityValue) -> Result<Self> {
        match (source, raw) {
            (FaultSource::HealthStatus, CapabilityValue::Text(status)) => {
                if status == "ok" {
                    Ok(FaultState::Ok)
                } else {
                    Ok(FaultState::Fault)
                }
            }
            (FaultSource::AlarmFlag, CapabilityValue::Bool(active)) => {
                if *active {
                    Ok(FaultState::Fault)
                } else {
                    Ok(FaultState::Ok)
                }
            }
            (source, other) => Err(Error::fetch(format!(
                "unexpected value {other:?} for fault source {source:?}"
            ))),
        }
    }

    /// Whether this state is the faulted one
    pub fn is_faulted(self) -> bool {
        matches!(self, FaultState::Fault)
    }
}

/// A single entry of the capability registry
#[derive(Debug, Clone, Copy)]
pub struct CapabilityDescriptor {
    /// Registry key
    pub key: &'static str,

    /// Display name, unique across the registry; this is the name the
    /// value is stored under in device state
    pub display_name: &'static str,

    /// Endpoint template on the backend
    pub endpoint: &'static str,

    /// Whether the endpoint takes the current UTC date as a parameter
    pub date_parameterized: bool,

    /// Set for the fault-capable capability, selecting its translation
    pub fault_source: Option<FaultSource>,
}

impl CapabilityDescriptor {
    /// Resolve the endpoint for this capability
    ///
    /// Pure given the date: date-parameterized endpoints get the calendar
    /// date appended as `YYYY-MM-DD`, all others return the template
    /// verbatim.
    pub fn resolve(&self, date: NaiveDate) -> String {
        if self.date_parameterized {
            format!("{}{}", self.endpoint, date.format("%Y-%m-%d"))
        } else {
            self.endpoint.to_string()
        }
    }

    /// Whether this capability can raise or clear a fault
    pub fn fault_capable(&self) -> bool {
        self.fault_source.is_some()
    }
}

/// The capability table, in poll order
const CAPABILITIES: &[CapabilityDescriptor] = &[
    CapabilityDescriptor {
        key: "supply_temp",
        display_name: "measure_temperature.supply",
        endpoint: "/heatSources/actualSupplyTemperature",
        date_parameterized: false,
        fault_source: None,
    },
    CapabilityDescriptor {
        key: "return_temp",
        display_name: "measure_temperature.return",
        endpoint: "/heatSources/returnTemperature",
        date_parameterized: false,
        fault_source: None,
    },
    CapabilityDescriptor {
        key: "outdoor_temp",
        display_name: "measure_temperature.outdoor",
        endpoint: "/system/sensors/temperatures/outdoor_t1",
        date_parameterized: false,
        fault_source: None,
    },
    CapabilityDescriptor {
        key: "water_temp",
        display_name: "measure_temperature.water",
        endpoint: "/dhwCircuits/dhw1/actualTemp",
        date_parameterized: false,
        fault_source: None,
    },
    CapabilityDescriptor {
        key: "health_status",
        display_name: "alarm_status",
        endpoint: "/system/healthStatus",
        date_parameterized: false,
        fault_source: Some(FaultSource::HealthStatus),
    },
    CapabilityDescriptor {
        key: "last_hour_power_total",
        display_name: "meter_power.last_hour_total",
        endpoint: "/recordings/heatSources/total/energyMonitoring/consumedEnergy?interval=",
        date_parameterized: true,
        fault_source: None,
    },
    CapabilityDescriptor {
        key: "last_hour_power_eheater",
        display_name: "meter_power.last_hour_eheater",
        endpoint: "/recordings/heatSources/total/energyMonitoring/eheater?interval=",
        date_parameterized: true,
        fault_source: None,
    },
    CapabilityDescriptor {
        key: "last_hour_power_compressor",
        display_name: "meter_power.last_hour_compressor",
        endpoint: "/recordings/heatSources/total/energyMonitoring/compressor?interval=",
        date_parameterized: true,
        fault_source: None,
    },
];

/// All capability descriptors, in poll order
pub fn all() -> &'static [CapabilityDescriptor] {
    CAPABILITIES
}

/// Look up a descriptor by display name
pub fn by_display_name(display_name: &str) -> Option<&'static CapabilityDescriptor> {
    CAPABILITIES
        .iter()
        .find(|cap| cap.display_name == display_name)
}
