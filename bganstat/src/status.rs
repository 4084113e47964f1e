//! View-model types: the aggregated device snapshot and its parts.

use serde::Deserialize;

use crate::signal::{classify_signal, normalize_signal, SignalQuality};

/// Placeholder for identity fields the terminal has not reported yet.
pub const UNKNOWN_FIELD: &str = "--";

/// Network registration state as reported by the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NetworkStatus {
    NotRegistered,
    RegisteredHome,
    Searching,
    RegistrationDenied,
    #[default]
    Unknown,
    Roaming,
}

impl<T> From<T> for NetworkStatus
where
    T: AsRef<str>,
{
    fn from(value: T) -> Self {
        match value.as_ref().trim().to_lowercase().as_str() {
            "not registered" => NetworkStatus::NotRegistered,
            "registered (home)" | "registered" => NetworkStatus::RegisteredHome,
            "searching" => NetworkStatus::Searching,
            "registration denied" | "denied" => NetworkStatus::RegistrationDenied,
            "roaming" | "registered (roaming)" => NetworkStatus::Roaming,
            _ => NetworkStatus::Unknown,
        }
    }
}

impl NetworkStatus {
    pub fn is_registered(&self) -> bool {
        matches!(self, NetworkStatus::RegisteredHome | NetworkStatus::Roaming)
    }

    pub fn label(&self) -> &'static str {
        match self {
            NetworkStatus::NotRegistered => "Not Registered",
            NetworkStatus::RegisteredHome => "Registered (Home)",
            NetworkStatus::Searching => "Searching",
            NetworkStatus::RegistrationDenied => "Registration Denied",
            NetworkStatus::Unknown => "Unknown",
            NetworkStatus::Roaming => "Roaming",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            NetworkStatus::NotRegistered => "#f44336",
            NetworkStatus::RegisteredHome => "#4caf50",
            NetworkStatus::Searching => "#ff9800",
            NetworkStatus::RegistrationDenied => "#b71c1c",
            NetworkStatus::Unknown => "#9e9e9e",
            NetworkStatus::Roaming => "#2196f3",
        }
    }
}

/// A stored APN profile slot on the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApnProfile {
    pub cid: u32,
    #[serde(rename = "type")]
    pub pdp_type: String,
    pub apn: String,
    pub address: String,
}

/// One timestamped signal reading from the history endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignalSample {
    pub timestamp: String,
    #[serde(rename = "signal")]
    pub signal_db: f64,
}

/// One complete, internally consistent view of the terminal, produced by a
/// single aggregation cycle and only ever replaced as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    /// Raw signal reading in dB. `None` means no reading yet / unavailable.
    pub signal_db: Option<f64>,
    /// Timestamp the terminal attached to the signal reading, kept opaque.
    pub signal_timestamp: String,
    pub satellite_id: String,
    pub satellite_name: String,
    pub imei: String,
    pub imsi: String,
    pub network_status: NetworkStatus,
    /// `None` until the apn resource has been fetched at least once;
    /// `Some(vec![])` is a loaded-but-empty profile table.
    pub apn_profiles: Option<Vec<ApnProfile>>,
    pub pdp_active: bool,
    pub pdp_ip: Option<String>,
}

impl Default for DeviceSnapshot {
    fn default() -> Self {
        Self {
            signal_db: None,
            signal_timestamp: UNKNOWN_FIELD.into(),
            satellite_id: UNKNOWN_FIELD.into(),
            satellite_name: UNKNOWN_FIELD.into(),
            imei: UNKNOWN_FIELD.into(),
            imsi: UNKNOWN_FIELD.into(),
            network_status: NetworkStatus::Unknown,
            apn_profiles: None,
            pdp_active: false,
            pdp_ip: None,
        }
    }
}

impl DeviceSnapshot {
    pub fn signal_percent(&self) -> u8 {
        normalize_signal(self.signal_db)
    }

    pub fn quality(&self) -> SignalQuality {
        classify_signal(self.signal_db)
    }
}
