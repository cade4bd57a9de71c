//! Records produced by the parsers and returned to callers.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Placeholder for a field the device output did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// ONU identifier: EPON port plus index on that port (`EPON0/1:3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OnuId {
    /// Port in `slot/port` form, e.g. `0/1`.
    pub port: String,
    pub index: u32,
}

impl OnuId {
    pub fn new(port: impl Into<String>, index: u32) -> Self {
        Self {
            port: port.into(),
            index,
        }
    }
}

impl fmt::Display for OnuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPON{}:{}", self.port, self.index)
    }
}

impl FromStr for OnuId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .trim()
            .strip_prefix("EPON")
            .or_else(|| s.trim().strip_prefix("epon"))
            .ok_or_else(|| format!("not an EPON identifier: '{s}'"))?;
        let (port, index) = rest
            .rsplit_once(':')
            .ok_or_else(|| format!("missing ONU index: '{s}'"))?;
        let index = index
            .parse()
            .map_err(|_| format!("invalid ONU index: '{s}'"))?;
        Ok(Self::new(port, index))
    }
}

impl Serialize for OnuId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Registration state reported in the status listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OnuState {
    Online,
    Offline,
    /// Any other token the firmware prints (`pwr-down`, `los`, ...).
    Other(String),
}

impl OnuState {
    pub fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "online" | "up" => OnuState::Online,
            "offline" | "down" => OnuState::Offline,
            _ => OnuState::Other(token.to_string()),
        }
    }
}

impl fmt::Display for OnuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnuState::Online => f.write_str("online"),
            OnuState::Offline => f.write_str("offline"),
            OnuState::Other(token) => f.write_str(token),
        }
    }
}

/// One row of the ONU status listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnuStatus {
    pub onu_id: OnuId,
    #[serde(rename = "status")]
    pub state: OnuState,
    pub mac_address: String,
    pub distance_meters: u32,
    pub rtt: u32,
    pub last_register_time: String,
    pub last_deregister_time: String,
    pub last_deregister_reason: String,
    pub alive_time: String,
}

/// Transceiver readings, values as printed (units included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpticalDiagnostics {
    pub temperature: String,
    pub voltage: String,
    pub bias_current: String,
    pub tx_power: String,
    pub rx_power: String,
}

/// Link state of the ONU's PON link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkStatus {
    Up,
    Down,
    Unknown,
}

impl LinkStatus {
    pub fn from_token(token: &str) -> Self {
        let token = token.to_ascii_lowercase();
        if token == "up" || token.ends_with("-up") || token.ends_with("_up") || token == "linkup" {
            LinkStatus::Up
        } else if token == "down"
            || token.ends_with("-down")
            || token.ends_with("_down")
            || token == "linkdown"
        {
            LinkStatus::Down
        } else {
            LinkStatus::Unknown
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::Up => f.write_str("up"),
            LinkStatus::Down => f.write_str("down"),
            LinkStatus::Unknown => f.write_str(NOT_AVAILABLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkState {
    pub status: LinkStatus,
    pub protection_type: String,
}

/// Composite lookup result handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnuInfo {
    /// Name of the OLT the unit was found on.
    pub device: String,
    pub description: String,
    #[serde(flatten)]
    pub unit: OnuStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optical: Option<OpticalDiagnostics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkState>,
}
