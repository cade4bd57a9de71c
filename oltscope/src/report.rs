//! Plain-text status report for a lookup result.

use std::fmt::{self, Write};

use crate::model::{NOT_AVAILABLE, OnuInfo};

/// Render `info` as an aligned, human-readable report.
pub fn format_report(info: &OnuInfo) -> String {
    info.to_string()
}

fn write_report(out: &mut impl Write, info: &OnuInfo) -> fmt::Result {
    let unit = &info.unit;
    writeln!(out, "ONU {} on {}", unit.onu_id, info.device)?;
    field(out, "Description", &info.description)?;
    field(out, "Status", &unit.state.to_string())?;
    field(out, "MAC address", &unit.mac_address)?;
    field(out, "Distance", &format!("{} m", unit.distance_meters))?;
    field(out, "RTT", &unit.rtt.to_string())?;
    field(out, "Last register", &unit.last_register_time)?;
    field(out, "Last deregister", &unit.last_deregister_time)?;
    field(out, "Deregister reason", &unit.last_deregister_reason)?;
    field(out, "Alive time", &unit.alive_time)?;

    match &info.optical {
        Some(optical) => {
            field(out, "Temperature", &optical.temperature)?;
            field(out, "Voltage", &optical.voltage)?;
            field(out, "Bias current", &optical.bias_current)?;
            field(out, "TX power", &optical.tx_power)?;
            field(out, "RX power", &optical.rx_power)?;
        }
        None => field(out, "Optical", NOT_AVAILABLE)?,
    }

    match &info.link {
        Some(link) => {
            field(out, "Link", &link.status.to_string())?;
            field(out, "Protection type", &link.protection_type)?;
        }
        None => field(out, "Link", NOT_AVAILABLE)?,
    }
    Ok(())
}

fn field(out: &mut impl Write, label: &str, value: &str) -> fmt::Result {
    writeln!(out, "  {:<18} {}", format!("{label}:"), value)
}

impl fmt::Display for OnuInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_report(f, self)
    }
}
