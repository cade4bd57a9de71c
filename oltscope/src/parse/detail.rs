//! Optical diagnostics and port state of a single ONU.
//!
//! Firmware releases disagree on label spelling ("Temperature", "Temp(C)",
//! "Protection Tpye"), so labels are matched loosely and values are kept as
//! printed.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{labeled, or_not_available};
use crate::model::{LinkState, LinkStatus, OpticalDiagnostics};

/// `label [:=] value` on its own line, capturing the value.
fn label_pattern(label: &str) -> Regex {
    Regex::new(&format!(
        r"(?im)^[ \t]*(?:{label})\b[^:=\r\n]*[:=][ \t]*([^\r\n]*?)[ \t]*$"
    ))
    .unwrap()
}

static TEMPERATURE: Lazy<Regex> =
    Lazy::new(|| label_pattern(r"(?:module\s+|operating\s+)?temp(?:erature|rature|reature|erture)?"));

static VOLTAGE: Lazy<Regex> =
    Lazy::new(|| label_pattern(r"(?:supply\s+)?(?:vol(?:tage|atge|tgae)|vcc)"));

static BIAS: Lazy<Regex> = Lazy::new(|| label_pattern(r"(?:tx\s+)?bias(?:\s+current)?"));

static TX_POWER: Lazy<Regex> = Lazy::new(|| {
    label_pattern(r"(?:tx|transmit(?:ted)?|output)\s*(?:optical\s+)?pow(?:er|re)")
});

static RX_POWER: Lazy<Regex> = Lazy::new(|| {
    label_pattern(r"(?:rx|receive[d]?|input)\s*(?:optical\s+)?pow(?:er|re)")
});

static LINK: Lazy<Regex> = Lazy::new(|| {
    label_pattern(r"(?:link|port|oper(?:ation(?:al)?)?)\s*[-_ ]?(?:state|status)")
});

static PROTECTION: Lazy<Regex> = Lazy::new(|| {
    label_pattern(r"prot(?:ection|ecion|etion|ction)?\s*[-_ ]?t(?:ype|pye|yep|ye)")
});

/// Parse `show onu N optical-transceiver-diagnosis` output.
///
/// Returns `None` if none of the readings are present.
pub fn parse_optical(output: &str) -> Option<OpticalDiagnostics> {
    let temperature = labeled(&TEMPERATURE, output);
    let voltage = labeled(&VOLTAGE, output);
    let bias_current = labeled(&BIAS, output);
    let tx_power = labeled(&TX_POWER, output);
    let rx_power = labeled(&RX_POWER, output);

    if [&temperature, &voltage, &bias_current, &tx_power, &rx_power]
        .iter()
        .all(|value| value.is_none())
    {
        return None;
    }

    Some(OpticalDiagnostics {
        temperature: or_not_available(temperature),
        voltage: or_not_available(voltage),
        bias_current: or_not_available(bias_current),
        tx_power: or_not_available(tx_power),
        rx_power: or_not_available(rx_power),
    })
}

/// Parse `show onu N port-state` output.
///
/// Returns `None` if no link state line is present.
pub fn parse_link_state(output: &str) -> Option<LinkState> {
    let state = labeled(&LINK, output)?;
    let token = state.split_whitespace().next().unwrap_or_default();

    Some(LinkState {
        status: LinkStatus::from_token(token),
        protection_type: or_not_available(labeled(&PROTECTION, output)),
    })
}
