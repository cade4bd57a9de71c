//! ONU status listing (`show onu info`).
//!
//! ```text
//! OnuId       Status   MacAddress          Distance(m)  RTT(TQ)  LastRegTime          LastDeregTime        LastDeregReason  AliveTime
//! ----------- -------- ------------------- ------------ -------- -------------------- -------------------- ---------------- ----------
//! EPON0/1:1   online   74:a0:63:7e:d6:a8   1436         972      2024/05/01 08:12:33  2024/04/30 22:01:10  power off        3 09:41:02
//! EPON0/1:2   offline  74:a0:63:11:22:33   0            0        N/A                  2024/05/02 10:00:00  wire down        N/A
//! ```
//!
//! Columns are whitespace separated but the reason column contains spaces
//! and trailing columns may be missing, so the tail of each row is walked
//! left to right instead of split.

use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

use super::or_not_available;
use crate::model::{NOT_AVAILABLE, OnuId, OnuState, OnuStatus};

static ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*EPON\s*(\d+/\d+):(\d+)\s+([a-z][\w\-]*)\s+((?:[0-9a-f]{2}[:\-]){5}[0-9a-f]{2}|(?:[0-9a-f]{4}\.){2}[0-9a-f]{4})\s+(\d+)\s+(\d+)",
    )
    .unwrap()
});

static TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d{4}[/\-.]\d{1,2}[/\-.]\d{1,2}[ T]\d{1,2}:\d{2}:\d{2}|N/A|--?)(?:\s|$)")
        .unwrap()
});

static REASON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*([^\d\s][^\d]*?)\s*(?:\s\d|\sN/A\s*$|\s--?\s*$|$)").unwrap()
});

static ALIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|\s)((?:\d+\s*(?:days?|d)?[\s,]+)?\d{1,3}:\d{2}:\d{2})\s*$").unwrap()
});

/// Parse every ONU row of a status listing. Headers and noise are skipped.
pub fn parse_status_table(output: &str) -> Vec<OnuStatus> {
    output.lines().filter_map(parse_status_line).collect()
}

/// Parse one row of the status listing.
pub fn parse_status_line(line: &str) -> Option<OnuStatus> {
    let caps = ROW.captures(line)?;
    let row_end = caps.get(0)?.end();

    let index = caps[2].parse().ok()?;
    let distance_meters = caps[5].parse().ok()?;
    let rtt = caps[6].parse().ok()?;

    let mut rest = &line[row_end..];
    let last_register_time = take_timestamp(&mut rest);
    let last_deregister_time = take_timestamp(&mut rest);
    let last_deregister_reason = take_reason(&mut rest);
    let alive_time = ALIVE
        .captures(rest)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());

    let status = OnuStatus {
        onu_id: OnuId::new(&caps[1], index),
        state: OnuState::from_token(&caps[3]),
        mac_address: normalize_mac(&caps[4]),
        distance_meters,
        rtt,
        last_register_time: or_not_available(last_register_time),
        last_deregister_time: or_not_available(last_deregister_time),
        last_deregister_reason: or_not_available(last_deregister_reason),
        alive_time: or_not_available(alive_time),
    };
    trace!("parsed {} ({})", status.onu_id, status.state);
    Some(status)
}

fn take_timestamp(rest: &mut &str) -> Option<String> {
    let caps = TIMESTAMP.captures(rest)?;
    let value = caps.get(1)?;
    *rest = &rest[value.end()..];
    placeholder_to_none(value.as_str())
}

fn take_reason(rest: &mut &str) -> Option<String> {
    let caps = REASON.captures(rest)?;
    let value = caps.get(1)?;
    *rest = &rest[value.end()..];
    placeholder_to_none(value.as_str().trim())
}

fn placeholder_to_none(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.starts_with('-') || value.eq_ignore_ascii_case(NOT_AVAILABLE) {
        None
    } else {
        Some(value.to_string())
    }
}

/// Lowercase colon-separated form of a MAC address.
///
/// Input that is not 12 hex digits is returned lowercased as-is.
pub fn normalize_mac(mac: &str) -> String {
    let digits: Vec<char> = mac.chars().filter(char::is_ascii_hexdigit).collect();
    if digits.len() != 12 {
        return mac.to_ascii_lowercase();
    }
    digits
        .chunks(2)
        .map(|pair| pair.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(":")
        .to_ascii_lowercase()
}
