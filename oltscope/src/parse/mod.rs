//! Parsers for the free-text tables the OLT prints.
//!
//! Parsers never fail: rows they cannot read are skipped and fields they
//! cannot find are reported as [`NOT_AVAILABLE`](crate::model::NOT_AVAILABLE).

mod description;
mod detail;
mod status;

pub use description::parse_description;
pub use detail::{parse_link_state, parse_optical};
pub use status::{normalize_mac, parse_status_line, parse_status_table};

use regex::Regex;

use crate::model::NOT_AVAILABLE;

/// First capture of `pattern` in `text`, trimmed, if non-empty.
fn labeled(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn or_not_available(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
