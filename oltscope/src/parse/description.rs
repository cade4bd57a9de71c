use once_cell::sync::Lazy;
use regex::Regex;

use super::labeled;

static DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*(?:onu\s+\S+\s+)?desc(?:ription)?\s*[:=][ \t]*([^\r\n]*?)[ \t]*$")
        .unwrap()
});

/// Extract the description label from `show onu N description` output.
///
/// Returns `None` when no description line is present or it is empty.
pub fn parse_description(output: &str) -> Option<String> {
    labeled(&DESCRIPTION, output)
}
