//! Prompt pattern helpers.

use regex::bytes::Regex;

/// Compile a prompt pattern string into a regex.
///
/// Anchors to the very end of the buffer (allowing trailing whitespace)
/// unless the pattern already ends with an anchor. `\z` is used rather than
/// `$` so that multi-line patterns still require the prompt to be the last
/// thing the device printed.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = if pattern.ends_with('$') || pattern.ends_with("\\z") {
        pattern.to_string()
    } else {
        format!("{}\\s*\\z", pattern)
    };

    Regex::new(&pattern)
}

/// Check that `prompt` names `port` as a whole token.
///
/// `0/1` is found in `OLT(config-pon-0/1)#` but not in `OLT(config-pon-0/10)#`.
pub fn contains_port_token(prompt: &str, port: &str) -> bool {
    if port.is_empty() {
        return false;
    }
    let bytes = prompt.as_bytes();
    prompt.match_indices(port).any(|(start, _)| {
        let end = start + port.len();
        let digit_before = start > 0 && bytes[start - 1].is_ascii_digit();
        let digit_after = end < bytes.len() && bytes[end].is_ascii_digit();
        !digit_before && !digit_after
    })
}
