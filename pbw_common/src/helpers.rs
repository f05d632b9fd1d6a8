use std::borrow::Cow;

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Percent-encodes a value the same way a browser's `encodeURIComponent` would for the characters the gateway
/// cares about. Unreserved characters (`A-Z a-z 0-9 - _ . ~`) pass through untouched.
pub fn percent_encode(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}
