//! Delimited-string codecs shared across the study model
//!
//! Several fields keep the legacy wire encodings of the original system
//! (`key=value;` metadata maps, comma-separated subgroup sizes,
//! space/comma-delimited user lists). Other components parse these strings,
//! so the formats must stay byte-compatible. Decoding is tolerant: malformed
//! tokens default to zero or are skipped, never fatal.

use std::collections::{BTreeMap, BTreeSet};

/// Parse the leading run of ASCII digits of `s`, returning 0 when there is
/// none or the value does not fit an `i32`.
pub fn parse_leading_int(s: &str) -> i32 {
    let digits: String = s
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

/// Parse an integer token, defaulting to 0 for malformed input.
pub fn parse_int_or_zero(s: &str) -> i32 {
    s.trim().parse().unwrap_or(0)
}

/// Parse an optional float token; empty or malformed input decodes to `None`.
pub fn parse_f64_opt(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse().ok()
}

/// Decode a comma-separated list of integers ("5,5,3"); malformed tokens
/// decode to 0, an empty string to an empty list.
pub fn decode_int_csv(s: &str) -> Vec<i32> {
    let s = s.trim();
    if s.is_empty() {
        return Vec::new();
    }
    s.split(',').map(parse_int_or_zero).collect()
}

/// Encode an integer list into the comma-separated wire form.
pub fn encode_int_csv(values: &[i32]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode a `key=value;key=value` metadata map. Entries without a '=' are
/// kept with an empty value so no user data silently disappears.
pub fn decode_metadata(s: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for entry in s.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        match entry.split_once('=') {
            Some((key, value)) => map.insert(key.trim().to_string(), value.to_string()),
            None => map.insert(entry.to_string(), String::new()),
        };
    }
    map
}

/// Encode a metadata map into the `key=value;` wire form.
pub fn encode_metadata(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(";")
}

/// Decode a space/comma-delimited user list into a sorted set.
pub fn decode_user_list(s: &str) -> BTreeSet<String> {
    s.split([' ', ',', '\t'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Encode a user set into the space-delimited wire form.
pub fn encode_user_list(users: &BTreeSet<String>) -> String {
    users.iter().cloned().collect::<Vec<_>>().join(" ")
}
