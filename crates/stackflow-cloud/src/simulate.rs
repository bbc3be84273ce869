//! Helpers for providers that fabricate outputs locally

use crate::provider::ProvisionRequest;

const MAX_HEX_LEN: usize = 16;

/// Lowercase hex prefix of the BLAKE3 digest of `seed`, at most 16 characters
pub fn stable_hex(seed: &str, len: usize) -> String {
    let hex = blake3::hash(seed.as_bytes()).to_hex();
    hex[..len.min(MAX_HEX_LEN)].to_string()
}

/// The explicit physical name in input `key`, or `<logical>-<suffix>`
pub fn physical_name(request: &ProvisionRequest, key: &str) -> String {
    match request.get_str(key) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!(
            "{}-{}",
            request.name(),
            stable_hex(&request.urn.to_string(), 7)
        ),
    }
}
