//! Prompt fingerprinting so deployments can tell which instruction text is live.

use std::fmt::Write;

use sha2::{Digest, Sha256};

/// Length of the abbreviated fingerprint used in log lines.
const SHORT_LEN: usize = 12;

/// Compute a stable SHA-256 fingerprint (lowercase hex) for a prompt string.
pub fn hash_prompt(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut hex, byte| {
        let _ = write!(hex, "{:02x}", byte);
        hex
    })
}

/// Abbreviated fingerprint for log lines.
pub fn short_hash(prompt: &str) -> String {
    hash_prompt(prompt).chars().take(SHORT_LEN).collect()
}
