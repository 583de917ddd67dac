//! Input validation shared by every entry point.

use super::error::TraceError;

/// Check that `tx_hash` is `0x` followed by exactly 64 hex characters
pub fn validate_tx_hash(tx_hash: &str) -> Result<(), TraceError> {
    let valid = tx_hash
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()));

    if valid {
        Ok(())
    } else {
        Err(TraceError::InvalidTxHash(tx_hash.to_string()))
    }
}
