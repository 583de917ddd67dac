//! Parsing and formatting of raw EVM values (quantities, addresses, calldata).

use ethereum_types::{Address, U256};
use std::str::FromStr;

/// Wei per ether
const WEI_PER_ETHER: u64 = 1_000_000_000_000_000_000;

/// Parse a quantity from a `0x` hex string or a decimal string
///
/// An empty `0x` is zero, as some nodes emit it for zero value.
pub fn parse_quantity(value: &str) -> Result<U256, String> {
    let value = value.trim();
    if let Some(hex_str) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        if hex_str.is_empty() {
            return Ok(U256::zero());
        }
        U256::from_str_radix(hex_str, 16).map_err(|e| format!("invalid hex quantity: {:?}", e))
    } else {
        U256::from_dec_str(value).map_err(|e| format!("invalid decimal quantity: {:?}", e))
    }
}

/// Parse a 20-byte address, with or without `0x` prefix
pub fn parse_address(value: &str) -> Result<Address, String> {
    let hex_str = value.strip_prefix("0x").unwrap_or(value);
    if hex_str.len() != 40 {
        return Err(format!("expected 40 hex characters, found {}", hex_str.len()));
    }
    Address::from_str(hex_str).map_err(|e| e.to_string())
}

/// First four bytes of calldata as `0x` + 8 hex digits
///
/// Defined only when `input` carries at least a full selector.
pub fn function_selector(input: &str) -> Option<String> {
    if !input.starts_with("0x") {
        return None;
    }
    let selector = input.get(..10)?;
    selector[2..]
        .chars()
        .all(|c| c.is_ascii_hexdigit())
        .then(|| selector.to_lowercase())
}

/// Full lowercase address with `0x` prefix
pub fn format_address(address: &Address) -> String {
    format!("0x{:x}", address)
}

/// Abbreviated address for diagram labels, e.g. `0x1234..abcd`
pub fn short_address(address: &Address) -> String {
    let full = format!("{:x}", address);
    format!("0x{}..{}", &full[..4], &full[full.len() - 4..])
}

/// Format a wei amount as ether with trailing zeros trimmed
pub fn format_ether(wei: &U256) -> String {
    let unit = U256::from(WEI_PER_ETHER);
    let whole = *wei / unit;
    let fraction = *wei % unit;

    if fraction.is_zero() {
        return format!("{} ETH", whole);
    }

    let fraction = format!("{:0>18}", fraction.to_string());
    format!("{}.{} ETH", whole, fraction.trim_end_matches('0'))
}
