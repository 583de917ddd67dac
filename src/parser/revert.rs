//! Revert reason decoding from failed-call return data.
//!
//! Solidity encodes `require(cond, "reason")` failures as a call to
//! `Error(string)`: the selector, an offset word, a length word, then the
//! UTF-8 bytes padded to a 32-byte boundary. Compiler panics use
//! `Panic(uint256)` with a single code word.

use crate::utils::error::DecodeError;
use ethereum_types::U256;

/// Selector for `Error(string)`, first 4 bytes of keccak256("Error(string)")
pub const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Selector for `Panic(uint256)`, first 4 bytes of keccak256("Panic(uint256)")
pub const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

const WORD: usize = 32;
const SELECTOR_LEN: usize = 4;

/// Decode a revert reason from `0x`-prefixed return data
///
/// # Errors
/// Any `DecodeError` means "reason unavailable"; none of them should abort
/// diagram generation.
pub fn decode_revert_reason(output: &str) -> Result<String, DecodeError> {
    let hex_str = output.strip_prefix("0x").unwrap_or(output);
    let data = hex::decode(hex_str)?;

    if data.len() < SELECTOR_LEN {
        return Err(DecodeError::TooShort(data.len()));
    }

    let (selector, payload) = data.split_at(SELECTOR_LEN);
    if selector == ERROR_SELECTOR {
        decode_error_string(payload, data.len())
    } else if selector == PANIC_SELECTOR {
        decode_panic_code(payload, data.len())
    } else {
        Err(DecodeError::UnknownSelector(hex::encode(selector)))
    }
}

/// Encode `reason` in the standard `Error(string)` layout
pub fn encode_revert_reason(reason: &str) -> String {
    let bytes = reason.as_bytes();
    let padded_len = bytes.len().div_ceil(WORD) * WORD;

    let mut data = Vec::with_capacity(SELECTOR_LEN + 2 * WORD + padded_len);
    data.extend_from_slice(&ERROR_SELECTOR);
    data.extend_from_slice(&word(U256::from(WORD)));
    data.extend_from_slice(&word(U256::from(bytes.len())));
    data.extend_from_slice(bytes);
    data.resize(SELECTOR_LEN + 2 * WORD + padded_len, 0);

    format!("0x{}", hex::encode(data))
}

fn word(value: U256) -> [u8; WORD] {
    let mut out = [0u8; WORD];
    value.to_big_endian(&mut out);
    out
}

/// Length word sits right after the offset word; the string follows it
fn decode_error_string(payload: &[u8], total_len: usize) -> Result<String, DecodeError> {
    if payload.len() < 2 * WORD {
        return Err(DecodeError::TooShort(total_len));
    }

    let declared = U256::from_big_endian(&payload[WORD..2 * WORD]);
    let available = payload.len() - 2 * WORD;
    if declared > U256::from(available) {
        return Err(DecodeError::LengthOutOfBounds {
            declared: declared.to_string(),
            available,
        });
    }

    let start = 2 * WORD;
    let reason = std::str::from_utf8(&payload[start..start + declared.as_usize()])?;
    Ok(reason.to_string())
}

fn decode_panic_code(payload: &[u8], total_len: usize) -> Result<String, DecodeError> {
    if payload.len() < WORD {
        return Err(DecodeError::TooShort(total_len));
    }

    let code = U256::from_big_endian(&payload[..WORD]);
    if code > U256::from(u8::MAX) {
        return Ok(format!("Panic(0x{:x}): unknown panic code", code));
    }

    let code = code.low_u64();
    let description = match code {
        0x00 => "generic compiler panic",
        0x01 => "assertion failure",
        0x11 => "arithmetic overflow",
        0x12 => "division by zero",
        0x21 => "enum conversion overflow",
        0x22 => "storage encoding error",
        0x31 => "pop on empty array",
        0x32 => "array index out of bounds",
        0x41 => "excessive memory allocation",
        0x51 => "uninitialized function pointer",
        _ => "unknown panic code",
    };

    Ok(format!("Panic(0x{:02x}): {}", code, description))
}
