//! # Field-Element Byte Conversion
//!
//! The proving toolchain emits field elements as decimal strings; the
//! compact wire format carries them as fixed-width 32-byte big-endian
//! values. This module is the one conversion path both the proof backends
//! and the encoder use, so the two layers cannot disagree on widths.

use num_bigint::BigUint;
use thiserror::Error;

/// Width of one encoded field element.
pub const FIELD_ELEMENT_LEN: usize = 32;

/// A value that cannot be encoded as a 32-byte field element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldParseError {
    /// The string is not a decimal or `0x`-prefixed hex integer.
    #[error("not a field element: {0:?}")]
    NotNumeric(String),
    /// The value does not fit in 32 bytes.
    #[error("field element overflows 32 bytes: {0}")]
    Overflow(String),
}

/// Parse a decimal (or `0x`-prefixed hex) field element into its 32-byte
/// big-endian representation.
pub fn field_element_bytes(value: &str) -> Result<[u8; FIELD_ELEMENT_LEN], FieldParseError> {
    let trimmed = value.trim();
    let digits = match trimmed.strip_prefix("0x") {
        Some(hex) if !hex.is_empty() => BigUint::parse_bytes(hex.as_bytes(), 16),
        Some(_) => None,
        None if !trimmed.is_empty() => BigUint::parse_bytes(trimmed.as_bytes(), 10),
        None => None,
    };
    let parsed = digits.ok_or_else(|| FieldParseError::NotNumeric(value.to_string()))?;

    let raw = parsed.to_bytes_be();
    if raw.len() > FIELD_ELEMENT_LEN {
        return Err(FieldParseError::Overflow(value.to_string()));
    }

    let mut out = [0u8; FIELD_ELEMENT_LEN];
    out[FIELD_ELEMENT_LEN - raw.len()..].copy_from_slice(&raw);
    Ok(out)
}
